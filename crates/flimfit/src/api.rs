//! High-level API for batch decay fitting.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point: a fluent
//! builder for configuring a batch fit and the fitter it produces.
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builder with sensible defaults for every
//!   parameter (single-exponential model, Gaussian-on-fit noise,
//!   `chi_sq_target` 1.1, `chi_sq_delta` 0.001).
//! * **Validated**: Convergence settings are validated at `build()`;
//!   data-shape constraints are validated at `fit()`, when the batch is
//!   known. Nothing panics on malformed input.
//! * **Type-Safe**: Generic over `Float` types; `f32` matches the reference
//!   engines' working precision, `f64` is available when the caller prefers
//!   it.
//!
//! ### Configuration Flow
//!
//! 1. Create a [`FlimFitBuilder`] via `FlimFit::new()`.
//! 2. Chain configuration methods (`.model()`, `.fit_start()`, ...).
//! 3. Call `.build()` to obtain a [`FlimFitter`], then `.fit(...)` per
//!    batch.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::engine::executor::FitExecutor;
use crate::engine::validator::{BatchDescriptor, Validator};

// Publicly re-exported types
pub use crate::algorithms::rapid::RapidEstimate;
pub use crate::algorithms::{EngineFailure, EngineOutcome};
pub use crate::engine::output::{BatchFitOutput, OutputRequests, TransientStatus};
pub use crate::math::decay::DecayModel;
pub use crate::math::noise::NoiseModel;
pub use crate::primitives::errors::FlimError;
pub use crate::primitives::matrix::{CurveMatrix, CurveTable};

// ============================================================================
// Defaults
// ============================================================================

/// Default reduced chi-square stopping ratio.
const DEFAULT_CHI_SQ_TARGET: f64 = 1.1;

/// Default per-iteration relative chi-square improvement threshold.
///
/// 0.001 is strict; 0.01 is a common looser choice when fit speed matters
/// more than the last digit of optimization.
const DEFAULT_CHI_SQ_DELTA: f64 = 0.001;

// ============================================================================
// Builder
// ============================================================================

/// Fluent builder for configuring a batch decay fit.
#[derive(Debug, Clone)]
pub struct FlimFitBuilder<T> {
    /// Decay model (default: single exponential).
    pub model: Option<DecayModel>,

    /// Noise model (default: Gaussian-on-fit).
    pub noise_model: Option<NoiseModel>,

    /// Reduced chi-square stopping ratio (default: 1.1).
    pub chi_sq_target: Option<T>,

    /// Relative chi-square improvement threshold (default: 0.001).
    pub chi_sq_delta: Option<T>,

    /// First bin of the fit window (default: 0).
    pub fit_start: Option<usize>,

    /// Last bin of the fit window, exclusive (default: n - 1).
    pub fit_end: Option<usize>,

    /// Request the rapid-estimate parameter table.
    pub return_rapid_params: bool,

    /// Request the refined fitted-curve table.
    pub return_fitted: bool,

    /// Request the rapid-estimate fitted-curve table.
    pub return_rapid_fitted: bool,

    /// Tracks if any parameter was set multiple times (for validation).
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

impl<T: Float> Default for FlimFitBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> FlimFitBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            model: None,
            noise_model: None,
            chi_sq_target: None,
            chi_sq_delta: None,
            fit_start: None,
            fit_end: None,
            return_rapid_params: false,
            return_fitted: false,
            return_rapid_fitted: false,
            duplicate_param: None,
        }
    }

    /// Set the decay model fitted to every transient in a batch.
    pub fn model(mut self, model: DecayModel) -> Self {
        if self.model.is_some() {
            self.duplicate_param = Some("model");
        }
        self.model = Some(model);
        self
    }

    /// Set the noise model used by both fit engines.
    pub fn noise_model(mut self, noise: NoiseModel) -> Self {
        if self.noise_model.is_some() {
            self.duplicate_param = Some("noise_model");
        }
        self.noise_model = Some(noise);
        self
    }

    /// Set the reduced chi-square stopping ratio (>= 1; larger is faster
    /// but less optimized).
    pub fn chi_sq_target(mut self, target: T) -> Self {
        if self.chi_sq_target.is_some() {
            self.duplicate_param = Some("chi_sq_target");
        }
        self.chi_sq_target = Some(target);
        self
    }

    /// Set the minimum relative chi-square improvement per refinement step
    /// (in `[0, 0.5)`; refinement stops below it).
    pub fn chi_sq_delta(mut self, delta: T) -> Self {
        if self.chi_sq_delta.is_some() {
            self.duplicate_param = Some("chi_sq_delta");
        }
        self.chi_sq_delta = Some(delta);
        self
    }

    /// Set the first bin of the fit window.
    pub fn fit_start(mut self, fit_start: usize) -> Self {
        if self.fit_start.is_some() {
            self.duplicate_param = Some("fit_start");
        }
        self.fit_start = Some(fit_start);
        self
    }

    /// Set the last bin of the fit window (exclusive).
    pub fn fit_end(mut self, fit_end: usize) -> Self {
        if self.fit_end.is_some() {
            self.duplicate_param = Some("fit_end");
        }
        self.fit_end = Some(fit_end);
        self
    }

    /// Request the rapid-estimate parameter table in the output.
    pub fn return_rapid_params(mut self) -> Self {
        self.return_rapid_params = true;
        self
    }

    /// Request the refined fitted-curve table in the output.
    pub fn return_fitted(mut self) -> Self {
        self.return_fitted = true;
        self
    }

    /// Request the rapid-estimate fitted-curve table in the output.
    pub fn return_rapid_fitted(mut self) -> Self {
        self.return_rapid_fitted = true;
        self
    }

    // ========================================================================
    // Build Method
    // ========================================================================

    /// Validate the configuration and build the fitter.
    pub fn build(self) -> Result<FlimFitter<T>, FlimError> {
        if let Some(parameter) = self.duplicate_param {
            return Err(FlimError::DuplicateParameter { parameter });
        }

        let chi_sq_target = self
            .chi_sq_target
            .unwrap_or_else(|| T::from(DEFAULT_CHI_SQ_TARGET).unwrap());
        Validator::validate_chi_sq_target(chi_sq_target)?;

        let chi_sq_delta = self
            .chi_sq_delta
            .unwrap_or_else(|| T::from(DEFAULT_CHI_SQ_DELTA).unwrap());
        Validator::validate_chi_sq_delta(chi_sq_delta)?;

        Ok(FlimFitter {
            model: self.model.unwrap_or_default(),
            noise_model: self.noise_model.unwrap_or_default(),
            chi_sq_target,
            chi_sq_delta,
            fit_start: self.fit_start.unwrap_or(0),
            fit_end: self.fit_end,
            requests: OutputRequests {
                rapid_params: self.return_rapid_params,
                fitted: self.return_fitted,
                rapid_fitted: self.return_rapid_fitted,
            },
        })
    }
}

// ============================================================================
// Fitter
// ============================================================================

/// A configured batch fitter.
#[derive(Debug, Clone)]
pub struct FlimFitter<T> {
    /// Decay model applied to every transient.
    pub model: DecayModel,

    /// Noise model applied by both engines.
    pub noise_model: NoiseModel,

    /// Reduced chi-square stopping ratio.
    pub chi_sq_target: T,

    /// Relative chi-square improvement threshold.
    pub chi_sq_delta: T,

    /// First bin of the fit window.
    pub fit_start: usize,

    /// Last bin of the fit window; `None` defaults to `n - 1` per batch.
    pub fit_end: Option<usize>,

    /// Requested optional outputs.
    pub requests: OutputRequests,
}

impl<T: Float> FlimFitter<T> {
    /// Validate a batch against this configuration and resolve its
    /// broadcast inputs.
    pub fn descriptor<'a>(
        &self,
        transients: CurveMatrix<'a, T>,
        prompts: CurveMatrix<'a, T>,
        time_steps: &'a [T],
        sigma: Option<CurveMatrix<'a, T>>,
    ) -> Result<BatchDescriptor<'a, T>, FlimError> {
        Validator::validate_batch(
            transients,
            prompts,
            time_steps,
            sigma,
            self.model,
            self.noise_model,
            self.chi_sq_target,
            self.chi_sq_delta,
            self.fit_start,
            self.fit_end,
        )
    }

    /// Fit every transient of a batch.
    ///
    /// `transients` is `n x N` (columns are transients); `prompts` carries
    /// 1 or `N` reference curves; `time_steps` 1 or `N` increments; `sigma`
    /// optionally 1 or `N` standard-deviation curves. Malformed batches fail
    /// before any fit work is done.
    pub fn fit(
        &self,
        transients: &CurveMatrix<'_, T>,
        prompts: &CurveMatrix<'_, T>,
        time_steps: &[T],
        sigma: Option<&CurveMatrix<'_, T>>,
    ) -> Result<BatchFitOutput<T>, FlimError> {
        let descriptor = self.descriptor(*transients, *prompts, time_steps, sigma.copied())?;
        Ok(FitExecutor::run(&descriptor, self.requests))
    }
}
