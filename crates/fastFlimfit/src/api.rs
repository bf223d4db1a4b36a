//! High-level API for parallel batch decay fitting.
//!
//! ## Purpose
//!
//! This module wraps the core `flimfit` builder with parallel execution
//! support and an `ndarray` input surface. Configuration is delegated to the
//! base builder; only the execution mode is decided here.
//!
//! ## Design notes
//!
//! * **Parallel by default**: A `fastFlimfit` fitter runs the batch on a
//!   `rayon` pool unless `.parallel(false)` asks for the sequential core
//!   loop.
//! * **Delegation**: Every fit-configuration setter forwards to the base
//!   `flimfit` builder, so defaults and validation stay in one place.

// External dependencies
use ndarray::Array2;
use num_traits::Float;

// Export dependencies from flimfit crate
use flimfit::internals::engine::executor::FitExecutor;
use flimfit::prelude::{
    BatchFitOutput, CurveMatrix, DecayModel, FlimError, FlimFit as BaseBuilder, FlimFitter,
    NoiseModel,
};

// Internal dependencies
use crate::engine::executor::fit_batch_parallel;
use crate::input::to_column_major;

// ============================================================================
// Parallel Builder
// ============================================================================

/// Fluent builder for a parallel batch fitter.
#[derive(Debug, Clone)]
pub struct FastFlimFitBuilder<T> {
    /// Base builder from the flimfit crate.
    pub base: BaseBuilder<T>,

    /// Whether to run batches on the rayon pool (default: true).
    pub parallel: bool,
}

impl<T: Float> Default for FastFlimFitBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> FastFlimFitBuilder<T> {
    /// Create a new builder with default parameters and parallel execution.
    pub fn new() -> Self {
        Self {
            base: BaseBuilder::new(),
            parallel: true,
        }
    }

    /// Set parallel execution mode.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    // ========================================================================
    // Delegated Setters
    // ========================================================================

    /// Set the decay model fitted to every transient in a batch.
    pub fn model(mut self, model: DecayModel) -> Self {
        self.base = self.base.model(model);
        self
    }

    /// Set the noise model used by both fit engines.
    pub fn noise_model(mut self, noise: NoiseModel) -> Self {
        self.base = self.base.noise_model(noise);
        self
    }

    /// Set the reduced chi-square stopping ratio.
    pub fn chi_sq_target(mut self, target: T) -> Self {
        self.base = self.base.chi_sq_target(target);
        self
    }

    /// Set the minimum relative chi-square improvement per refinement step.
    pub fn chi_sq_delta(mut self, delta: T) -> Self {
        self.base = self.base.chi_sq_delta(delta);
        self
    }

    /// Set the first bin of the fit window.
    pub fn fit_start(mut self, fit_start: usize) -> Self {
        self.base = self.base.fit_start(fit_start);
        self
    }

    /// Set the last bin of the fit window (exclusive).
    pub fn fit_end(mut self, fit_end: usize) -> Self {
        self.base = self.base.fit_end(fit_end);
        self
    }

    /// Request the rapid-estimate parameter table in the output.
    pub fn return_rapid_params(mut self) -> Self {
        self.base = self.base.return_rapid_params();
        self
    }

    /// Request the refined fitted-curve table in the output.
    pub fn return_fitted(mut self) -> Self {
        self.base = self.base.return_fitted();
        self
    }

    /// Request the rapid-estimate fitted-curve table in the output.
    pub fn return_rapid_fitted(mut self) -> Self {
        self.base = self.base.return_rapid_fitted();
        self
    }

    // ========================================================================
    // Build Method
    // ========================================================================

    /// Validate the configuration and build the parallel fitter.
    pub fn build(self) -> Result<FastFlimFitter<T>, FlimError> {
        Ok(FastFlimFitter {
            base: self.base.build()?,
            parallel: self.parallel,
        })
    }
}

// ============================================================================
// Parallel Fitter
// ============================================================================

/// A configured batch fitter with parallel execution.
#[derive(Debug, Clone)]
pub struct FastFlimFitter<T> {
    /// The validated core fitter.
    pub base: FlimFitter<T>,

    /// Whether batches run on the rayon pool.
    pub parallel: bool,
}

impl<T: Float + Send + Sync> FastFlimFitter<T> {
    /// Fit every transient of an `ndarray`-shaped batch.
    ///
    /// `transients` is `n x N` (rows = time bins, columns = transients);
    /// `prompts` carries 1 or `N` reference curves; `time_steps` 1 or `N`
    /// increments; `sigma` optionally 1 or `N` standard-deviation curves.
    pub fn fit(
        &self,
        transients: &Array2<T>,
        prompts: &Array2<T>,
        time_steps: &[T],
        sigma: Option<&Array2<T>>,
    ) -> Result<BatchFitOutput<T>, FlimError> {
        let transient_flat = to_column_major(transients);
        let prompt_flat = to_column_major(prompts);
        let sigma_flat = sigma.map(|s| (to_column_major(s), s.nrows()));

        let transient_matrix = CurveMatrix::from_flat(&transient_flat, transients.nrows())?;
        let prompt_matrix = CurveMatrix::from_flat(&prompt_flat, prompts.nrows())?;
        let sigma_matrix = match sigma_flat.as_ref() {
            Some((flat, rows)) => Some(CurveMatrix::from_flat(flat, *rows)?),
            None => None,
        };

        let descriptor =
            self.base
                .descriptor(transient_matrix, prompt_matrix, time_steps, sigma_matrix)?;
        if self.parallel {
            Ok(fit_batch_parallel(&descriptor, self.base.requests))
        } else {
            Ok(FitExecutor::run(&descriptor, self.base.requests))
        }
    }
}
