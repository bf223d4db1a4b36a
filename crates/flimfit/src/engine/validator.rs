//! Input validation for batch decay fitting.
//!
//! ## Purpose
//!
//! This module validates a raw batch of transients and its associated
//! inputs, and assembles a shape-consistent [`BatchDescriptor`] with the
//! broadcast inputs resolved into per-transient accessors.
//!
//! ## Design notes
//!
//! * **Fail-Fast**: Validation stops at the first error encountered.
//! * **Efficiency**: Checks are ordered from cheap (shape and range) to
//!   expensive (element finiteness scans).
//! * **Resolve once**: Broadcast choices (shared vs. per-transient prompt,
//!   sigma, and time increment) are resolved into accessor views here, so
//!   the fit loop never branches on batch shape.
//! * **Generics**: Validation is generic over `Float` types.
//!
//! ## Key concepts
//!
//! * **Batch shape**: 2-2048 time bins, at least one transient; every
//!   broadcast input independently singleton or batch-width.
//! * **Fit window**: `0 <= fit_start <= n-2`, `fit_start < fit_end <= n-1`,
//!   and wide enough to leave positive degrees of freedom for the model.
//!
//! ## Invariants
//!
//! * A returned descriptor satisfies every constraint; the executor performs
//!   no further shape checking.
//! * Validation allocates no fit buffers and has no side effects.
//!
//! ## Non-goals
//!
//! * This module does not run fits or compute statistics.
//! * This module does not provide automatic correction of invalid inputs.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::format;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::math::decay::DecayModel;
use crate::math::noise::NoiseModel;
use crate::primitives::broadcast::{BroadcastCurves, BroadcastSteps};
use crate::primitives::errors::FlimError;
use crate::primitives::matrix::CurveMatrix;

// ============================================================================
// Shape Constants
// ============================================================================

/// Smallest admissible transient length, in time bins.
const MIN_TRANSIENT_LEN: usize = 2;

/// Largest admissible transient length, in time bins.
const MAX_TRANSIENT_LEN: usize = 2048;

/// Smallest admissible prompt length, in points.
const MIN_PROMPT_LEN: usize = 2;

// ============================================================================
// Batch Descriptor
// ============================================================================

/// A validated, shape-consistent batch ready for the fit executor.
#[derive(Debug, Clone, Copy)]
pub struct BatchDescriptor<'a, T> {
    /// Transient batch, `n` rows by `N` columns.
    pub transients: CurveMatrix<'a, T>,

    /// Reference curves, shared or per-transient.
    pub prompts: BroadcastCurves<'a, T>,

    /// Time increments, shared or per-transient.
    pub time_steps: BroadcastSteps<'a, T>,

    /// Optional sigma curves, shared or per-transient.
    pub sigma: Option<BroadcastCurves<'a, T>>,

    /// First bin of the fit window (inclusive).
    pub fit_start: usize,

    /// Last bin of the fit window (exclusive).
    pub fit_end: usize,

    /// Decay model applied to every transient in the batch.
    pub model: DecayModel,

    /// Noise model applied by both engines.
    pub noise: NoiseModel,

    /// Reduced chi-square stopping ratio.
    pub chi_sq_target: T,

    /// Minimum relative chi-square improvement per refinement step.
    pub chi_sq_delta: T,
}

impl<T> BatchDescriptor<'_, T> {
    /// Number of time bins per transient.
    #[inline]
    pub fn transient_len(&self) -> usize {
        self.transients.rows()
    }

    /// Number of transients in the batch.
    #[inline]
    pub fn transient_count(&self) -> usize {
        self.transients.cols()
    }

    /// Width of the fit window in bins.
    #[inline]
    pub fn window(&self) -> usize {
        self.fit_end - self.fit_start
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for batch inputs.
///
/// Provides static methods for each constraint; `validate_batch` composes
/// them in cheap-to-expensive order and assembles the descriptor. All
/// methods return `Result<(), FlimError>` and fail fast on the first
/// violation.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Shape Validation
    // ========================================================================

    /// Validate the transient batch shape.
    pub fn validate_transients<T>(transients: &CurveMatrix<'_, T>) -> Result<(), FlimError> {
        let n = transients.rows();
        if n < MIN_TRANSIENT_LEN {
            return Err(FlimError::TransientTooShort { got: n });
        }
        if n > MAX_TRANSIENT_LEN {
            return Err(FlimError::TransientTooLong { got: n });
        }
        if transients.cols() == 0 {
            return Err(FlimError::EmptyBatch);
        }
        Ok(())
    }

    /// Validate the prompt batch shape against the transient count.
    pub fn validate_prompts<T>(
        prompts: &CurveMatrix<'_, T>,
        transients: usize,
    ) -> Result<(), FlimError> {
        if prompts.rows() < MIN_PROMPT_LEN {
            return Err(FlimError::PromptTooShort {
                got: prompts.rows(),
            });
        }
        if prompts.cols() != 1 && prompts.cols() != transients {
            return Err(FlimError::BroadcastMismatch {
                input: "prompt",
                got: prompts.cols(),
                transients,
            });
        }
        Ok(())
    }

    /// Validate the time-increment vector.
    pub fn validate_time_steps<T: Float>(
        time_steps: &[T],
        transients: usize,
    ) -> Result<(), FlimError> {
        if time_steps.len() != 1 && time_steps.len() != transients {
            return Err(FlimError::BroadcastMismatch {
                input: "time_step",
                got: time_steps.len(),
                transients,
            });
        }
        for (index, &value) in time_steps.iter().enumerate() {
            if !value.is_finite() || value <= T::zero() {
                return Err(FlimError::InvalidTimeStep {
                    index,
                    value: value.to_f64().unwrap_or(f64::NAN),
                });
            }
        }
        Ok(())
    }

    /// Validate the sigma batch against the noise model and batch shape.
    pub fn validate_sigma<T>(
        sigma: Option<&CurveMatrix<'_, T>>,
        noise: NoiseModel,
        transient_len: usize,
        transients: usize,
    ) -> Result<(), FlimError> {
        let Some(sigma) = sigma else {
            if noise.requires_sigma() {
                return Err(FlimError::MissingSigma);
            }
            return Ok(());
        };
        if sigma.cols() != 1 && sigma.cols() != transients {
            return Err(FlimError::BroadcastMismatch {
                input: "sigma",
                got: sigma.cols(),
                transients,
            });
        }
        if sigma.rows() != transient_len {
            return Err(FlimError::SigmaLengthMismatch {
                got: sigma.rows(),
                expected: transient_len,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Fit Window Validation
    // ========================================================================

    /// Validate `fit_start` against the transient length.
    pub fn validate_fit_start(fit_start: usize, transient_len: usize) -> Result<(), FlimError> {
        if fit_start > transient_len - 2 {
            return Err(FlimError::InvalidFitStart {
                got: fit_start,
                max: transient_len - 2,
            });
        }
        Ok(())
    }

    /// Validate `fit_end` against `fit_start` and the transient length.
    pub fn validate_fit_end(
        fit_start: usize,
        fit_end: usize,
        transient_len: usize,
    ) -> Result<(), FlimError> {
        if fit_end <= fit_start || fit_end > transient_len - 1 {
            return Err(FlimError::InvalidFitEnd {
                got: fit_end,
                min: fit_start + 1,
                max: transient_len - 1,
            });
        }
        Ok(())
    }

    /// Require positive degrees of freedom for the selected model.
    ///
    /// The reduced chi-square divides by `window - p`; a window no wider
    /// than the parameter count must be rejected here, never divided.
    pub fn validate_degrees_of_freedom(window: usize, params: usize) -> Result<(), FlimError> {
        if window <= params {
            return Err(FlimError::InsufficientDegreesOfFreedom { window, params });
        }
        Ok(())
    }

    // ========================================================================
    // Convergence Parameter Validation
    // ========================================================================

    /// Validate the reduced chi-square stopping ratio.
    pub fn validate_chi_sq_target<T: Float>(target: T) -> Result<(), FlimError> {
        if !target.is_finite() || target < T::one() {
            return Err(FlimError::InvalidChiSqTarget(
                target.to_f64().unwrap_or(f64::NAN),
            ));
        }
        Ok(())
    }

    /// Validate the per-iteration chi-square improvement threshold.
    pub fn validate_chi_sq_delta<T: Float>(delta: T) -> Result<(), FlimError> {
        if !delta.is_finite() || delta < T::zero() || delta >= T::from(0.5).unwrap() {
            return Err(FlimError::InvalidChiSqDelta(
                delta.to_f64().unwrap_or(f64::NAN),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Element Validation
    // ========================================================================

    /// Validate that every element of `data` is finite.
    pub fn validate_finite<T: Float>(name: &str, data: &[T]) -> Result<(), FlimError> {
        for (i, &v) in data.iter().enumerate() {
            if !v.is_finite() {
                return Err(FlimError::NonFiniteValue(format!(
                    "{}[{}]={}",
                    name,
                    i,
                    v.to_f64().unwrap_or(f64::NAN)
                )));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Batch Assembly
    // ========================================================================

    /// Validate a whole batch and assemble its descriptor.
    #[allow(clippy::too_many_arguments)]
    pub fn validate_batch<'a, T: Float>(
        transients: CurveMatrix<'a, T>,
        prompts: CurveMatrix<'a, T>,
        time_steps: &'a [T],
        sigma: Option<CurveMatrix<'a, T>>,
        model: DecayModel,
        noise: NoiseModel,
        chi_sq_target: T,
        chi_sq_delta: T,
        fit_start: usize,
        fit_end: Option<usize>,
    ) -> Result<BatchDescriptor<'a, T>, FlimError> {
        Self::validate_transients(&transients)?;
        let transient_len = transients.rows();
        let transient_count = transients.cols();

        Self::validate_prompts(&prompts, transient_count)?;
        Self::validate_time_steps(time_steps, transient_count)?;
        Self::validate_fit_start(fit_start, transient_len)?;
        let fit_end = fit_end.unwrap_or(transient_len - 1);
        Self::validate_fit_end(fit_start, fit_end, transient_len)?;
        Self::validate_chi_sq_target(chi_sq_target)?;
        Self::validate_chi_sq_delta(chi_sq_delta)?;
        Self::validate_sigma(sigma.as_ref(), noise, transient_len, transient_count)?;
        Self::validate_degrees_of_freedom(fit_end - fit_start, model.param_count())?;

        Self::validate_finite("transient", transients.data())?;
        Self::validate_finite("prompt", prompts.data())?;
        if let Some(s) = sigma.as_ref() {
            Self::validate_finite("sigma", s.data())?;
        }

        Ok(BatchDescriptor {
            transients,
            prompts: BroadcastCurves::new(prompts),
            time_steps: BroadcastSteps::new(time_steps),
            sigma: sigma.map(BroadcastCurves::new),
            fit_start,
            fit_end,
            model,
            noise,
            chi_sq_target,
            chi_sq_delta,
        })
    }
}
