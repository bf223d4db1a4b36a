//! Error types for batch decay fitting.
//!
//! ## Purpose
//!
//! This module defines the error conditions that can occur while assembling
//! and validating a batch of transients, including shape mismatches,
//! out-of-range fit windows, and invalid convergence settings.
//!
//! ## Design notes
//!
//! * **Contextual**: Errors carry the offending value and the allowed range.
//! * **Fatal**: Every variant aborts the batch before any fit work is done.
//!   Per-transient engine failures are *not* errors; they are reported as
//!   tagged outcomes in the batch output (see `engine::output`).
//! * **No-std**: Supports `no_std` environments by using `alloc` for dynamic
//!   messages.
//!
//! ## Invariants
//!
//! * All variants provide sufficient context for diagnosis.
//! * Numeric values in errors use the same types as the public API.
//!
//! ## Non-goals
//!
//! * This module does not perform the validation logic itself.
//! * This module does not provide error recovery or fallback strategies.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(feature = "std")]
use std::error::Error;
#[cfg(feature = "std")]
use std::string::String;

// External dependencies
use core::fmt::{Display, Formatter, Result};

// ============================================================================
// Error Type
// ============================================================================

/// Error type for batch decay-fit operations.
#[derive(Debug, Clone, PartialEq)]
pub enum FlimError {
    /// The transient batch contains no curves.
    EmptyBatch,

    /// A flat buffer's length is not a whole number of columns.
    RaggedMatrix {
        /// Total number of elements supplied.
        len: usize,
        /// Declared number of rows (time bins) per column.
        rows: usize,
    },

    /// Transients must contain at least 2 time bins.
    TransientTooShort {
        /// Number of time bins provided.
        got: usize,
    },

    /// Transients must not exceed 2048 time bins.
    TransientTooLong {
        /// Number of time bins provided.
        got: usize,
    },

    /// Reference (prompt) curves must contain at least 2 points.
    PromptTooShort {
        /// Number of points provided.
        got: usize,
    },

    /// A broadcast input must be supplied once or once per transient.
    BroadcastMismatch {
        /// Name of the offending input ("prompt", "time_step", "sigma").
        input: &'static str,
        /// Number of columns/elements supplied.
        got: usize,
        /// Number of transients in the batch.
        transients: usize,
    },

    /// Sigma curves must have the same number of time bins as the transients.
    SigmaLengthMismatch {
        /// Number of time bins in the sigma curves.
        got: usize,
        /// Number of time bins in the transients.
        expected: usize,
    },

    /// The given-sigma noise model requires a sigma batch.
    MissingSigma,

    /// `fit_start` must lie in `[0, n - 2]`.
    InvalidFitStart {
        /// The fit_start provided.
        got: usize,
        /// Largest admissible value (`n - 2`).
        max: usize,
    },

    /// `fit_end` must lie in `(fit_start, n - 1]`.
    InvalidFitEnd {
        /// The fit_end provided.
        got: usize,
        /// Smallest admissible value (`fit_start + 1`).
        min: usize,
        /// Largest admissible value (`n - 1`).
        max: usize,
    },

    /// Time increments must be positive and finite.
    InvalidTimeStep {
        /// Index of the offending element.
        index: usize,
        /// The value provided.
        value: f64,
    },

    /// The chi-square target must be at least 1 and finite.
    InvalidChiSqTarget(f64),

    /// The chi-square delta must lie in `[0, 0.5)`.
    InvalidChiSqDelta(f64),

    /// An integer selector does not name a known model or noise model.
    InvalidSelector {
        /// Name of the selector ("model", "noise_model").
        field: &'static str,
        /// The selector value provided.
        got: i32,
    },

    /// Input data contains NaN or infinite values.
    NonFiniteValue(String),

    /// The fit window leaves no degrees of freedom for the selected model.
    InsufficientDegreesOfFreedom {
        /// Fit window width (`fit_end - fit_start`).
        window: usize,
        /// Number of free parameters of the selected model.
        params: usize,
    },

    /// Parameter was set multiple times in the builder.
    DuplicateParameter {
        /// Name of the parameter that was set multiple times.
        parameter: &'static str,
    },
}

// ============================================================================
// Display Implementation
// ============================================================================

impl Display for FlimError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::EmptyBatch => write!(f, "Transient batch is empty (need at least 1 transient)"),
            Self::RaggedMatrix { len, rows } => {
                write!(
                    f,
                    "Ragged matrix: {len} elements do not divide into columns of {rows} rows"
                )
            }
            Self::TransientTooShort { got } => {
                write!(f, "Transient too short: {got} time bins (need at least 2)")
            }
            Self::TransientTooLong { got } => {
                write!(f, "Transient too long: {got} time bins (at most 2048)")
            }
            Self::PromptTooShort { got } => {
                write!(f, "Prompt too short: {got} points (need at least 2)")
            }
            Self::BroadcastMismatch {
                input,
                got,
                transients,
            } => {
                write!(
                    f,
                    "Broadcast mismatch for '{input}': got {got}, must be 1 or {transients}"
                )
            }
            Self::SigmaLengthMismatch { got, expected } => {
                write!(
                    f,
                    "Sigma length mismatch: {got} time bins (transients have {expected})"
                )
            }
            Self::MissingSigma => {
                write!(f, "Noise model 'given' requires a sigma batch")
            }
            Self::InvalidFitStart { got, max } => {
                write!(f, "Invalid fit_start: {got} (must be between 0 and {max})")
            }
            Self::InvalidFitEnd { got, min, max } => {
                write!(
                    f,
                    "Invalid fit_end: {got} (must be between {min} and {max})"
                )
            }
            Self::InvalidTimeStep { index, value } => {
                write!(
                    f,
                    "Invalid time_step[{index}]: {value} (must be positive and finite)"
                )
            }
            Self::InvalidChiSqTarget(target) => {
                write!(
                    f,
                    "Invalid chi_sq_target: {target} (must be at least 1 and finite)"
                )
            }
            Self::InvalidChiSqDelta(delta) => {
                write!(
                    f,
                    "Invalid chi_sq_delta: {delta} (must be >= 0 and < 0.5)"
                )
            }
            Self::InvalidSelector { field, got } => {
                write!(f, "Invalid {field} selector: {got}")
            }
            Self::NonFiniteValue(s) => write!(f, "Invalid numeric value: {s}"),
            Self::InsufficientDegreesOfFreedom { window, params } => {
                write!(
                    f,
                    "Fit window of {window} bins leaves no degrees of freedom for a \
                     {params}-parameter model (need fit_end - fit_start > {params})"
                )
            }
            Self::DuplicateParameter { parameter } => {
                write!(
                    f,
                    "Parameter '{parameter}' was set multiple times. Each parameter can only be configured once."
                )
            }
        }
    }
}

// ============================================================================
// Standard Error Trait
// ============================================================================

#[cfg(feature = "std")]
impl Error for FlimError {}
