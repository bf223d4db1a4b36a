//! Layer 3: Algorithms
//!
//! # Purpose
//!
//! The two numerical fit engines and their shared support code: the rapid
//! triple-integral estimator, the Levenberg-Marquardt refiner, and the
//! Gauss-Jordan solver both lean on. The engines implement a fixed call
//! contract so the execution engine above stays agnostic of their internals.

/// Levenberg-Marquardt iterative refinement.
pub mod marquardt;

/// Rapid triple-integral estimation.
pub mod rapid;

/// Gauss-Jordan elimination and inversion.
pub mod solve;

// ============================================================================
// Engine Outcomes
// ============================================================================

/// Tagged outcome of a single engine invocation on one transient.
///
/// Engine trouble is never fatal to a batch: the executor records the
/// outcome, keeps whatever estimate the engine left behind, and moves on to
/// the next transient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineOutcome<T> {
    /// The chi-square target was reached.
    Converged {
        /// Raw (non-reduced) chi-square of the final fit.
        chi_sq: T,
    },

    /// The engine finished cleanly but above the chi-square target.
    TargetMissed {
        /// Raw (non-reduced) chi-square of the final fit.
        chi_sq: T,
    },

    /// The engine could not produce a usable fit; the reported estimate is
    /// its last state and may be degenerate.
    Failed {
        /// Why the engine gave up.
        reason: EngineFailure,
        /// Raw chi-square of the last state (may be non-finite).
        chi_sq: T,
    },
}

impl<T: Copy> EngineOutcome<T> {
    /// Raw chi-square of the engine's final state.
    #[inline]
    pub fn chi_sq(&self) -> T {
        match self {
            Self::Converged { chi_sq }
            | Self::TargetMissed { chi_sq }
            | Self::Failed { chi_sq, .. } => *chi_sq,
        }
    }

    /// True when the chi-square target was reached.
    #[inline]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    /// True when the engine gave up without a usable fit.
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Why an engine invocation gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFailure {
    /// The fit window is too narrow to form three integration regions.
    WindowTooNarrow,

    /// The integral differences were non-positive; the curve does not decay.
    NotDecaying,

    /// The derived lifetime was non-finite or non-positive.
    DegenerateLifetime,

    /// The normal-equation matrix was singular.
    SingularMatrix,

    /// The goodness-of-fit statistic became non-finite.
    NumericOverflow,
}
