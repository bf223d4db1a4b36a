//! Decay models for fluorescence-lifetime fitting.
//!
//! ## Purpose
//!
//! This module maps a model selector to its parameter scheme (count, layout,
//! initial-guess derivation) and provides the model evaluation functions the
//! iterative refiner needs: values and analytic partial derivatives for the
//! multi-exponential and stretched-exponential decay families.
//!
//! ## Design notes
//!
//! * **Fixed-fraction seeding**: Initial multi-exponential parameters are
//!   derived from a single rapid (offset, amplitude, lifetime) estimate by
//!   splitting the amplitude and scaling the lifetime with fixed empirical
//!   fractions carried over from TRI2/SP. These are heuristic constants, not
//!   derivable quantities, and are reproduced exactly.
//! * **Time convention**: `t` is measured from the first bin of the fit
//!   window, in the transient's time units; amplitudes are amplitudes at the
//!   window start.
//! * **All-free parameters**: The scheme never marks parameters fixed; the
//!   refiner contract still takes a free mask so the engine seam stays
//!   general.
//!
//! ## Key concepts
//!
//! * **Parameter layout**: `[z, a1, tau1, a2, tau2, ...]` for exponentials;
//!   `[z, a, tau, h]` for the stretched model, `h` being the stretch
//!   exponent.
//!
//! ## Invariants
//!
//! * `param_count()` is 3, 5, 7, or 4 and fixed for a whole batch.
//! * `initial_params` is a pure function of the rapid estimate.
//!
//! ## Non-goals
//!
//! * This module does not run fits; see `algorithms`.
//! * This module does not handle prompt convolution; see `math::convolve`.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::FlimError;

// ============================================================================
// Seeding Constants
// ============================================================================

/// Amplitude fraction of the dominant component in a double-exponential seed.
const DOUBLE_AMP_MAJOR: f64 = 0.75;

/// Amplitude fraction of the minor component in a double-exponential seed.
const DOUBLE_AMP_MINOR: f64 = 0.25;

/// Amplitude fraction of each minor component in a triple-exponential seed.
const TRIPLE_AMP_MINOR: f64 = 0.1666667;

/// Lifetime fraction for the second decay component.
const TAU_TWO_THIRDS: f64 = 0.6666667;

/// Lifetime fraction for the third decay component.
const TAU_ONE_THIRD: f64 = 0.3333333;

/// Seed value for the stretch exponent `h`.
const STRETCH_SEED: f64 = 1.5;

// ============================================================================
// Decay Model Enum
// ============================================================================

/// Decay model selector.
///
/// Selectors 1-4 follow the numbering of the reference batch interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecayModel {
    /// Single exponential: `z + a * exp(-t / tau)`.
    #[default]
    SingleExp,

    /// Double exponential: `z + a1 * exp(-t / tau1) + a2 * exp(-t / tau2)`.
    DoubleExp,

    /// Triple exponential: three decay components over a common offset.
    TripleExp,

    /// Stretched exponential: `z + a * exp(-(t / tau)^(1 / h))`.
    StretchedExp,
}

impl DecayModel {
    /// Resolve an integer selector (1-4) to a model.
    pub fn from_selector(selector: i32) -> Result<Self, FlimError> {
        match selector {
            1 => Ok(Self::SingleExp),
            2 => Ok(Self::DoubleExp),
            3 => Ok(Self::TripleExp),
            4 => Ok(Self::StretchedExp),
            got => Err(FlimError::InvalidSelector {
                field: "model",
                got,
            }),
        }
    }

    /// Integer selector of this model (1-4).
    pub fn selector(&self) -> i32 {
        match self {
            Self::SingleExp => 1,
            Self::DoubleExp => 2,
            Self::TripleExp => 3,
            Self::StretchedExp => 4,
        }
    }

    /// Number of free parameters `p` of this model.
    pub fn param_count(&self) -> usize {
        match self {
            Self::SingleExp => 3,
            Self::DoubleExp => 5,
            Self::TripleExp => 7,
            Self::StretchedExp => 4,
        }
    }

    // ========================================================================
    // Initial-Parameter Derivation
    // ========================================================================

    /// Derive the full initial parameter vector from a rapid
    /// (offset, amplitude, lifetime) estimate.
    ///
    /// Pure function; the fixed amplitude/lifetime fractions come from the
    /// TRI2/SP seeding scheme and are reproduced exactly.
    pub fn initial_params<T: Float>(&self, z: T, a: T, tau: T) -> Vec<T> {
        match self {
            Self::SingleExp => vec![z, a, tau],
            Self::DoubleExp => vec![
                z,
                T::from(DOUBLE_AMP_MAJOR).unwrap() * a,
                tau,
                T::from(DOUBLE_AMP_MINOR).unwrap() * a,
                T::from(TAU_TWO_THIRDS).unwrap() * tau,
            ],
            Self::TripleExp => vec![
                z,
                T::from(DOUBLE_AMP_MAJOR).unwrap() * a,
                tau,
                T::from(TRIPLE_AMP_MINOR).unwrap() * a,
                T::from(TAU_TWO_THIRDS).unwrap() * tau,
                T::from(TRIPLE_AMP_MINOR).unwrap() * a,
                T::from(TAU_ONE_THIRD).unwrap() * tau,
            ],
            Self::StretchedExp => vec![z, a, tau, T::from(STRETCH_SEED).unwrap()],
        }
    }

    // ========================================================================
    // Model Evaluation
    // ========================================================================

    /// Evaluate the model at time `t` for the given parameter vector.
    pub fn evaluate<T: Float>(&self, t: T, params: &[T]) -> T {
        match self {
            Self::SingleExp | Self::DoubleExp | Self::TripleExp => {
                let mut y = params[0];
                let mut k = 1;
                while k + 1 < params.len() {
                    y = y + params[k] * (-t / params[k + 1]).exp();
                    k += 2;
                }
                y
            }
            Self::StretchedExp => {
                let (z, a, tau, h) = (params[0], params[1], params[2], params[3]);
                if t <= T::zero() {
                    return z + a;
                }
                z + a * (-((t / tau).powf(h.recip()))).exp()
            }
        }
    }

    /// Evaluate the model and its partial derivatives at time `t`.
    ///
    /// `dyda` must have length `param_count()`; on return `dyda[j]` holds
    /// the derivative of the model value with respect to parameter `j`.
    pub fn evaluate_with_derivs<T: Float>(&self, t: T, params: &[T], dyda: &mut [T]) -> T {
        match self {
            Self::SingleExp | Self::DoubleExp | Self::TripleExp => {
                dyda[0] = T::one();
                let mut y = params[0];
                let mut k = 1;
                while k + 1 < params.len() {
                    let a = params[k];
                    let tau = params[k + 1];
                    let e = (-t / tau).exp();
                    y = y + a * e;
                    dyda[k] = e;
                    dyda[k + 1] = a * e * t / (tau * tau);
                    k += 2;
                }
                y
            }
            Self::StretchedExp => {
                let (z, a, tau, h) = (params[0], params[1], params[2], params[3]);
                dyda[0] = T::one();
                if t <= T::zero() {
                    // u -> 0 at the window origin; only z and a move the value.
                    dyda[1] = T::one();
                    dyda[2] = T::zero();
                    dyda[3] = T::zero();
                    return z + a;
                }
                let u = (t / tau).powf(h.recip());
                let e = (-u).exp();
                dyda[1] = e;
                dyda[2] = a * e * u / (h * tau);
                dyda[3] = a * e * u * (t / tau).ln() / (h * h);
                z + a * e
            }
        }
    }
}
