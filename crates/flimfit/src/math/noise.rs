//! Noise models and chi-square weighting.
//!
//! ## Purpose
//!
//! This module defines the residual weighting schemes both fit engines share.
//! A noise model maps each time bin to an assumed variance, which weights the
//! least-squares normal equations and the chi-square statistic.
//!
//! ## Design notes
//!
//! * **Selector numbering**: Integer selectors 0-5 map to the variants in
//!   declaration order; Gaussian-on-fit (4) is the default.
//! * **Poisson floor**: Poisson variances are floored at 15 counts, below
//!   which the Gaussian approximation of Poisson noise degrades.
//! * **Maximum likelihood**: The ML model keeps Poisson-on-fit weights for
//!   the normal equations but scores fits with the Poisson deviance instead
//!   of a weighted sum of squares.
//!
//! ## Invariants
//!
//! * Variances are strictly positive for finite inputs.
//!
//! ## Non-goals
//!
//! * This module does not choose a noise model; that is the caller's
//!   (defaulted) decision.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::FlimError;

// ============================================================================
// Weighting Constants
// ============================================================================

/// Minimum variance, in counts, for the Poisson noise models.
const POISSON_VARIANCE_FLOOR: f64 = 15.0;

/// Minimum variance for the Gaussian-on-fit noise model.
const GAUSSIAN_VARIANCE_FLOOR: f64 = 1.0;

// ============================================================================
// Noise Model Enum
// ============================================================================

/// Residual weighting scheme shared by both fit engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseModel {
    /// Constant noise: every bin has unit variance.
    Const,

    /// Per-bin standard deviations supplied by the caller (sigma curves).
    Given,

    /// Poisson noise with variance taken from the measured data.
    PoissonData,

    /// Poisson noise with variance taken from the fitted curve.
    PoissonFit,

    /// Gaussian noise with variance taken from the fitted curve.
    #[default]
    GaussianFit,

    /// Poisson maximum-likelihood scoring (deviance instead of chi-square).
    Mle,
}

impl NoiseModel {
    /// Resolve an integer selector (0-5) to a noise model.
    pub fn from_selector(selector: i32) -> Result<Self, FlimError> {
        match selector {
            0 => Ok(Self::Const),
            1 => Ok(Self::Given),
            2 => Ok(Self::PoissonData),
            3 => Ok(Self::PoissonFit),
            4 => Ok(Self::GaussianFit),
            5 => Ok(Self::Mle),
            got => Err(FlimError::InvalidSelector {
                field: "noise_model",
                got,
            }),
        }
    }

    /// Integer selector of this noise model (0-5).
    pub fn selector(&self) -> i32 {
        match self {
            Self::Const => 0,
            Self::Given => 1,
            Self::PoissonData => 2,
            Self::PoissonFit => 3,
            Self::GaussianFit => 4,
            Self::Mle => 5,
        }
    }

    /// Whether this noise model requires caller-supplied sigma curves.
    pub fn requires_sigma(&self) -> bool {
        matches!(self, Self::Given)
    }

    // ========================================================================
    // Weighting
    // ========================================================================

    /// Assumed variance of one bin given its measured and fitted values.
    pub fn variance<T: Float>(&self, datum: T, fit: T, sigma: Option<T>) -> T {
        match self {
            Self::Const => T::one(),
            Self::Given => {
                let s = sigma.unwrap_or_else(T::one);
                (s * s).max(T::min_positive_value())
            }
            Self::PoissonData => datum.max(T::from(POISSON_VARIANCE_FLOOR).unwrap()),
            Self::PoissonFit | Self::Mle => fit.max(T::from(POISSON_VARIANCE_FLOOR).unwrap()),
            Self::GaussianFit => fit.max(T::from(GAUSSIAN_VARIANCE_FLOOR).unwrap()),
        }
    }

    /// Least-squares weight of one bin (reciprocal variance).
    #[inline]
    pub fn weight<T: Float>(&self, datum: T, fit: T, sigma: Option<T>) -> T {
        self.variance(datum, fit, sigma).recip()
    }

    /// Contribution of one bin to the goodness-of-fit statistic.
    pub fn chi_sq_term<T: Float>(&self, datum: T, fit: T, sigma: Option<T>) -> T {
        match self {
            Self::Mle => {
                // Poisson deviance: 2 * (f - y + y * ln(y / f)).
                let two = T::from(2.0).unwrap();
                let f = fit.max(T::min_positive_value());
                if datum > T::zero() {
                    two * (f - datum + datum * (datum / f).ln())
                } else {
                    two * f
                }
            }
            _ => {
                let r = datum - fit;
                r * r / self.variance(datum, fit, sigma)
            }
        }
    }
}

// ============================================================================
// Chi-Square Accumulation
// ============================================================================

/// Raw (non-reduced) goodness-of-fit statistic over a fit window.
///
/// All slices must already be restricted to the fit window.
pub fn chi_square<T: Float>(
    noise: NoiseModel,
    data: &[T],
    fitted: &[T],
    sigma: Option<&[T]>,
) -> T {
    let mut total = T::zero();
    for (i, (&y, &f)) in data.iter().zip(fitted.iter()).enumerate() {
        let s = sigma.map(|s| s[i]);
        total = total + noise.chi_sq_term(y, f, s);
    }
    total
}
