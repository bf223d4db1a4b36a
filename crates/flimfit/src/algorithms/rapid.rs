//! Rapid triple-integral estimation (the "RLD" engine).
//!
//! ## Purpose
//!
//! Closed-form initial estimation of a single-exponential decay
//! `z + a * exp(-t / tau)` from three contiguous, equal-width integrals of
//! the fit window. The estimate seeds the iterative refiner; it is cheap,
//! derivative-free, and good enough to put the refiner in the right basin.
//!
//! ## Design notes
//!
//! * **Thirds**: The fit window is split into three regions of
//!   `(fit_end - fit_start) / 3` bins; leftover bins at the window tail are
//!   ignored by the integrals (they still count toward chi-square).
//! * **Raw data**: The estimate reads the transient directly; the prompt
//!   only enters through the fitted curve used for the chi-square, where the
//!   decay component (not the offset) is convolved with it.
//! * **Failure is soft**: A degenerate window leaves the caller's seed
//!   estimate in place and reports a tagged failure; the batch continues.
//!
//! ## Invariants
//!
//! * `fitted`/`residuals` span the whole transient and are written only
//!   inside `[fit_start, fit_end)`.
//! * The reported chi-square always matches the reported estimate.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::algorithms::{EngineFailure, EngineOutcome};
use crate::math::convolve::convolve;
use crate::math::noise::{chi_square, NoiseModel};

// ============================================================================
// Rapid Estimate
// ============================================================================

/// Single-exponential estimate produced by the rapid engine.
///
/// Time is measured from `fit_start`; `amplitude` is the amplitude at the
/// window start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RapidEstimate<T> {
    /// Constant background offset `z`.
    pub offset: T,

    /// Decay amplitude `a` at the start of the fit window.
    pub amplitude: T,

    /// Decay lifetime `tau`, in the transient's time units.
    pub lifetime: T,
}

// ============================================================================
// Triple-Integral Engine
// ============================================================================

/// Estimate (offset, amplitude, lifetime) from three window integrals.
///
/// `estimate` carries the blind seed in and the refined triple out; on
/// failure the seed is left untouched. `fitted` and `residuals` are filled
/// from whichever estimate stands, and the returned outcome compares the
/// resulting chi-square against `target` (a raw, degrees-of-freedom-scaled
/// target).
#[allow(clippy::too_many_arguments)]
pub fn fit_triple_integral<T: Float>(
    time_step: T,
    transient: &[T],
    fit_start: usize,
    fit_end: usize,
    prompt: &[T],
    noise: NoiseModel,
    sigma: Option<&[T]>,
    target: T,
    estimate: &mut RapidEstimate<T>,
    fitted: &mut [T],
    residuals: &mut [T],
) -> EngineOutcome<T> {
    let window = fit_end - fit_start;
    let third = window / 3;

    let fail = |reason: EngineFailure,
                    estimate: &RapidEstimate<T>,
                    fitted: &mut [T],
                    residuals: &mut [T]| {
        let chi_sq = render_estimate(
            estimate, time_step, transient, fit_start, fit_end, prompt, noise, sigma, fitted,
            residuals,
        );
        EngineOutcome::Failed { reason, chi_sq }
    };

    if third == 0 {
        return fail(EngineFailure::WindowTooNarrow, estimate, fitted, residuals);
    }

    let region_sum = |from: usize| -> T {
        transient[from..from + third]
            .iter()
            .fold(T::zero(), |acc, &v| acc + v)
    };
    let s1 = region_sum(fit_start);
    let s2 = region_sum(fit_start + third);
    let s3 = region_sum(fit_start + 2 * third);

    let d12 = s1 - s2;
    let d23 = s2 - s3;
    if d12 <= T::zero() || d23 <= T::zero() {
        return fail(EngineFailure::NotDecaying, estimate, fitted, residuals);
    }

    // With y_i = z + a * x^i and x = exp(-dt / tau), the region sums obey
    // s2 - s3 = x^third * (s1 - s2), so the ratio recovers the lifetime.
    let ratio = d23 / d12;
    if ratio >= T::one() {
        return fail(EngineFailure::DegenerateLifetime, estimate, fitted, residuals);
    }
    let bins = T::from(third).unwrap();
    let lifetime = -(time_step * bins) / ratio.ln();
    if !lifetime.is_finite() || lifetime <= T::zero() {
        return fail(EngineFailure::DegenerateLifetime, estimate, fitted, residuals);
    }

    let per_bin = (ratio.ln() / bins).exp();
    let amplitude = d12 * (T::one() - per_bin) / ((T::one() - ratio) * (T::one() - ratio));
    let offset = (s1 - amplitude * (T::one() - ratio) / (T::one() - per_bin)) / bins;

    estimate.offset = offset;
    estimate.amplitude = amplitude;
    estimate.lifetime = lifetime;

    let chi_sq = render_estimate(
        estimate, time_step, transient, fit_start, fit_end, prompt, noise, sigma, fitted,
        residuals,
    );
    if chi_sq <= target {
        EngineOutcome::Converged { chi_sq }
    } else {
        EngineOutcome::TargetMissed { chi_sq }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Fill the fit window of `fitted`/`residuals` from `estimate` and return
/// the raw chi-square under `noise`.
///
/// The decay component is convolved with the prompt; the offset is not.
#[allow(clippy::too_many_arguments)]
fn render_estimate<T: Float>(
    estimate: &RapidEstimate<T>,
    time_step: T,
    transient: &[T],
    fit_start: usize,
    fit_end: usize,
    prompt: &[T],
    noise: NoiseModel,
    sigma: Option<&[T]>,
    fitted: &mut [T],
    residuals: &mut [T],
) -> T {
    let window = fit_end - fit_start;
    let decay: Vec<T> = (0..window)
        .map(|r| {
            let t = T::from(r).unwrap() * time_step;
            estimate.amplitude * (-t / estimate.lifetime).exp()
        })
        .collect();

    convolve(&decay, prompt, &mut fitted[fit_start..fit_end]);
    for i in fit_start..fit_end {
        fitted[i] = fitted[i] + estimate.offset;
        residuals[i] = transient[i] - fitted[i];
    }

    chi_square(
        noise,
        &transient[fit_start..fit_end],
        &fitted[fit_start..fit_end],
        sigma.map(|s| &s[fit_start..fit_end]),
    )
}
