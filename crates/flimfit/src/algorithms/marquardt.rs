//! Levenberg-Marquardt refinement (the "LMA" engine).
//!
//! ## Purpose
//!
//! Weighted nonlinear least-squares refinement of a full decay-model
//! parameter vector, starting from the seed derived from the rapid estimate.
//! The damped normal equations are rebuilt each iteration from analytic
//! model derivatives and solved by Gauss-Jordan elimination.
//!
//! ## Design notes
//!
//! * **Damping**: Marquardt's diagonal scaling, `alpha_jj * (1 + lambda)`,
//!   with lambda moved a factor of 10 down on an accepted step and up on a
//!   rejected one. A lambda ceiling ends refinement when no usable step can
//!   be found.
//! * **Stopping**: Refinement stops once the relative chi-square improvement
//!   of an accepted step falls below `delta`, with a fixed iteration cap as
//!   a backstop. Convergence is then judged against the caller's raw,
//!   degrees-of-freedom-scaled chi-square `target`.
//! * **Convolution**: The decay component of the model and its parameter
//!   derivatives are convolved with the prompt; the constant offset and its
//!   unit derivative are not.
//! * **Scratch contract**: `covar`, `alpha`, and `err_axes` are caller-owned
//!   window-sized matrices; only their leading `p x p` block is used. On a
//!   clean finish `covar` holds the inverse curvature and `err_axes` carries
//!   95%-confidence half-widths on its diagonal.
//!
//! ## Invariants
//!
//! * `params` always holds the best parameter vector seen so far; a failed
//!   or capped refinement leaves the last accepted state in place.
//! * `fitted`/`residuals` are written only inside `[fit_start, fit_end)` and
//!   always match the returned parameter vector.

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
use crate::algorithms::solve::{invert, solve_in_place};
use crate::algorithms::{EngineFailure, EngineOutcome};
use crate::math::convolve::convolve;
use crate::math::decay::DecayModel;
use crate::math::noise::{chi_square, NoiseModel};
use crate::primitives::buffer::SquareMatrix;

// ============================================================================
// Refinement Constants
// ============================================================================

/// Hard cap on refinement iterations.
const MAX_REFINE_ITERATIONS: usize = 100;

/// Starting value of the Marquardt damping factor.
const INITIAL_LAMBDA: f64 = 0.001;

/// Factor applied to lambda on accepted (down) and rejected (up) steps.
const LAMBDA_SCALE: f64 = 10.0;

/// Lambda ceiling beyond which refinement is considered stuck.
const LAMBDA_CEILING: f64 = 1.0e10;

/// Two-sided 95% normal quantile used for the confidence error axes.
const Z_95: f64 = 1.959964;

// ============================================================================
// Marquardt Engine
// ============================================================================

/// Refine `params` in place against the fit window of `transient`.
///
/// `free` marks which parameters may move (the batch orchestrator always
/// passes an all-free mask). `target` is the raw chi-square target, `delta`
/// the relative-improvement stopping threshold. Outputs are written into the
/// caller's scratch: the fitted curve, residuals, covariance, and confidence
/// error axes.
#[allow(clippy::too_many_arguments)]
pub fn refine_marquardt<T: Float>(
    time_step: T,
    transient: &[T],
    fit_start: usize,
    fit_end: usize,
    prompt: &[T],
    noise: NoiseModel,
    sigma: Option<&[T]>,
    model: DecayModel,
    params: &mut [T],
    free: &[bool],
    target: T,
    delta: T,
    fitted: &mut [T],
    residuals: &mut [T],
    covar: &mut SquareMatrix<T>,
    alpha: &mut SquareMatrix<T>,
    err_axes: &mut SquareMatrix<T>,
) -> EngineOutcome<T> {
    let window = fit_end - fit_start;
    let p = params.len();
    let data = &transient[fit_start..fit_end];
    let sigma_w = sigma.map(|s| &s[fit_start..fit_end]);
    let free_idx: Vec<usize> = (0..p).filter(|&j| free[j]).collect();
    let n_free = free_idx.len();

    // Working buffers for the inner iteration.
    let mut decay_scratch = vec![T::zero(); window];
    let mut vals = vec![T::zero(); window];
    let mut dyda_scratch = vec![T::zero(); p * window];
    let mut dyda = vec![T::zero(); p * window];
    let mut point = vec![T::zero(); p];
    let mut trial = vec![T::zero(); p];
    let mut trial_vals = vec![T::zero(); window];
    let mut beta = vec![T::zero(); n_free];
    let mut step = vec![T::zero(); n_free];

    eval_window(model, time_step, params, prompt, &mut decay_scratch, &mut vals);
    let mut chi_sq = chi_square(noise, data, &vals, sigma_w);
    let mut failure = None;

    if !chi_sq.is_finite() {
        failure = Some(EngineFailure::NumericOverflow);
    } else {
        let mut lambda = T::from(INITIAL_LAMBDA).unwrap();
        let scale = T::from(LAMBDA_SCALE).unwrap();
        let ceiling = T::from(LAMBDA_CEILING).unwrap();

        for _ in 0..MAX_REFINE_ITERATIONS {
            eval_derivs(
                model,
                time_step,
                params,
                prompt,
                &mut decay_scratch,
                &mut vals,
                &mut dyda_scratch,
                &mut dyda,
                &mut point,
            );
            accumulate_normal_equations(
                noise, data, &vals, &dyda, sigma_w, &free_idx, window, alpha, &mut beta,
            );

            // Damped system into the covariance scratch.
            for jf in 0..n_free {
                for kf in 0..n_free {
                    let mut v = alpha.at(jf, kf);
                    if jf == kf {
                        v = v * (T::one() + lambda);
                    }
                    covar.set(jf, kf, v);
                }
                step[jf] = beta[jf];
            }
            if !solve_in_place(covar, &mut step, n_free) {
                failure = Some(EngineFailure::SingularMatrix);
                break;
            }

            trial.copy_from_slice(params);
            for (jf, &j) in free_idx.iter().enumerate() {
                trial[j] = trial[j] + step[jf];
            }
            eval_window(model, time_step, &trial, prompt, &mut decay_scratch, &mut trial_vals);
            let trial_chi = chi_square(noise, data, &trial_vals, sigma_w);

            if trial_chi.is_finite() && trial_chi < chi_sq {
                let improvement = (chi_sq - trial_chi) / chi_sq.max(T::min_positive_value());
                params.copy_from_slice(&trial);
                chi_sq = trial_chi;
                lambda = lambda / scale;
                if improvement < delta {
                    break;
                }
            } else {
                lambda = lambda * scale;
                if lambda > ceiling {
                    break;
                }
            }
        }
    }

    // Final curve and residuals at the accepted parameters.
    eval_window(model, time_step, params, prompt, &mut decay_scratch, &mut vals);
    fitted[fit_start..fit_end].copy_from_slice(&vals);
    for (i, (&y, &f)) in data.iter().zip(vals.iter()).enumerate() {
        residuals[fit_start + i] = y - f;
    }

    // Covariance and confidence error axes from the curvature at the
    // solution (undamped).
    eval_derivs(
        model,
        time_step,
        params,
        prompt,
        &mut decay_scratch,
        &mut vals,
        &mut dyda_scratch,
        &mut dyda,
        &mut point,
    );
    accumulate_normal_equations(
        noise, data, &vals, &dyda, sigma_w, &free_idx, window, alpha, &mut beta,
    );
    covar.clear();
    if invert(alpha, covar, n_free) {
        let z95 = T::from(Z_95).unwrap();
        err_axes.clear();
        for jf in 0..n_free {
            let var = covar.at(jf, jf);
            if var > T::zero() {
                err_axes.set(jf, jf, var.sqrt() * z95);
            }
        }
    }

    match failure {
        Some(reason) => EngineOutcome::Failed { reason, chi_sq },
        None if chi_sq <= target => EngineOutcome::Converged { chi_sq },
        None => EngineOutcome::TargetMissed { chi_sq },
    }
}

// ============================================================================
// Model Evaluation over the Fit Window
// ============================================================================

/// Evaluate the convolved model over the fit window.
///
/// `scratch` receives the raw decay component; `out` the convolved curve
/// with the offset added back.
fn eval_window<T: Float>(
    model: DecayModel,
    time_step: T,
    params: &[T],
    prompt: &[T],
    scratch: &mut [T],
    out: &mut [T],
) {
    let z = params[0];
    for (r, s) in scratch.iter_mut().enumerate() {
        let t = T::from(r).unwrap() * time_step;
        *s = model.evaluate(t, params) - z;
    }
    convolve(scratch, prompt, out);
    for v in out.iter_mut() {
        *v = *v + z;
    }
}

/// Evaluate the convolved model and its convolved parameter derivatives.
///
/// `dyda` is row-major with one window-length row per parameter. The offset
/// row stays at the unconvolved unit derivative.
#[allow(clippy::too_many_arguments)]
fn eval_derivs<T: Float>(
    model: DecayModel,
    time_step: T,
    params: &[T],
    prompt: &[T],
    scratch_vals: &mut [T],
    vals: &mut [T],
    scratch_dyda: &mut [T],
    dyda: &mut [T],
    point: &mut [T],
) {
    let window = vals.len();
    let p = params.len();
    let z = params[0];

    for r in 0..window {
        let t = T::from(r).unwrap() * time_step;
        let y = model.evaluate_with_derivs(t, params, point);
        scratch_vals[r] = y - z;
        for j in 0..p {
            scratch_dyda[j * window + r] = point[j];
        }
    }

    convolve(scratch_vals, prompt, vals);
    for v in vals.iter_mut() {
        *v = *v + z;
    }

    for v in dyda.iter_mut().take(window) {
        *v = T::one();
    }
    for j in 1..p {
        convolve(
            &scratch_dyda[j * window..(j + 1) * window],
            prompt,
            &mut dyda[j * window..(j + 1) * window],
        );
    }
}

/// Build the weighted curvature matrix and gradient vector over the free
/// parameters.
#[allow(clippy::too_many_arguments)]
fn accumulate_normal_equations<T: Float>(
    noise: NoiseModel,
    data: &[T],
    vals: &[T],
    dyda: &[T],
    sigma: Option<&[T]>,
    free_idx: &[usize],
    window: usize,
    alpha: &mut SquareMatrix<T>,
    beta: &mut [T],
) {
    let n_free = free_idx.len();
    for jf in 0..n_free {
        beta[jf] = T::zero();
        for kf in 0..n_free {
            alpha.set(jf, kf, T::zero());
        }
    }

    for r in 0..window {
        let s = sigma.map(|s| s[r]);
        let w = noise.weight(data[r], vals[r], s);
        let dy = data[r] - vals[r];
        for (jf, &j) in free_idx.iter().enumerate() {
            let gj = dyda[j * window + r];
            beta[jf] = beta[jf] + w * dy * gj;
            for (kf, &k) in free_idx.iter().enumerate().take(jf + 1) {
                let v = alpha.at(jf, kf) + w * gj * dyda[k * window + r];
                alpha.set(jf, kf, v);
            }
        }
    }

    // Symmetrize the upper triangle.
    for jf in 0..n_free {
        for kf in (jf + 1)..n_free {
            alpha.set(jf, kf, alpha.at(kf, jf));
        }
    }
}
