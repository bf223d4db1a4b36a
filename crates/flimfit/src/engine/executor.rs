//! Two-stage fit execution for batch decay fitting.
//!
//! ## Purpose
//!
//! This module runs the per-transient fit chain — rapid estimate, initial
//! parameter derivation, iterative refinement, result collection — and the
//! sequential loop over a whole validated batch.
//!
//! ## Design notes
//!
//! * **Strictly sequential stages**: Each transient walks
//!   RAPID_ESTIMATE -> DERIVE_INIT -> REFINE -> COLLECT exactly once; there
//!   is no branching back and no retry.
//! * **Failure is per-transient**: A failed engine stage is recorded in the
//!   transient's status and its last state still flows into the output
//!   tables; the batch always continues.
//! * **Degrees-of-freedom targets**: Both engines receive the raw chi-square
//!   target `chi_sq_target * (window - k)`, with `k = 3` for the rapid stage
//!   and `k = p` for refinement; the reduced chi-square divides by
//!   `window - p`.
//! * **Per-transient scratch**: All working memory is allocated fresh for
//!   each transient and dropped at collection, so transients are fully
//!   independent — which is also what makes the parallel batch pass in the
//!   companion crate safe.
//!
//! ## Invariants
//!
//! * Broadcast inputs are resolved once per transient index before the
//!   rapid stage.
//! * No mutable state persists between transients.
//!
//! ## Non-goals
//!
//! * This module does not validate inputs (handled by `validator`).
//! * This module does not implement the numerical engines (handled by
//!   `algorithms`).

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
use crate::algorithms::marquardt::refine_marquardt;
use crate::algorithms::rapid::{fit_triple_integral, RapidEstimate};
use crate::engine::output::{BatchFitOutput, OutputRequests, TransientRecord, TransientStatus};
use crate::engine::validator::BatchDescriptor;
use crate::primitives::buffer::TransientScratch;

// ============================================================================
// Seeding Constants
// ============================================================================

/// Blind initial offset, from the TRI2/SP seeding scheme.
const SEED_OFFSET: f64 = 0.0;

/// Blind initial amplitude.
const SEED_AMPLITUDE: f64 = 1000.0;

/// Blind initial lifetime, in time units.
const SEED_LIFETIME: f64 = 2.0;

/// Parameter count of the rapid stage's three-parameter estimate, used for
/// its degrees-of-freedom adjustment.
const RAPID_PARAM_COUNT: usize = 3;

// ============================================================================
// Fit Executor
// ============================================================================

/// Executor for the two-stage batch fit.
pub struct FitExecutor;

impl FitExecutor {
    /// Fit every transient of a validated batch, in order.
    pub fn run<T: Float>(
        descriptor: &BatchDescriptor<'_, T>,
        requests: OutputRequests,
    ) -> BatchFitOutput<T> {
        let mut output = BatchFitOutput::allocate(
            descriptor.model,
            descriptor.transient_len(),
            descriptor.transient_count(),
            requests,
        );
        for index in 0..descriptor.transient_count() {
            let record = Self::fit_transient(descriptor, index, requests);
            output.write_record(index, record);
        }
        output
    }

    /// Run the two-stage fit chain for transient `index`.
    ///
    /// Exposed separately so the batch loop can be driven out of order (or
    /// in parallel) by extension crates; every call is independent.
    pub fn fit_transient<T: Float>(
        descriptor: &BatchDescriptor<'_, T>,
        index: usize,
        requests: OutputRequests,
    ) -> TransientRecord<T> {
        let model = descriptor.model;
        let p = model.param_count();
        let window = descriptor.window();

        // Broadcast resolution for this transient.
        let transient = descriptor.transients.column(index);
        let prompt = descriptor.prompts.curve(index);
        let sigma = descriptor.sigma.as_ref().map(|s| s.curve(index));
        let time_step = descriptor.time_steps.step(index);

        let mut scratch = TransientScratch::new(descriptor.transient_len(), p, window);

        // RAPID_ESTIMATE, from the blind seed.
        let mut estimate = RapidEstimate {
            offset: T::from(SEED_OFFSET).unwrap(),
            amplitude: T::from(SEED_AMPLITUDE).unwrap(),
            lifetime: T::from(SEED_LIFETIME).unwrap(),
        };
        let rapid_target =
            descriptor.chi_sq_target * T::from(window - RAPID_PARAM_COUNT).unwrap();
        let rapid = fit_triple_integral(
            time_step,
            transient,
            descriptor.fit_start,
            descriptor.fit_end,
            prompt,
            descriptor.noise,
            sigma,
            rapid_target,
            &mut estimate,
            &mut scratch.fitted,
            &mut scratch.residuals,
        );
        let rapid_fitted = requests.rapid_fitted.then(|| scratch.fitted.clone());

        // DERIVE_INIT via the model's fixed-fraction scheme.
        scratch.params = model.initial_params(estimate.offset, estimate.amplitude, estimate.lifetime);
        let free = vec![true; p];

        // REFINE with a degrees-of-freedom-adjusted target.
        let dof = window - p;
        let refine_target = descriptor.chi_sq_target * T::from(dof).unwrap();
        scratch.clear_curves();
        let refine = refine_marquardt(
            time_step,
            transient,
            descriptor.fit_start,
            descriptor.fit_end,
            prompt,
            descriptor.noise,
            sigma,
            model,
            &mut scratch.params,
            &free,
            refine_target,
            descriptor.chi_sq_delta,
            &mut scratch.fitted,
            &mut scratch.residuals,
            &mut scratch.covar,
            &mut scratch.alpha,
            &mut scratch.err_axes,
        );

        // COLLECT
        let reduced_chi_sq = refine.chi_sq() / T::from(dof).unwrap();
        TransientRecord {
            rapid_estimate: estimate,
            refined_params: scratch.params.clone(),
            reduced_chi_sq,
            fitted: requests.fitted.then(|| scratch.fitted.clone()),
            rapid_fitted,
            status: TransientStatus { rapid, refine },
        }
    }
}
