//! Parallel execution engine for batch decay fitting.
//!
//! ## Purpose
//!
//! This module provides the parallel batch pass: the per-transient two-stage
//! fit chain from the `flimfit` crate, driven over the batch by a `rayon`
//! work-stealing pool instead of the core crate's sequential loop.
//!
//! ## Design notes
//!
//! * **Task isolation**: Transients are independent — each task gets its
//!   own scratch set from `FitExecutor::fit_transient`, broadcast inputs
//!   are shared read-only, and every task produces a record for its own
//!   transient index only.
//! * **Identical results**: The parallel pass runs exactly the sequential
//!   per-transient code path, so outputs match the core crate bit for bit.
//! * **Ordered assembly**: Records are collected in batch order and written
//!   into the output tables sequentially; output columns stay aligned with
//!   input columns.
//!
//! ## Non-goals
//!
//! * This module does not validate inputs (handled by `flimfit`'s
//!   validator).
//! * This module does not implement the fit stages (handled by `flimfit`'s
//!   executor and engines).

// External dependencies
use num_traits::Float;
use rayon::prelude::*;

// Export dependencies from flimfit crate
use flimfit::internals::engine::executor::FitExecutor;
use flimfit::internals::engine::output::{BatchFitOutput, OutputRequests, TransientRecord};
use flimfit::internals::engine::validator::BatchDescriptor;

// ============================================================================
// Parallel Batch Pass
// ============================================================================

/// Fit every transient of a validated batch in parallel.
pub fn fit_batch_parallel<T>(
    descriptor: &BatchDescriptor<'_, T>,
    requests: OutputRequests,
) -> BatchFitOutput<T>
where
    T: Float + Send + Sync,
{
    let records: Vec<TransientRecord<T>> = (0..descriptor.transient_count())
        .into_par_iter()
        .map(|index| FitExecutor::fit_transient(descriptor, index, requests))
        .collect();

    let mut output = BatchFitOutput::allocate(
        descriptor.model,
        descriptor.transient_len(),
        descriptor.transient_count(),
        requests,
    );
    for (index, record) in records.into_iter().enumerate() {
        output.write_record(index, record);
    }
    output
}
