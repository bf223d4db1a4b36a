//! Output types and result assembly for batch decay fitting.
//!
//! ## Purpose
//!
//! This module defines the batch-shaped output tables, the per-transient
//! status reporting, and the assembly logic that fills the tables in
//! transient order from per-transient fit records.
//!
//! ## Design notes
//!
//! * **Requested outputs only**: The rapid-parameter and fitted-curve tables
//!   are allocated (and their curve copies made) only when requested; the
//!   refined-parameter table and the status vector are always produced.
//! * **Table shapes**: Refined parameters are `(p + 1) x N` with the reduced
//!   chi-square in the last row; rapid parameters `3 x N`; fitted curves
//!   `n x N`, zero outside the fit window.
//! * **Status runs alongside**: Engine failures never alter the numeric
//!   tables' shape; callers who care inspect the per-transient statuses.
//!
//! ## Invariants
//!
//! * Tables are filled in transient order; column `i` always belongs to
//!   input transient `i`.
//! * `statuses.len()` equals the transient count after assembly.
//!
//! ## Non-goals
//!
//! * This module does not perform fits; it only stores and shapes results.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::fmt::{Display, Formatter, Result};
use num_traits::Float;

// Internal dependencies
use crate::algorithms::rapid::RapidEstimate;
use crate::algorithms::EngineOutcome;
use crate::math::decay::DecayModel;
use crate::primitives::matrix::CurveTable;

// ============================================================================
// Output Requests
// ============================================================================

/// Which optional outputs the caller asked for.
///
/// Refined parameters and per-transient statuses are always produced; both
/// engines always run regardless, since refined parameters depend on the
/// rapid seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputRequests {
    /// Produce the `3 x N` rapid-estimate parameter table.
    pub rapid_params: bool,

    /// Produce the `n x N` refined fitted-curve table.
    pub fitted: bool,

    /// Produce the `n x N` rapid-estimate fitted-curve table.
    pub rapid_fitted: bool,
}

// ============================================================================
// Per-Transient Status
// ============================================================================

/// Tagged outcome of both fit stages for one transient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransientStatus<T> {
    /// Outcome of the rapid triple-integral stage.
    pub rapid: EngineOutcome<T>,

    /// Outcome of the iterative refinement stage.
    pub refine: EngineOutcome<T>,
}

impl<T: Copy> TransientStatus<T> {
    /// True when the refinement stage reached its chi-square target.
    #[inline]
    pub fn is_converged(&self) -> bool {
        self.refine.is_converged()
    }
}

// ============================================================================
// Per-Transient Record
// ============================================================================

/// One transient's complete fit results, handed from the executor to the
/// assembler.
#[derive(Debug, Clone)]
pub struct TransientRecord<T> {
    /// Rapid (offset, amplitude, lifetime) estimate.
    pub rapid_estimate: RapidEstimate<T>,

    /// Refined parameter vector, length `p`.
    pub refined_params: Vec<T>,

    /// Reduced chi-square of the refined fit.
    pub reduced_chi_sq: T,

    /// Refined fitted curve, present when requested.
    pub fitted: Option<Vec<T>>,

    /// Rapid-estimate fitted curve, present when requested.
    pub rapid_fitted: Option<Vec<T>>,

    /// Outcome of both stages.
    pub status: TransientStatus<T>,
}

// ============================================================================
// Batch Output
// ============================================================================

/// Batch-shaped results of a whole fit run.
#[derive(Debug, Clone)]
pub struct BatchFitOutput<T> {
    /// Refined parameters, `(p + 1) x N`; last row is the reduced
    /// chi-square.
    pub refined: CurveTable<T>,

    /// Rapid-estimate parameters, `3 x N` (rows: offset, amplitude,
    /// lifetime), when requested.
    pub rapid: Option<CurveTable<T>>,

    /// Refined fitted curves, `n x N`, when requested.
    pub fitted: Option<CurveTable<T>>,

    /// Rapid-estimate fitted curves, `n x N`, when requested.
    pub rapid_fitted: Option<CurveTable<T>>,

    /// Per-transient engine outcomes, in batch order.
    pub statuses: Vec<TransientStatus<T>>,

    /// Decay model the batch was fit with.
    pub model: DecayModel,
}

impl<T: Float> BatchFitOutput<T> {
    /// Allocate the requested tables for a batch of `transients` curves of
    /// `transient_len` bins each.
    pub fn allocate(
        model: DecayModel,
        transient_len: usize,
        transients: usize,
        requests: OutputRequests,
    ) -> Self {
        let p = model.param_count();
        Self {
            refined: CurveTable::zeros(p + 1, transients),
            rapid: requests
                .rapid_params
                .then(|| CurveTable::zeros(3, transients)),
            fitted: requests
                .fitted
                .then(|| CurveTable::zeros(transient_len, transients)),
            rapid_fitted: requests
                .rapid_fitted
                .then(|| CurveTable::zeros(transient_len, transients)),
            statuses: Vec::with_capacity(transients),
            model,
        }
    }

    /// Fill column `index` of every table from one transient's record.
    ///
    /// Records must be written in batch order.
    pub fn write_record(&mut self, index: usize, record: TransientRecord<T>) {
        debug_assert_eq!(self.statuses.len(), index);

        let p = self.model.param_count();
        let column = self.refined.column_mut(index);
        column[..p].copy_from_slice(&record.refined_params);
        column[p] = record.reduced_chi_sq;

        if let Some(table) = self.rapid.as_mut() {
            let column = table.column_mut(index);
            column[0] = record.rapid_estimate.offset;
            column[1] = record.rapid_estimate.amplitude;
            column[2] = record.rapid_estimate.lifetime;
        }
        if let (Some(table), Some(curve)) = (self.fitted.as_mut(), record.fitted.as_ref()) {
            table.column_mut(index).copy_from_slice(curve);
        }
        if let (Some(table), Some(curve)) = (self.rapid_fitted.as_mut(), record.rapid_fitted.as_ref())
        {
            table.column_mut(index).copy_from_slice(curve);
        }

        self.statuses.push(record.status);
    }

    // ========================================================================
    // Query Methods
    // ========================================================================

    /// Number of free parameters of the batch's model.
    #[inline]
    pub fn param_count(&self) -> usize {
        self.model.param_count()
    }

    /// Number of transients in the batch.
    #[inline]
    pub fn transient_count(&self) -> usize {
        self.refined.cols()
    }

    /// Refined parameter vector of transient `i` (without the chi-square
    /// row).
    pub fn refined_params(&self, i: usize) -> &[T] {
        &self.refined.column(i)[..self.param_count()]
    }

    /// Reduced chi-square of transient `i`.
    pub fn reduced_chi_sq(&self, i: usize) -> T {
        self.refined.column(i)[self.param_count()]
    }

    /// Status of transient `i`.
    pub fn status(&self, i: usize) -> &TransientStatus<T> {
        &self.statuses[i]
    }

    /// Number of transients whose refinement reached the chi-square target.
    pub fn converged_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_converged()).count()
    }

    /// True when every transient's refinement reached its target.
    pub fn all_converged(&self) -> bool {
        self.statuses.iter().all(|s| s.is_converged())
    }
}

// ============================================================================
// Display Implementation
// ============================================================================

impl<T: Float + Display> Display for BatchFitOutput<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Batch fit summary:")?;
        writeln!(f, "  Transients: {}", self.transient_count())?;
        writeln!(f, "  Model parameters: {}", self.param_count())?;
        writeln!(
            f,
            "  Converged: {}/{}",
            self.converged_count(),
            self.transient_count()
        )?;
        Ok(())
    }
}
