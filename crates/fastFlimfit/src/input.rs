//! Input conversion for `ndarray`-shaped curve batches.
//!
//! ## Purpose
//!
//! This module bridges `ndarray` matrices into the column-major flat layout
//! the core crate's `CurveMatrix` expects, so callers can pass batches
//! straight from their numerical pipeline.
//!
//! ## Design notes
//!
//! * **Column convention**: Like the core crate, rows are time bins and
//!   columns are curves; `Array2` batches use the same orientation.
//! * **One copy at most**: `ndarray`'s default layout is row-major, so the
//!   batch is gathered column by column into a flat buffer once per fit
//!   call. The copy is linear in the batch size and negligible next to the
//!   fit itself.
//!
//! ## Non-goals
//!
//! * This module does not validate batch shapes (handled by `flimfit`'s
//!   validator).

// External dependencies
use ndarray::Array2;
use num_traits::Float;

/// Gather an `Array2` batch (rows = time bins, columns = curves) into a
/// column-major flat buffer.
pub fn to_column_major<T: Float>(batch: &Array2<T>) -> Vec<T> {
    let mut flat = Vec::with_capacity(batch.len());
    for column in batch.columns() {
        flat.extend(column.iter().copied());
    }
    flat
}
