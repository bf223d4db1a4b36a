//! Dense column-major matrix views and tables for curve batches.
//!
//! ## Purpose
//!
//! This module provides the two matrix shapes used throughout batch fitting:
//! a borrowed, read-only view over caller-owned curve data ([`CurveMatrix`])
//! and an owned, writable table for batch-shaped outputs ([`CurveTable`]).
//!
//! ## Design notes
//!
//! * **Column-major**: Columns are curves (transients, prompts, sigmas) and
//!   rows are time bins, so one curve is one contiguous slice.
//! * **Zero-copy input**: `CurveMatrix` never copies; the caller keeps
//!   ownership of the data for the lifetime of the fit.
//! * **Early shape check**: Construction rejects ragged buffers so the
//!   validator can reason about whole columns only.
//!
//! ## Invariants
//!
//! * `data.len() == rows * cols` for both shapes.
//! * `rows >= 1`; a zero-column matrix is representable but rejected by the
//!   batch validator.
//!
//! ## Non-goals
//!
//! * This module does not validate curve contents (finiteness, ranges).
//! * This module does not provide linear algebra; see `algorithms::solve`.

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
// Borrowed Curve Matrix
// ============================================================================

/// Read-only column-major view over a dense batch of curves.
///
/// Rows are time bins, columns are curves. Constructed from a flat slice so
/// callers can hand over data from any dense numeric container.
#[derive(Debug, Clone, Copy)]
pub struct CurveMatrix<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
}

impl<'a, T> CurveMatrix<'a, T> {
    /// Create a view over `data` with `rows` time bins per curve.
    ///
    /// Fails if `rows` is zero or `data` does not divide into whole columns.
    pub fn from_flat(data: &'a [T], rows: usize) -> Result<Self, FlimError> {
        if rows == 0 || data.len() % rows != 0 {
            return Err(FlimError::RaggedMatrix {
                len: data.len(),
                rows,
            });
        }
        Ok(Self {
            data,
            rows,
            cols: data.len() / rows,
        })
    }

    /// Number of time bins per curve.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of curves in the batch.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow curve `c` as a contiguous slice of `rows` samples.
    #[inline]
    pub fn column(&self, c: usize) -> &'a [T] {
        let base = c * self.rows;
        &self.data[base..base + self.rows]
    }

    /// The underlying flat column-major slice.
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }
}

// ============================================================================
// Owned Curve Table
// ============================================================================

/// Owned column-major table used for batch-shaped fit outputs.
///
/// Same layout as [`CurveMatrix`], but writable; the result assembler fills
/// one column per transient, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveTable<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Float> CurveTable<T> {
    /// Allocate a zero-filled table of `rows` x `cols`.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![T::zero(); rows * cols],
            rows,
            cols,
        }
    }

    /// Number of rows (parameter slots or time bins).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (transients).
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow column `c`.
    #[inline]
    pub fn column(&self, c: usize) -> &[T] {
        let base = c * self.rows;
        &self.data[base..base + self.rows]
    }

    /// Mutably borrow column `c`.
    #[inline]
    pub fn column_mut(&mut self, c: usize) -> &mut [T] {
        let base = c * self.rows;
        &mut self.data[base..base + self.rows]
    }

    /// The flat column-major contents.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }
}
