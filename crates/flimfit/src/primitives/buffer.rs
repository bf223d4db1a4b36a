//! Per-transient working memory for the two-stage fit.
//!
//! ## Purpose
//!
//! This module provides the scratch buffers a single transient's fit needs:
//! the fitted curve, the residual curve, the parameter vector, and the three
//! square matrices the iterative refiner contract requires (covariance,
//! curvature, and confidence error axes).
//!
//! ## Design notes
//!
//! * **Per-transient ownership**: One `TransientScratch` is allocated fresh
//!   for each transient and dropped when its results have been collected, so
//!   no state can leak between independent fits and release is guaranteed on
//!   every exit path, including engine failure.
//! * **Window-sized matrices**: The square matrices are dimensioned by the
//!   fit window, matching the refiner contract; the refiner itself touches
//!   only the leading `p x p` block.
//!
//! ## Non-goals
//!
//! * Buffer recycling across transients. Each transient's fit must start
//!   from cleared state, and the per-fit allocation cost is dominated by the
//!   iterative refinement itself.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// ============================================================================
// Square Scratch Matrix
// ============================================================================

/// Dense square matrix with row-major storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix<T> {
    data: Vec<T>,
    dim: usize,
}

impl<T: Float> SquareMatrix<T> {
    /// Allocate a zero-filled `dim` x `dim` matrix.
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![T::zero(); dim * dim],
            dim,
        }
    }

    /// Matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (`row`, `col`).
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> T {
        self.data[row * self.dim + col]
    }

    /// Set element at (`row`, `col`).
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.dim + col] = value;
    }

    /// Reset every element to zero.
    pub fn clear(&mut self) {
        for v in self.data.iter_mut() {
            *v = T::zero();
        }
    }
}

// ============================================================================
// Transient Scratch
// ============================================================================

/// Working memory for one transient's two-stage fit.
#[derive(Debug, Clone)]
pub struct TransientScratch<T> {
    /// Fitted curve, full transient length; zero outside the fit window.
    pub fitted: Vec<T>,

    /// Residual curve (data - fitted), full transient length.
    pub residuals: Vec<T>,

    /// Model parameter vector, length `p` for the selected model.
    pub params: Vec<T>,

    /// Covariance scratch matrix (window-sized; leading `p x p` block used).
    pub covar: SquareMatrix<T>,

    /// Curvature (alpha) scratch matrix.
    pub alpha: SquareMatrix<T>,

    /// Confidence error-axes scratch matrix.
    pub err_axes: SquareMatrix<T>,
}

impl<T: Float> TransientScratch<T> {
    /// Allocate cleared scratch for a transient of `n` bins, a model with
    /// `n_param` parameters, and a fit window of `window` bins.
    pub fn new(n: usize, n_param: usize, window: usize) -> Self {
        Self {
            fitted: vec![T::zero(); n],
            residuals: vec![T::zero(); n],
            params: vec![T::zero(); n_param],
            covar: SquareMatrix::zeros(window),
            alpha: SquareMatrix::zeros(window),
            err_axes: SquareMatrix::zeros(window),
        }
    }

    /// Reset the curve buffers between the rapid and refine stages.
    pub fn clear_curves(&mut self) {
        for v in self.fitted.iter_mut() {
            *v = T::zero();
        }
        for v in self.residuals.iter_mut() {
            *v = T::zero();
        }
    }
}
