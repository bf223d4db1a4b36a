//! Gauss-Jordan elimination for the refiner's normal equations.
//!
//! The systems here are tiny (at most 7 unknowns, one per model parameter),
//! so a dense Gauss-Jordan with row pivoting is both adequate and easy to
//! audit. Both routines operate on the leading `n x n` block of a possibly
//! larger scratch matrix, matching the window-sized matrices the refiner
//! contract hands over.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::buffer::SquareMatrix;

/// Solve `a * x = b` in place over the leading `n x n` block.
///
/// On success `b` holds the solution and `a` is reduced to the identity.
/// Returns `false` when a pivot vanishes or turns non-finite (singular or
/// overflowing system); contents are unspecified in that case.
pub fn solve_in_place<T: Float>(a: &mut SquareMatrix<T>, b: &mut [T], n: usize) -> bool {
    for col in 0..n {
        // Row pivoting on the largest remaining magnitude.
        let mut pivot_row = col;
        let mut pivot_mag = a.at(col, col).abs();
        for row in (col + 1)..n {
            let mag = a.at(row, col).abs();
            if mag > pivot_mag {
                pivot_mag = mag;
                pivot_row = row;
            }
        }
        if pivot_mag == T::zero() || !pivot_mag.is_finite() {
            return false;
        }
        if pivot_row != col {
            for k in 0..n {
                let tmp = a.at(col, k);
                a.set(col, k, a.at(pivot_row, k));
                a.set(pivot_row, k, tmp);
            }
            b.swap(col, pivot_row);
        }

        let inv = a.at(col, col).recip();
        for k in 0..n {
            a.set(col, k, a.at(col, k) * inv);
        }
        b[col] = b[col] * inv;

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a.at(row, col);
            if factor == T::zero() {
                continue;
            }
            for k in 0..n {
                a.set(row, k, a.at(row, k) - factor * a.at(col, k));
            }
            b[row] = b[row] - factor * b[col];
        }
    }
    true
}

/// Invert the leading `n x n` block of `a` into `out`.
///
/// Used to turn the final curvature matrix into a covariance estimate.
/// Returns `false` on a singular or non-finite pivot; `out` is unspecified
/// in that case.
pub fn invert<T: Float>(a: &SquareMatrix<T>, out: &mut SquareMatrix<T>, n: usize) -> bool {
    let mut work = a.clone();
    for row in 0..n {
        for col in 0..n {
            out.set(row, col, if row == col { T::one() } else { T::zero() });
        }
    }

    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_mag = work.at(col, col).abs();
        for row in (col + 1)..n {
            let mag = work.at(row, col).abs();
            if mag > pivot_mag {
                pivot_mag = mag;
                pivot_row = row;
            }
        }
        if pivot_mag == T::zero() || !pivot_mag.is_finite() {
            return false;
        }
        if pivot_row != col {
            for k in 0..n {
                let tmp = work.at(col, k);
                work.set(col, k, work.at(pivot_row, k));
                work.set(pivot_row, k, tmp);

                let tmp = out.at(col, k);
                out.set(col, k, out.at(pivot_row, k));
                out.set(pivot_row, k, tmp);
            }
        }

        let inv = work.at(col, col).recip();
        for k in 0..n {
            work.set(col, k, work.at(col, k) * inv);
            out.set(col, k, out.at(col, k) * inv);
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = work.at(row, col);
            if factor == T::zero() {
                continue;
            }
            for k in 0..n {
                work.set(row, k, work.at(row, k) - factor * work.at(col, k));
                out.set(row, k, out.at(row, k) - factor * out.at(col, k));
            }
        }
    }
    true
}
