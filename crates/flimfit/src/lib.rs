//! # flimfit — Batch Fluorescence-Decay Curve Fitting for Rust
//!
//! Batch fitting of time-resolved fluorescence transients (FLIM): every
//! curve in a batch gets a rapid triple-integral estimate whose result seeds
//! a Levenberg-Marquardt refinement, producing per-transient decay
//! parameters and goodness-of-fit statistics.
//!
//! ## How a batch fit works
//!
//! A batch is a dense column-major matrix of transients (rows are time bins,
//! columns are curves) plus a reference ("prompt") curve batch, time-bin
//! increments, and optionally per-bin noise standard deviations. The prompt,
//! sigma, and time-increment inputs *broadcast*: each may be supplied once
//! for the whole batch or once per transient. Each transient is then fit in
//! two stages:
//!
//! 1. **Rapid estimate** — a closed-form triple-integral fit yields an
//!    initial (offset, amplitude, lifetime) triple.
//! 2. **Refinement** — the selected decay model (single, double, or triple
//!    exponential, or stretched exponential) is seeded from that triple and
//!    refined by weighted nonlinear least squares until the relative
//!    chi-square improvement drops below `chi_sq_delta`.
//!
//! ## Quick Start
//!
//! ```rust
//! use flimfit::prelude::*;
//!
//! // One synthetic transient: z + a * exp(-t / tau) over 64 bins.
//! let (z, a, tau, dt) = (10.0_f32, 1000.0, 2.0, 0.05);
//! let transient: Vec<f32> = (0..64)
//!     .map(|i| z + a * (-(i as f32) * dt / tau).exp())
//!     .collect();
//! // A narrow two-point prompt, normalized to unit area.
//! let prompt = vec![0.5_f32, 0.5];
//!
//! let transients = CurveMatrix::from_flat(&transient, 64)?;
//! let prompts = CurveMatrix::from_flat(&prompt, 2)?;
//!
//! let fitter = FlimFit::new()
//!     .model(DecayModel::SingleExp)
//!     .return_rapid_params()
//!     .build()?;
//! let output = fitter.fit(&transients, &prompts, &[dt], None)?;
//!
//! // Refined parameters are (p + 1) x N; the last row is the reduced
//! // chi-square.
//! assert_eq!(output.refined.rows(), 4);
//! assert_eq!(output.transient_count(), 1);
//! # Result::<(), FlimError>::Ok(())
//! ```
//!
//! ## Result and Error Handling
//!
//! `fit` returns `Result<BatchFitOutput<T>, FlimError>`. A `FlimError` means
//! the batch was malformed and nothing was fit; it names the violated
//! constraint and the offending value. Per-transient engine trouble is *not*
//! an error: the batch continues, the affected output column carries the
//! engine's last state, and the transient's
//! [`TransientStatus`](prelude::TransientStatus) records a tagged outcome so
//! callers can tell a converged fit from a degenerate one.
//!
//! ## Precision
//!
//! The API is generic over `num_traits::Float`. The numerical engines are
//! comfortable in single precision — `f32` matches common FLIM acquisition
//! depth and halves memory traffic — while `f64` is available where the
//! host data is already double.
//!
//! ## Minimal Usage (no_std)
//!
//! The crate supports `no_std` environments (an allocator is required).
//! Disable default features to remove the standard library dependency:
//!
//! ```toml
//! [dependencies]
//! flimfit = { version = "0.1", default-features = false }
//! ```
//!
//! ## References
//!
//! - Sharman, K. K., et al. (1999). "Error analysis of the rapid lifetime
//!   determination method for double-exponential decays"
//! - Marquardt, D. W. (1963). "An Algorithm for Least-Squares Estimation of
//!   Nonlinear Parameters"

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
#[macro_use]
extern crate alloc;

// Layer 1: Primitives - data structures and basic utilities.
mod primitives;

// Layer 2: Math - pure mathematical functions.
mod math;

// Layer 3: Algorithms - the two numerical fit engines.
mod algorithms;

// Layer 4: Engine - orchestration and execution control.
mod engine;

// High-level fluent API for batch decay fitting.
mod api;

// Standard batch-fitting prelude.
pub mod prelude {
    pub use crate::api::{
        BatchFitOutput, CurveMatrix, CurveTable, DecayModel, EngineFailure, EngineOutcome,
        FlimError, FlimFitBuilder as FlimFit, FlimFitter, NoiseModel, OutputRequests,
        RapidEstimate, TransientStatus,
    };
}

// Internal modules for development and testing.
//
// This module re-exports internal modules for extension crates and
// white-box tests. It is only available with the `dev` feature enabled.
#[cfg(feature = "dev")]
pub mod internals {
    pub mod primitives {
        pub use crate::primitives::*;
    }
    pub mod math {
        pub use crate::math::*;
    }
    pub mod algorithms {
        pub use crate::algorithms::*;
    }
    pub mod engine {
        pub use crate::engine::*;
    }
    pub mod api {
        pub use crate::api::*;
    }
}
