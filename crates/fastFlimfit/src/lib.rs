//! # fastFlimfit — Parallel Batch Fluorescence-Decay Fitting
//!
//! A parallel companion to the [`flimfit`] crate: the same two-stage batch
//! fit (rapid triple-integral estimate, Levenberg-Marquardt refinement),
//! with the per-transient loop distributed over a `rayon` work-stealing
//! pool and an `ndarray`-shaped input surface.
//!
//! Transients in a batch are independent, so the parallel pass is exact:
//! every transient runs the same code path as the sequential core, with its
//! own private scratch buffers, and results land in the same output columns.
//!
//! ## Quick Start
//!
//! ```rust
//! use fastFlimfit::prelude::*;
//! use ndarray::Array2;
//!
//! // A batch of 8 identical synthetic transients over 64 bins.
//! let (z, a, tau, dt) = (10.0_f32, 1000.0, 2.0, 0.05);
//! let transients = Array2::from_shape_fn((64, 8), |(i, _)| {
//!     z + a * (-(i as f32) * dt / tau).exp()
//! });
//! // One shared two-point prompt, normalized to unit area.
//! let prompts = Array2::from_shape_vec((2, 1), vec![0.5_f32, 0.5]).unwrap();
//!
//! let fitter = FlimFit::new()
//!     .model(DecayModel::SingleExp)
//!     .parallel(true) // default
//!     .build()?;
//! let output = fitter.fit(&transients, &prompts, &[dt], None)?;
//!
//! assert_eq!(output.transient_count(), 8);
//! assert_eq!(output.refined.rows(), 4); // p + 1
//! # Result::<(), FlimError>::Ok(())
//! ```
//!
//! ## Sequential Fallback
//!
//! `.parallel(false)` runs the core crate's sequential loop instead; results
//! are identical either way.

#![allow(non_snake_case)]

// Input conversion for ndarray batches.
mod input;

// Parallel execution engine.
mod engine;

// High-level fluent API for parallel batch fitting.
mod api;

// Standard parallel batch-fitting prelude.
pub mod prelude {
    pub use crate::api::{FastFlimFitBuilder as FlimFit, FastFlimFitter};
    pub use flimfit::prelude::{
        BatchFitOutput, CurveMatrix, CurveTable, DecayModel, EngineFailure, EngineOutcome,
        FlimError, NoiseModel, OutputRequests, RapidEstimate, TransientStatus,
    };
}
