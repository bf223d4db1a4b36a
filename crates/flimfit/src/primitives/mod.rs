//! Layer 1: Primitives
//!
//! # Purpose
//!
//! Data structures and basic utilities shared by every higher layer:
//! error types, matrix views over curve batches, broadcast accessors,
//! and per-transient scratch buffers.

/// Broadcast accessors for singleton-or-per-transient inputs.
pub mod broadcast;

/// Per-transient working memory.
pub mod buffer;

/// Error types for batch decay fitting.
pub mod errors;

/// Column-major matrix views and tables.
pub mod matrix;
