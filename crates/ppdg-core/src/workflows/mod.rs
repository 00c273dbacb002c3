//! High-level entry points of the pipeline.
//!
//! - [`descriptors`] — build models, compute the missing descriptors, merge
//!   them into the cache, and aggregate per-model values.
//! - [`predict`] — evaluate a regression bundle end-to-end into one scalar.
//! - [`clean`] — remove regenerable intermediates from a working tree.

pub mod clean;
pub mod descriptors;
pub mod predict;
