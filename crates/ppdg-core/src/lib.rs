//! # PPDG Core Library
//!
//! A pipeline for computing structural descriptors of protein-protein complexes.
//! Atomistic models of a complex are built by external tools (Modeller for homology
//! modelling, CHARMM for preparation and minimization, the RF-Score suite for
//! statistical potentials); this crate owns everything around those tools: the
//! descriptor cache, the wanted-vs-have work list, the bounded parallel fan-out
//! over model indices, aggregation of per-model values, and a linear-regression
//! prediction step over the aggregates.
//!
//! ## Architecture
//!
//! - **[`config`]**: process settings (tool paths, working directory) read from an
//!   INI file into an explicit [`config::Settings`] struct that is passed to every
//!   operation.
//! - **[`store`]**: the JSON-backed descriptor cache (`descriptors.json`) and the
//!   transposition between its on-disk "by descriptor" and in-memory "by model"
//!   layouts.
//! - **[`makemodel`]**: wrappers around the external model construction and
//!   minimization tools, with recycle-if-present semantics.
//! - **[`scoring`]**: the descriptor catalog and the group dispatch that computes
//!   only unmet descriptors, behind a [`scoring::Scorer`] trait seam.
//! - **[`workflows`]**: the public entry points — descriptor computation and
//!   averaging, regression-bundle prediction, and intermediate-file cleanup.

pub mod config;
pub mod makemodel;
pub mod progress;
pub mod scoring;
pub mod store;
pub mod types;
pub mod workflows;
