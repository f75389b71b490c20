//! Core data types for depsmith.
//!
//! This crate defines the graph model the resolver works on: target
//! framework monikers, package versions, targets, packages and the files
//! they contribute, the per-target dependency graph, the assets file it is
//! loaded from, and resolver configuration.
//!
//! This crate is intentionally free of async code.

pub mod asset;
pub mod assets;
pub mod config;
pub mod framework;
pub mod graph;
pub mod package;
pub mod target;
pub mod version;
