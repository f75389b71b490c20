//! Shared utilities for depsmith.
//!
//! This crate provides cross-cutting concerns used by all other depsmith crates:
//! the unified error type, filesystem helpers, SHA-256 hashing, and
//! Cargo-style status lines on stderr.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod progress;
