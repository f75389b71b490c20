//! File conflict resolution engine: per-target conflict groups decided by an
//! ordered tie-break pipeline, runtime manifests, and manifest validation.

pub mod conflict;
pub mod manifest;
pub mod policy;
pub mod resolver;
pub mod validate;
