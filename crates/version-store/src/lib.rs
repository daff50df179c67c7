//! On-disk model version layout and metadata bookkeeping
//!
//! This crate manages the versioned storage layout consumed by the serving
//! collaborator: one subdirectory per version (decimal id) under a base
//! directory, each holding the model artifact and a `metrics.json` sidecar.
//! It is pure bookkeeping with no ML logic.

pub mod candidate;
pub mod store;

// Re-export commonly used types
pub use candidate::CandidateGuard;
pub use store::{VersionStore, METRICS_FILE};
