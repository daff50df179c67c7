//! HTTP client for the model serving collaborator
//!
//! The serving collaborator exposes REST-style prediction endpoints with
//! JSON bodies: `{"instances": [[...], ...]}` in, `{"predictions": [[...],
//! ...]}` out. When no version is given it serves the highest existing
//! version id; per-version access uses a version path qualifier.

pub mod client;

// Re-export commonly used types
pub use client::{ModelServerClient, PredictionBackend};
