//! Common types and utilities for the model release pipeline
//!
//! This crate provides shared functionality used across the release pipeline,
//! including error types, persisted record schemas, and utility functions.

pub mod error;
pub mod records;
pub mod utils;

// Re-export commonly used types
pub use error::{CanarySide, Error, Result};
pub use records::*;
