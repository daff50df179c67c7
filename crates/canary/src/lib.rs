//! Side-by-side drift comparison of two served model versions
//!
//! The canary comparator issues one identical input batch against two
//! version-pinned prediction endpoints and reduces the outputs to a single
//! drift statistic. It is a read-only diagnostic: it never mutates version
//! state and runs independently of release pipeline invocations.

pub mod comparator;

// Re-export commonly used types
pub use comparator::{CanaryComparator, CanaryReport};
