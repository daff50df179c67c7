//! Error types for the model release pipeline
//!
//! This module defines the failure taxonomy shared across the release
//! pipeline crates. Callers can distinguish an expected gate rejection (a
//! business outcome, not an error) from operational failures such as a
//! missing backup source or an unreachable store.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for release pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a canary comparison failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanarySide {
    /// The first (baseline) version of the comparison
    VersionA,
    /// The second (candidate) version of the comparison
    VersionB,
}

impl fmt::Display for CanarySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanarySide::VersionA => write!(f, "version A"),
            CanarySide::VersionB => write!(f, "version B"),
        }
    }
}

/// Common error type for release pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gate threshold outside the valid [0, 100] range
    #[error("Gate misconfigured: {0}")]
    GateMisconfigured(String),

    /// The version store base location cannot be read or written
    #[error("Store unavailable at {path}: {source}")]
    StoreUnavailable {
        /// Base location that failed
        path: PathBuf,
        /// Underlying filesystem error
        #[source]
        source: std::io::Error,
    },

    /// A version exists but its metrics sidecar does not
    #[error("Metrics missing for version {version}")]
    MetricsMissing {
        /// Version whose metrics record is absent
        version: u32,
    },

    /// The trainer collaborator failed or timed out
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// A backup could not be taken for a version
    #[error("Backup failed for version {version}: {reason}")]
    BackupFailed {
        /// Version that was being backed up
        version: u32,
        /// What went wrong
        reason: String,
    },

    /// One side of a canary comparison failed or returned no predictions
    #[error("Canary unavailable ({side}): {reason}")]
    CanaryUnavailable {
        /// Which side failed
        side: CanarySide,
        /// What went wrong
        reason: String,
    },

    /// Canary prediction outputs flatten to different lengths
    #[error("Prediction shape mismatch: {left} values vs {right} values")]
    ShapeMismatch {
        /// Flattened element count from version A
        left: usize,
        /// Flattened element count from version B
        right: usize,
    },

    /// External service error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Returns true if the error is a store availability error
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable { .. })
    }

    /// Returns true if the error is a missing metrics error
    pub fn is_metrics_missing(&self) -> bool {
        matches!(self, Error::MetricsMissing { .. })
    }

    /// Returns true if the error is a training failure
    pub fn is_training_failed(&self) -> bool {
        matches!(self, Error::TrainingFailed(_))
    }

    /// Returns true if the error is a backup failure
    pub fn is_backup_failed(&self) -> bool {
        matches!(self, Error::BackupFailed { .. })
    }

    /// Returns true if the error is a canary availability error
    pub fn is_canary_unavailable(&self) -> bool {
        matches!(self, Error::CanaryUnavailable { .. })
    }

    /// Returns true if the error is a shape mismatch
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Error::ShapeMismatch { .. })
    }

    /// Returns true if the error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        let err = Error::MetricsMissing { version: 3 };
        assert!(err.is_metrics_missing());
        assert!(!err.is_training_failed());

        let err = Error::BackupFailed {
            version: 2,
            reason: "source missing".to_string(),
        };
        assert!(err.is_backup_failed());
        assert!(!err.is_shape_mismatch());
    }

    #[test]
    fn test_display_names_versions() {
        let err = Error::BackupFailed {
            version: 7,
            reason: "copy interrupted".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backup failed for version 7: copy interrupted"
        );

        let err = Error::CanaryUnavailable {
            side: CanarySide::VersionB,
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Canary unavailable (version B): connection refused"
        );
    }
}
