//! Persisted record schemas for the model release pipeline
//!
//! This module defines the records written to and read from durable storage:
//! per-version evaluation metrics, append-only promotion decisions, and
//! backup bookkeeping.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Evaluation metrics attached to a model version at creation
///
/// Written once as the version's `metrics.json` sidecar and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Version the metrics belong to
    pub version_id: u32,

    /// Held-out test accuracy in percent, within [0, 100]
    pub test_accuracy_percent: f64,

    /// Held-out test loss, non-negative
    pub test_loss: f64,

    /// When the evaluation completed (UTC)
    pub timestamp: DateTime<Utc>,

    /// Number of samples in the dataset
    pub sample_count: u64,

    /// Number of features per sample
    pub feature_count: u64,
}

/// Outcome of the accuracy gate for a candidate version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateDecision {
    /// Candidate meets the gate and becomes the new current version
    Promote,
    /// Candidate fails the gate and is removed
    Reject,
}

impl GateDecision {
    /// Returns true if the decision promotes the candidate
    pub fn is_promote(&self) -> bool {
        matches!(self, GateDecision::Promote)
    }

    /// Returns true if the decision rejects the candidate
    pub fn is_reject(&self) -> bool {
        matches!(self, GateDecision::Reject)
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateDecision::Promote => write!(f, "PROMOTE"),
            GateDecision::Reject => write!(f, "REJECT"),
        }
    }
}

/// One entry of the append-only promotion log
///
/// Exactly one record is produced per completed pipeline run; a run that
/// fails before its gate decision produces none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionRecord {
    /// Version that was current before the run, if any
    pub from_version: Option<u32>,

    /// Candidate version the run decided on
    pub to_version: u32,

    /// Gate decision for the candidate
    pub decision: GateDecision,

    /// Human-readable reason, e.g. "60.00 < 97.00" on rejection
    pub reason: String,

    /// When the decision was recorded (UTC)
    pub timestamp: DateTime<Utc>,
}

/// Bookkeeping for a point-in-time copy of a version's artifact
///
/// Created immediately before a promotion supersedes a previously-current
/// version. Retention of backups is outside the pipeline's scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    /// Version the backup was taken from
    pub source_version: u32,

    /// Timestamp-derived identifier, e.g. `model_v3_20260824T101500Z`
    pub backup_id: String,

    /// Where the copy lives
    pub location: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_decision_serializes_screaming() {
        let json = serde_json::to_string(&GateDecision::Promote).unwrap();
        assert_eq!(json, "\"PROMOTE\"");
        let json = serde_json::to_string(&GateDecision::Reject).unwrap();
        assert_eq!(json, "\"REJECT\"");
    }

    #[test]
    fn test_promotion_record_round_trip() {
        let record = PromotionRecord {
            from_version: None,
            to_version: 1,
            decision: GateDecision::Promote,
            reason: "98.00 >= 97.00".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: PromotionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert!(json.contains("\"from_version\":null"));
    }

    #[test]
    fn test_metrics_parses_sidecar_shape() {
        let json = r#"{
            "version_id": 4,
            "test_accuracy_percent": 97.5,
            "test_loss": 0.12,
            "timestamp": "2026-08-24T10:15:00Z",
            "sample_count": 1000,
            "feature_count": 2
        }"#;
        let metrics: Metrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.version_id, 4);
        assert_eq!(metrics.feature_count, 2);
        assert!((metrics.test_accuracy_percent - 97.5).abs() < f64::EPSILON);
    }
}
