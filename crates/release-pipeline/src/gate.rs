//! Accuracy gate evaluation
//!
//! The gate is a pure function and never fails; a malformed threshold is
//! caught at configuration load time, not here.

use config::GateConfig;

use common::records::GateDecision;

/// Decides promote vs. reject for a candidate's accuracy metric
///
/// The gate is inclusive: a metric exactly equal to the threshold promotes.
pub fn decide(test_accuracy_percent: f64, gate: &GateConfig) -> GateDecision {
    if test_accuracy_percent >= gate.min_accuracy_percent {
        GateDecision::Promote
    } else {
        GateDecision::Reject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(threshold: f64) -> GateConfig {
        GateConfig {
            min_accuracy_percent: threshold,
        }
    }

    #[test]
    fn test_above_threshold_promotes() {
        assert_eq!(decide(98.0, &gate(97.0)), GateDecision::Promote);
    }

    #[test]
    fn test_below_threshold_rejects() {
        assert_eq!(decide(60.0, &gate(97.0)), GateDecision::Reject);
    }

    #[test]
    fn test_equality_counts_as_pass() {
        assert_eq!(decide(97.0, &gate(97.0)), GateDecision::Promote);
        assert_eq!(decide(0.0, &gate(0.0)), GateDecision::Promote);
        assert_eq!(decide(100.0, &gate(100.0)), GateDecision::Promote);
    }

    #[test]
    fn test_just_below_threshold_rejects() {
        assert_eq!(decide(96.999, &gate(97.0)), GateDecision::Reject);
    }
}
