//! Run state for a single pipeline invocation
//!
//! Each run walks Start → Trained → Evaluated → {Promoted | Rejected} →
//! Done; Failed is terminal and reachable from any non-terminal state.

use std::fmt;

/// State of one release pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    /// Run has started, nothing trained yet
    Start,

    /// Trainer returned an artifact and metric
    Trained,

    /// Candidate persisted with metrics, gate decision pending
    Evaluated,

    /// Candidate promoted to current
    Promoted,

    /// Candidate rejected and removed
    Rejected,

    /// Run completed and its decision is recorded
    Done,

    /// Run aborted on an unrecoverable error
    Failed(String),
}

impl RunState {
    /// Returns true if the run can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed(_))
    }

    /// Returns true if the run failed
    pub fn is_failed(&self) -> bool {
        matches!(self, RunState::Failed(_))
    }

    /// Gets the failure message if the run failed
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            RunState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Start => write!(f, "Start"),
            RunState::Trained => write!(f, "Trained"),
            RunState::Evaluated => write!(f, "Evaluated"),
            RunState::Promoted => write!(f, "Promoted"),
            RunState::Rejected => write!(f, "Rejected"),
            RunState::Done => write!(f, "Done"),
            RunState::Failed(msg) => write!(f, "Failed: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!RunState::Start.is_terminal());
        assert!(!RunState::Trained.is_terminal());
        assert!(!RunState::Evaluated.is_terminal());
        assert!(!RunState::Promoted.is_terminal());
        assert!(!RunState::Rejected.is_terminal());
        assert!(RunState::Done.is_terminal());
        assert!(RunState::Failed("backup failed".to_string()).is_terminal());
    }

    #[test]
    fn test_failure_message() {
        let failed = RunState::Failed("training timed out".to_string());
        assert!(failed.is_failed());
        assert_eq!(failed.failure_message(), Some("training timed out"));
        assert_eq!(RunState::Done.failure_message(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(RunState::Evaluated.to_string(), "Evaluated");
        assert_eq!(
            RunState::Failed("boom".to_string()).to_string(),
            "Failed: boom"
        );
    }
}
