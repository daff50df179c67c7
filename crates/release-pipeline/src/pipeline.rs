//! Release pipeline orchestration
//!
//! One `run_once` drives a full release: discover the current version, train
//! a candidate, persist it, evaluate the gate, back up the current version
//! when promoting, and record exactly one promotion decision. A run that
//! fails before its gate decision records nothing and leaves the served
//! version set unchanged, except for the documented backup-failure case
//! where the trained candidate is kept but not treated as promoted.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use backup_manager::BackupManager;
use common::error::Result;
use common::records::{GateDecision, PromotionRecord};
use config::GateConfig;
use version_store::{CandidateGuard, VersionStore};

use crate::gate;
use crate::log::PromotionLog;
use crate::notify::NotificationSink;
use crate::state::RunState;
use crate::trainer::{TrainRequest, Trainer};

/// Orchestrates train → gate → promote/reject runs for one model
pub struct ReleasePipeline {
    /// Versioned artifact storage
    store: Arc<VersionStore>,

    /// Backup-before-replace copies
    backups: Arc<BackupManager>,

    /// Trainer collaborator
    trainer: Arc<dyn Trainer>,

    /// Append-only decision log
    log: Arc<dyn PromotionLog>,

    /// Best-effort notification delivery
    notifier: Arc<dyn NotificationSink>,

    /// Accuracy gate
    gate: GateConfig,

    /// Name the model is served under
    model_name: String,
}

impl ReleasePipeline {
    /// Creates a new release pipeline
    pub fn new(
        store: Arc<VersionStore>,
        backups: Arc<BackupManager>,
        trainer: Arc<dyn Trainer>,
        log: Arc<dyn PromotionLog>,
        notifier: Arc<dyn NotificationSink>,
        gate: GateConfig,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            backups,
            trainer,
            log,
            notifier,
            gate,
            model_name: model_name.into(),
        }
    }

    /// Executes one release run and returns its promotion decision
    ///
    /// After this returns `Ok`, either a new highest version exists and is
    /// servable (PROMOTE) or the version set is unchanged from before the
    /// call (REJECT). On `Err`, no decision was recorded; the candidate has
    /// been removed except after a backup failure, which preserves the
    /// training work without treating it as promoted.
    pub async fn run_once(&self, request: TrainRequest) -> Result<PromotionRecord> {
        let mut state = RunState::Start;
        info!("Starting release run for model '{}'", self.model_name);

        let current = self.store.current_version()?;
        debug!("Current version: {:?}", current);

        let trained = match self.trainer.train(&request).await {
            Ok(trained) => trained,
            Err(e) => {
                self.transition(&mut state, RunState::Failed(e.to_string()));
                self.notify(
                    &format!("[FAILED] {} training", self.model_name),
                    &e.to_string(),
                    false,
                )
                .await;
                return Err(e);
            }
        };
        self.transition(&mut state, RunState::Trained);

        let candidate = current.unwrap_or(0) + 1;
        self.store.install_version(candidate, trained.artifact_dir())?;

        // From here until the decision is recorded the candidate is
        // unvetted; the guard removes it on any path except promotion.
        let guard = CandidateGuard::new(&self.store, candidate);

        let mut metrics = trained.metrics.clone();
        metrics.version_id = candidate;
        self.store.write_metrics(candidate, &metrics)?;
        self.transition(&mut state, RunState::Evaluated);

        let accuracy = metrics.test_accuracy_percent;
        let threshold = self.gate.min_accuracy_percent;
        let decision = gate::decide(accuracy, &self.gate);

        match decision {
            GateDecision::Promote => {
                if let Some(current) = current {
                    if let Err(e) = self.backups.backup(current) {
                        // The candidate stays on disk so the training work
                        // is not lost, but the run is failed and no
                        // promotion is recorded.
                        guard.keep();
                        self.transition(&mut state, RunState::Failed(e.to_string()));
                        self.notify(
                            &format!("[FAILED] {} backup before promote", self.model_name),
                            &e.to_string(),
                            false,
                        )
                        .await;
                        return Err(e);
                    }
                }

                let record = PromotionRecord {
                    from_version: current,
                    to_version: candidate,
                    decision,
                    reason: format!("{:.2} >= {:.2}", accuracy, threshold),
                    timestamp: Utc::now(),
                };
                self.log.append(&record)?;
                guard.keep();

                self.transition(&mut state, RunState::Promoted);
                self.notify(
                    &format!("[PROMOTE] {} version {}", self.model_name, candidate),
                    &format!(
                        "version {} meets gate ({:.2}% >= {:.2}%).",
                        candidate, accuracy, threshold
                    ),
                    true,
                )
                .await;

                self.transition(&mut state, RunState::Done);
                Ok(record)
            }
            GateDecision::Reject => {
                // Undo the candidate so the serving collaborator's "highest
                // version" view reverts to the previous version.
                guard.discard()?;

                let record = PromotionRecord {
                    from_version: current,
                    to_version: candidate,
                    decision,
                    reason: format!("{:.2} < {:.2}", accuracy, threshold),
                    timestamp: Utc::now(),
                };
                self.log.append(&record)?;

                self.transition(&mut state, RunState::Rejected);
                let kept = match current {
                    Some(current) => format!("Keeping version {}.", current),
                    None => "No version is served.".to_string(),
                };
                self.notify(
                    &format!("[REJECT] {} version {}", self.model_name, candidate),
                    &format!(
                        "version {} fails gate ({:.2}% < {:.2}%). {}",
                        candidate, accuracy, threshold, kept
                    ),
                    false,
                )
                .await;

                self.transition(&mut state, RunState::Done);
                Ok(record)
            }
        }
    }

    /// Logs a run state transition
    fn transition(&self, state: &mut RunState, next: RunState) {
        debug!("Run state {} -> {}", state, next);
        *state = next;
    }

    /// Delivers a notification, logging failures instead of escalating
    async fn notify(&self, subject: &str, body: &str, success: bool) {
        if let Err(e) = self.notifier.notify(subject, body, success).await {
            warn!("Notification delivery failed: {}", e);
        }
    }
}
