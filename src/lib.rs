//! Main integration module for the model release pipeline
//!
//! This module wires the pipeline components together from a loaded
//! configuration and provides the entry points the CLI drives: release
//! runs, canary comparisons, version listing, serving status, and orphan
//! reconciliation.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use backup_manager::BackupManager;
use canary::{CanaryComparator, CanaryReport};
use common::records::PromotionRecord;
use config::PipelineConfig;
use release_pipeline::{
    recovery, CommandTrainer, FileNotifier, FilePromotionLog, ReleasePipeline, TrainRequest,
};
use serving_client::{ModelServerClient, PredictionBackend};
use version_store::VersionStore;

/// Main model releaser
pub struct ModelReleaser {
    /// Loaded configuration
    config: PipelineConfig,

    /// Versioned artifact storage
    store: Arc<VersionStore>,

    /// Append-only promotion log
    log: Arc<FilePromotionLog>,

    /// Release pipeline
    pipeline: ReleasePipeline,

    /// Model server client
    serving: Arc<ModelServerClient>,

    /// Canary comparator
    comparator: CanaryComparator,
}

impl ModelReleaser {
    /// Creates a new model releaser from a loaded configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        // Initialize logging
        Self::init_logging();

        info!(
            "Initializing model releaser for '{}' (base {:?})",
            config.model_name, config.model_base_path
        );

        let store = Arc::new(VersionStore::open(&config.model_base_path)?);

        let backups = Arc::new(BackupManager::new(
            &config.model_base_path,
            &config.backup_path,
        ));

        let trainer = Arc::new(CommandTrainer::new(config.trainer.command.clone()));
        let log = Arc::new(FilePromotionLog::new(&config.promotion_log_path));
        let notifier = Arc::new(FileNotifier::new(&config.notifications_path));

        let serving = Arc::new(ModelServerClient::new(
            &config.serving.base_url,
            &config.model_name,
            config.serving.timeout(),
        )?);

        let pipeline = ReleasePipeline::new(
            store.clone(),
            backups,
            trainer,
            log.clone(),
            notifier,
            config.gate.clone(),
            config.model_name.clone(),
        );

        let comparator =
            CanaryComparator::new(serving.clone() as Arc<dyn PredictionBackend>);

        Ok(Self {
            config,
            store,
            log,
            pipeline,
            serving,
            comparator,
        })
    }

    /// Initializes logging with an environment-controlled filter
    fn init_logging() {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // A second initialization (e.g. in tests) keeps the first subscriber
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// Executes one release run
    pub async fn run_release(&self, epochs_override: Option<u32>) -> Result<PromotionRecord> {
        let request = TrainRequest {
            hyperparameters: self.config.hyperparameters(epochs_override),
            timeout: self.config.trainer.timeout(),
        };

        let record = self.pipeline.run_once(request).await?;

        Ok(record)
    }

    /// Compares two served versions on an input batch
    pub async fn run_canary(
        &self,
        version_a: u32,
        version_b: u32,
        inputs: &[Vec<f64>],
    ) -> Result<CanaryReport> {
        let report = self.comparator.compare(version_a, version_b, inputs).await?;
        Ok(report)
    }

    /// Lists existing versions and the current (highest) one
    pub fn list_versions(&self) -> Result<(Vec<u32>, Option<u32>)> {
        let versions = self.store.list_versions()?;
        let current = versions.last().copied();
        Ok((versions, current))
    }

    /// Fetches the serving collaborator's status for the model
    pub async fn model_status(&self) -> Result<serde_json::Value> {
        let status = self.serving.model_status().await?;
        Ok(status)
    }

    /// Removes orphaned candidates, returning the removed ids
    pub fn reconcile(&self) -> Result<Vec<u32>> {
        let removed = recovery::reconcile(&self.store, self.log.as_ref())?;
        Ok(removed)
    }

    /// The loaded configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
