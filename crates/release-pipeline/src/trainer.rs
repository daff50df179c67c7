//! Trainer collaborator seam
//!
//! The pipeline treats training as a black box that returns a staged
//! artifact plus its evaluation metrics. The bundled [`CommandTrainer`]
//! spawns a configured command, hands it a staging directory through
//! environment variables, and bounds it with the caller-supplied timeout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use common::error::{Error, Result};
use common::records::Metrics;
use common::utils::format_duration;

/// Environment variable naming the directory the trainer writes into
pub const TRAIN_OUTPUT_DIR_ENV: &str = "TRAIN_OUTPUT_DIR";

/// Environment variable naming the hyperparameter file handed to the trainer
pub const TRAIN_CONFIG_ENV: &str = "TRAIN_CONFIG";

/// One training request
#[derive(Debug, Clone)]
pub struct TrainRequest {
    /// Opaque hyperparameter mapping, passed through unmodified
    pub hyperparameters: serde_json::Value,

    /// Wall-clock bound on the training run
    pub timeout: Duration,
}

/// A trained artifact and its evaluation metrics
///
/// The artifact lives in a staging directory owned by this value; it is
/// deleted when the value is dropped, after the pipeline has installed the
/// artifact under its candidate version id.
#[derive(Debug)]
pub struct TrainedModel {
    /// Staging directory keeping the artifact alive
    staging: TempDir,

    /// Directory holding the artifact files within the staging directory
    artifact_dir: PathBuf,

    /// Evaluation metrics reported by the trainer
    pub metrics: Metrics,
}

impl TrainedModel {
    /// Creates a trained model over a staged artifact
    pub fn new(staging: TempDir, artifact_dir: PathBuf, metrics: Metrics) -> Self {
        Self {
            staging,
            artifact_dir,
            metrics,
        }
    }

    /// Directory holding the staged artifact files
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Root of the staging directory
    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }
}

/// Produces a trained artifact and evaluation metric from a configuration
#[async_trait]
pub trait Trainer: Send + Sync {
    /// Runs one training job
    ///
    /// Fails with `TrainingFailed` when the job errors or exceeds the
    /// request timeout; no model version is created in that case.
    async fn train(&self, request: &TrainRequest) -> Result<TrainedModel>;
}

/// Trainer that spawns a configured command
///
/// Contract with the command: it reads hyperparameters from the JSON file
/// named by `TRAIN_CONFIG`, writes the artifact files plus a `metrics.json`
/// into the directory named by `TRAIN_OUTPUT_DIR`, and exits zero on
/// success.
pub struct CommandTrainer {
    /// Command and arguments to spawn
    command: Vec<String>,
}

impl CommandTrainer {
    /// Creates a new command trainer
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Trainer for CommandTrainer {
    async fn train(&self, request: &TrainRequest) -> Result<TrainedModel> {
        let staging = TempDir::new()
            .map_err(|e| Error::TrainingFailed(format!("cannot create staging dir: {}", e)))?;

        let artifact_dir = staging.path().join("artifact");
        std::fs::create_dir(&artifact_dir)
            .map_err(|e| Error::TrainingFailed(format!("cannot create artifact dir: {}", e)))?;

        let config_path = staging.path().join("train_config.json");
        let config_json = serde_json::to_string_pretty(&request.hyperparameters)?;
        std::fs::write(&config_path, config_json)
            .map_err(|e| Error::TrainingFailed(format!("cannot write trainer config: {}", e)))?;

        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| Error::TrainingFailed("trainer command is empty".to_string()))?;

        info!("Spawning trainer: {}", self.command.join(" "));

        let child = Command::new(program)
            .args(args)
            .env(TRAIN_OUTPUT_DIR_ENV, &artifact_dir)
            .env(TRAIN_CONFIG_ENV, &config_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::TrainingFailed(format!("cannot spawn trainer: {}", e)))?;

        let output = match timeout(request.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::TrainingFailed(format!("trainer did not finish: {}", e)));
            }
            Err(_) => {
                return Err(Error::TrainingFailed(format!(
                    "trainer timed out after {}",
                    format_duration(request.timeout)
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::TrainingFailed(format!(
                "trainer exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let metrics_path = artifact_dir.join("metrics.json");
        let raw = std::fs::read_to_string(&metrics_path).map_err(|_| {
            Error::TrainingFailed("trainer did not write metrics.json".to_string())
        })?;
        let metrics: Metrics = serde_json::from_str(&raw)
            .map_err(|e| Error::TrainingFailed(format!("malformed metrics.json: {}", e)))?;

        debug!(
            "Trainer reported accuracy {:.2}% (loss {:.4})",
            metrics.test_accuracy_percent, metrics.test_loss
        );

        Ok(TrainedModel::new(staging, artifact_dir, metrics))
    }
}
