//! Pipeline configuration schema
//!
//! This module defines the configuration file schema, loaded once per
//! invocation and immutable during a run. The gate threshold is validated
//! here at load time, so the gate evaluator itself never fails.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use common::error::{Error, Result};

/// Accuracy gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Minimum test accuracy in percent a candidate must reach to be
    /// promoted; equality counts as a pass
    pub min_accuracy_percent: f64,
}

/// Model server endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingConfig {
    /// Base URL of the model server, e.g. `http://localhost:8501`
    #[serde(default = "default_serving_base_url")]
    pub base_url: String,

    /// Request timeout in seconds for prediction and status calls
    #[serde(default = "default_serving_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            base_url: default_serving_base_url(),
            timeout_secs: default_serving_timeout_secs(),
        }
    }
}

impl ServingConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Trainer subprocess configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Command and arguments to spawn for a training run
    #[serde(default = "default_trainer_command")]
    pub command: Vec<String>,

    /// Wall-clock bound in seconds on a training run
    #[serde(default = "default_trainer_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            command: default_trainer_command(),
            timeout_secs: default_trainer_timeout_secs(),
        }
    }
}

impl TrainerConfig {
    /// Training timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Training hyperparameters passed through to the trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Optimizer learning rate
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Number of training epochs
    #[serde(default = "default_epochs")]
    pub epochs: u32,

    /// Mini-batch size
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Fraction of the training split held out for validation
    #[serde(default = "default_validation_split")]
    pub validation_split: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            validation_split: default_validation_split(),
        }
    }
}

/// Top-level pipeline configuration
///
/// Loaded from a JSON file once per invocation. The `dataset` section is
/// opaque to the pipeline and handed to the trainer unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base directory holding one subdirectory per model version
    pub model_base_path: PathBuf,

    /// Name the model is served under
    pub model_name: String,

    /// Directory backups are written to
    #[serde(default = "default_backup_path")]
    pub backup_path: PathBuf,

    /// Append-only promotion log file
    #[serde(default = "default_promotion_log_path")]
    pub promotion_log_path: PathBuf,

    /// Notification log file
    #[serde(default = "default_notifications_path")]
    pub notifications_path: PathBuf,

    /// Accuracy gate
    pub gate: GateConfig,

    /// Model server endpoint
    #[serde(default)]
    pub serving: ServingConfig,

    /// Trainer subprocess
    #[serde(default)]
    pub trainer: TrainerConfig,

    /// Seed for dataset generation and splitting
    #[serde(default = "default_random_state")]
    pub random_state: u64,

    /// Dataset sizing parameters, opaque to the pipeline
    #[serde(default)]
    pub dataset: serde_json::Value,

    /// Training hyperparameters
    #[serde(default)]
    pub train: TrainConfig,
}

impl PipelineConfig {
    /// Loads and validates a configuration file
    ///
    /// The `TF_HOST` and `MODEL_NAME` environment variables override the
    /// serving base URL and the model name when set.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading pipeline configuration from {:?}", path);

        let raw = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {:?}: {}", path, e))
        })?;

        let mut config: PipelineConfig = serde_json::from_str(&raw)?;

        if let Ok(host) = std::env::var("TF_HOST") {
            debug!("Overriding serving base URL from TF_HOST: {}", host);
            config.serving.base_url = host;
        }
        if let Ok(name) = std::env::var("MODEL_NAME") {
            debug!("Overriding model name from MODEL_NAME: {}", name);
            config.model_name = name;
        }

        config.validate()?;

        info!(
            "Loaded configuration for model '{}' with gate {:.2}%",
            config.model_name, config.gate.min_accuracy_percent
        );

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let threshold = self.gate.min_accuracy_percent;
        if !(0.0..=100.0).contains(&threshold) || threshold.is_nan() {
            return Err(Error::GateMisconfigured(format!(
                "min_accuracy_percent must be within [0, 100], got {}",
                threshold
            )));
        }

        if self.model_name.is_empty() {
            return Err(Error::Config("model_name must not be empty".to_string()));
        }

        if self.trainer.command.is_empty() {
            return Err(Error::Config(
                "trainer.command must not be empty".to_string(),
            ));
        }

        if self.trainer.timeout_secs == 0 || self.serving.timeout_secs == 0 {
            return Err(Error::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Builds the opaque hyperparameter mapping handed to the trainer
    ///
    /// `epochs_override` replaces `train.epochs` for this run only.
    pub fn hyperparameters(&self, epochs_override: Option<u32>) -> serde_json::Value {
        let mut train = self.train.clone();
        if let Some(epochs) = epochs_override {
            train.epochs = epochs;
        }

        json!({
            "model_name": self.model_name,
            "random_state": self.random_state,
            "dataset": self.dataset,
            "train": train,
        })
    }
}

fn default_serving_base_url() -> String {
    "http://localhost:8501".to_string()
}

fn default_serving_timeout_secs() -> u64 {
    5
}

fn default_trainer_command() -> Vec<String> {
    vec!["python".to_string(), "train_tf.py".to_string()]
}

fn default_trainer_timeout_secs() -> u64 {
    600
}

fn default_learning_rate() -> f64 {
    0.01
}

fn default_epochs() -> u32 {
    20
}

fn default_batch_size() -> u32 {
    32
}

fn default_validation_split() -> f64 {
    0.2
}

fn default_backup_path() -> PathBuf {
    PathBuf::from("backups")
}

fn default_promotion_log_path() -> PathBuf {
    PathBuf::from("promotions.log")
}

fn default_notifications_path() -> PathBuf {
    PathBuf::from("notifications.log")
}

fn default_random_state() -> u64 {
    42
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_config() -> PipelineConfig {
        PipelineConfig {
            model_base_path: PathBuf::from("models/simple_classifier"),
            model_name: "simple_classifier".to_string(),
            backup_path: default_backup_path(),
            promotion_log_path: default_promotion_log_path(),
            notifications_path: default_notifications_path(),
            gate: GateConfig {
                min_accuracy_percent: 97.0,
            },
            serving: ServingConfig::default(),
            trainer: TrainerConfig::default(),
            random_state: 42,
            dataset: serde_json::Value::Null,
            train: TrainConfig::default(),
        }
    }

    #[test]
    fn test_load_minimal_file_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "model_base_path": "models/simple_classifier",
                "model_name": "simple_classifier",
                "gate": {{ "min_accuracy_percent": 97.0 }}
            }}"#
        )
        .unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.model_name, "simple_classifier");
        assert_eq!(config.train.epochs, 20);
        assert_eq!(config.serving.timeout_secs, 5);
        assert_eq!(config.backup_path, PathBuf::from("backups"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_gate() {
        let mut config = minimal_config();
        config.gate.min_accuracy_percent = 101.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::GateMisconfigured(_)));

        config.gate.min_accuracy_percent = -0.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::GateMisconfigured(_)));

        // Boundaries are valid
        config.gate.min_accuracy_percent = 0.0;
        assert!(config.validate().is_ok());
        config.gate.min_accuracy_percent = 100.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_trainer_command() {
        let mut config = minimal_config();
        config.trainer.command.clear();
        assert!(matches!(
            config.validate().unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn test_hyperparameters_epochs_override() {
        let config = minimal_config();

        let params = config.hyperparameters(None);
        assert_eq!(params["train"]["epochs"], 20);

        let params = config.hyperparameters(Some(5));
        assert_eq!(params["train"]["epochs"], 5);
        // Override is per-call, not persisted
        assert_eq!(config.train.epochs, 20);
    }
}
