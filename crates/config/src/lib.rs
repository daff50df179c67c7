//! Configuration management for the model release pipeline
//!
//! This crate provides loading and validation of the pipeline configuration
//! file, with environment variable overrides for the serving endpoint.

pub mod settings;

// Re-export commonly used types
pub use settings::{
    GateConfig, PipelineConfig, ServingConfig, TrainConfig, TrainerConfig,
};
