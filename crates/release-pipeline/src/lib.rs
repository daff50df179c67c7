//! Release pipeline for model versions
//!
//! This crate orchestrates one release run: discover the current version,
//! invoke the trainer, evaluate the accuracy gate, back up the current
//! version, then promote or reject the candidate and persist the decision.
//! It also hosts the gate evaluator, the trainer and notification seams, the
//! append-only promotion log, and the orphaned-candidate recovery pass.

pub mod gate;
pub mod log;
pub mod notify;
pub mod pipeline;
pub mod recovery;
pub mod state;
pub mod trainer;

// Re-export commonly used types
pub use log::{FilePromotionLog, MemoryPromotionLog, PromotionLog};
pub use notify::{FileNotifier, MemoryNotifier, NotificationSink};
pub use pipeline::ReleasePipeline;
pub use state::RunState;
pub use trainer::{CommandTrainer, TrainRequest, TrainedModel, Trainer};
