//! Backup-before-replace copies of model version artifacts
//!
//! Before a promotion supersedes the previously-current version, its
//! artifact is copied to a timestamped entry in a backups directory. If the
//! backup cannot be taken, the promotion must not proceed.

pub mod manager;

// Re-export commonly used types
pub use manager::BackupManager;
