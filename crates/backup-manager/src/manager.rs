//! Backup manager implementation
//!
//! Backups are copied to a hidden temp name and renamed on completion, so a
//! partially-copied backup directory is never visible. Entries are named
//! `model_v<version>_<timestamp>`; a monotonic sequence suffix keeps two
//! backups of the same version distinguishable within one second.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use common::error::{Error, Result};
use common::records::Backup;
use common::utils::{copy_dir_all, timestamp_slug};

/// Copies version artifacts to timestamped backup locations
pub struct BackupManager {
    /// Base directory holding one subdirectory per version
    models_dir: PathBuf,

    /// Directory backups are written to
    backup_dir: PathBuf,

    /// Tie-breaker for backups taken within the same second
    sequence: AtomicU64,
}

impl BackupManager {
    /// Creates a new backup manager
    pub fn new(models_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            backup_dir: backup_dir.into(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Directory backups are written to
    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }

    /// Copies a version's artifact to a new backup location
    ///
    /// Fails with `BackupFailed` if the source version does not exist or the
    /// copy cannot complete; never leaves a partial backup entry behind.
    pub fn backup(&self, version: u32) -> Result<Backup> {
        let source = self.models_dir.join(version.to_string());

        if !source.is_dir() {
            return Err(Error::BackupFailed {
                version,
                reason: format!("source version directory {:?} not found", source),
            });
        }

        fs::create_dir_all(&self.backup_dir).map_err(|e| Error::BackupFailed {
            version,
            reason: format!("cannot create backup directory: {}", e),
        })?;

        let backup_id = self.next_backup_id(version);
        let location = self.backup_dir.join(&backup_id);
        let staging = self.backup_dir.join(format!(".tmp-{}", backup_id));

        debug!("Backing up version {} to {:?}", version, location);

        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| Error::BackupFailed {
                version,
                reason: format!("cannot clear stale staging directory: {}", e),
            })?;
        }

        if let Err(e) = copy_dir_all(&source, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(Error::BackupFailed {
                version,
                reason: format!("copy failed: {}", e),
            });
        }

        fs::rename(&staging, &location).map_err(|e| Error::BackupFailed {
            version,
            reason: format!("cannot finalize backup: {}", e),
        })?;

        info!("Backed up version {} as {}", version, backup_id);

        Ok(Backup {
            source_version: version,
            backup_id,
            location,
        })
    }

    /// Picks an unused backup id for a version
    fn next_backup_id(&self, version: u32) -> String {
        let base = format!("model_v{}_{}", version, timestamp_slug());

        if !self.backup_dir.join(&base).exists() {
            return base;
        }

        // Same version backed up twice within one second
        loop {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            let id = format!("{}_{}", base, seq);
            if !self.backup_dir.join(&id).exists() {
                return id;
            }
        }
    }
}
