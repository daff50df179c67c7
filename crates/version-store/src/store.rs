//! Version store implementation
//!
//! The serving collaborator serves whichever version directory carries the
//! highest decimal id, so every mutation here must keep the visible version
//! set correct at all times: artifacts and metrics are written to hidden
//! temp names and atomically renamed into place, and a scan never observes
//! a half-written version.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use common::error::{Error, Result};
use common::records::Metrics;
use common::utils::copy_dir_all;

/// File name of the per-version metrics sidecar
pub const METRICS_FILE: &str = "metrics.json";

/// Manages the on-disk layout of model versions and their metadata
pub struct VersionStore {
    /// Base directory containing one subdirectory per version
    base: PathBuf,
}

impl VersionStore {
    /// Opens a version store, creating the base directory if absent
    pub fn open(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();

        fs::create_dir_all(&base).map_err(|e| Error::StoreUnavailable {
            path: base.clone(),
            source: e,
        })?;

        debug!("Opened version store at {:?}", base);

        Ok(Self { base })
    }

    /// Base directory of the store
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory of a version
    pub fn version_path(&self, version: u32) -> PathBuf {
        self.base.join(version.to_string())
    }

    /// Lists existing version ids in ascending order
    ///
    /// Only directories whose name parses as a non-negative integer count;
    /// anything else in the base directory is ignored.
    pub fn list_versions(&self) -> Result<Vec<u32>> {
        let entries = fs::read_dir(&self.base).map_err(|e| Error::StoreUnavailable {
            path: self.base.clone(),
            source: e,
        })?;

        let mut versions = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| Error::StoreUnavailable {
                path: self.base.clone(),
                source: e,
            })?;

            if !entry.path().is_dir() {
                continue;
            }

            if let Some(version) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            {
                versions.push(version);
            }
        }

        versions.sort_unstable();

        Ok(versions)
    }

    /// The highest existing version id, or `None` if the store is empty
    pub fn current_version(&self) -> Result<Option<u32>> {
        Ok(self.list_versions()?.into_iter().max())
    }

    /// Reads the metrics sidecar of a version
    pub fn metrics_for(&self, version: u32) -> Result<Metrics> {
        let path = self.version_path(version).join(METRICS_FILE);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::MetricsMissing { version });
            }
            Err(e) => {
                return Err(Error::StoreUnavailable { path, source: e });
            }
        };

        let metrics: Metrics = serde_json::from_str(&raw)?;

        Ok(metrics)
    }

    /// Returns true if a version has a metrics sidecar
    pub fn has_metrics(&self, version: u32) -> bool {
        self.version_path(version).join(METRICS_FILE).is_file()
    }

    /// Persists the metrics sidecar of a version
    ///
    /// Written to a hidden temp name in the version directory and renamed
    /// into place, so a concurrent scan never observes a partial file.
    pub fn write_metrics(&self, version: u32, metrics: &Metrics) -> Result<()> {
        let dir = self.version_path(version);

        fs::create_dir_all(&dir).map_err(|e| Error::StoreUnavailable {
            path: dir.clone(),
            source: e,
        })?;

        let tmp = dir.join(".metrics.json.tmp");
        let json = serde_json::to_string_pretty(metrics)?;

        fs::write(&tmp, json).map_err(|e| Error::StoreUnavailable {
            path: tmp.clone(),
            source: e,
        })?;

        let target = dir.join(METRICS_FILE);
        fs::rename(&tmp, &target).map_err(|e| Error::StoreUnavailable {
            path: target,
            source: e,
        })?;

        debug!("Wrote metrics for version {}", version);

        Ok(())
    }

    /// Installs a staged artifact directory as a new version
    ///
    /// The staged tree is copied to a hidden name inside the base and
    /// atomically renamed to the final decimal id, so the serving
    /// collaborator's "highest existing version" view never includes a
    /// partially-copied candidate.
    pub fn install_version(&self, version: u32, staged: &Path) -> Result<()> {
        let target = self.version_path(version);

        if target.exists() {
            return Err(Error::StoreUnavailable {
                path: target,
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("version {} already exists", version),
                ),
            });
        }

        let staging = self.base.join(format!(".staging-{}", version));

        // Leftover staging from an interrupted run is stale
        if staging.exists() {
            warn!("Removing stale staging directory {:?}", staging);
            fs::remove_dir_all(&staging).map_err(|e| Error::StoreUnavailable {
                path: staging.clone(),
                source: e,
            })?;
        }

        if let Err(e) = copy_dir_all(staged, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        fs::rename(&staging, &target).map_err(|e| Error::StoreUnavailable {
            path: self.version_path(version),
            source: e,
        })?;

        info!("Installed version {} at {:?}", version, self.version_path(version));

        Ok(())
    }

    /// Removes a version's artifact and metadata
    ///
    /// Idempotent: removing a version that does not exist is a no-op.
    pub fn remove_version(&self, version: u32) -> Result<()> {
        let path = self.version_path(version);

        match fs::remove_dir_all(&path) {
            Ok(()) => {
                info!("Removed version {}", version);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::StoreUnavailable { path, source: e }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_metrics(version: u32, accuracy: f64) -> Metrics {
        Metrics {
            version_id: version,
            test_accuracy_percent: accuracy,
            test_loss: 0.1,
            timestamp: Utc::now(),
            sample_count: 1000,
            feature_count: 2,
        }
    }

    fn staged_artifact(dir: &TempDir) -> PathBuf {
        let staged = dir.path().join("staged");
        fs::create_dir_all(staged.join("variables")).unwrap();
        fs::write(staged.join("saved_model.pb"), b"weights").unwrap();
        fs::write(staged.join("variables").join("data"), b"v").unwrap();
        staged
    }

    #[test]
    fn test_open_creates_missing_base() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("models").join("simple_classifier");

        let store = VersionStore::open(&base).unwrap();
        assert!(base.is_dir());
        assert_eq!(store.list_versions().unwrap(), Vec::<u32>::new());
        assert_eq!(store.current_version().unwrap(), None);
    }

    #[test]
    fn test_list_versions_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let store = VersionStore::open(tmp.path()).unwrap();

        for name in ["3", "1", "10", "not-a-version", ".staging-4"] {
            fs::create_dir(tmp.path().join(name)).unwrap();
        }
        // Plain files never count, even with numeric names
        fs::write(tmp.path().join("7"), b"").unwrap();

        assert_eq!(store.list_versions().unwrap(), vec![1, 3, 10]);
        assert_eq!(store.current_version().unwrap(), Some(10));
    }

    #[test]
    fn test_metrics_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = VersionStore::open(tmp.path()).unwrap();

        let metrics = sample_metrics(1, 98.0);
        store.write_metrics(1, &metrics).unwrap();

        let read = store.metrics_for(1).unwrap();
        assert_eq!(read, metrics);
        assert!(store.has_metrics(1));

        // No temp file is left behind
        assert!(!tmp.path().join("1").join(".metrics.json.tmp").exists());
    }

    #[test]
    fn test_metrics_missing() {
        let tmp = TempDir::new().unwrap();
        let store = VersionStore::open(tmp.path()).unwrap();
        fs::create_dir(tmp.path().join("2")).unwrap();

        let err = store.metrics_for(2).unwrap_err();
        assert!(err.is_metrics_missing());
        assert!(!store.has_metrics(2));
    }

    #[test]
    fn test_install_version_from_staged_dir() {
        let tmp = TempDir::new().unwrap();
        let store = VersionStore::open(tmp.path().join("models")).unwrap();
        let staged = staged_artifact(&tmp);

        store.install_version(1, &staged).unwrap();

        assert_eq!(store.list_versions().unwrap(), vec![1]);
        let artifact = store.version_path(1).join("saved_model.pb");
        assert_eq!(fs::read(artifact).unwrap(), b"weights");
    }

    #[test]
    fn test_install_version_refuses_existing_id() {
        let tmp = TempDir::new().unwrap();
        let store = VersionStore::open(tmp.path().join("models")).unwrap();
        let staged = staged_artifact(&tmp);

        store.install_version(1, &staged).unwrap();
        let err = store.install_version(1, &staged).unwrap_err();
        assert!(err.is_store_unavailable());
    }

    #[test]
    fn test_remove_version_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = VersionStore::open(tmp.path()).unwrap();

        store.write_metrics(3, &sample_metrics(3, 50.0)).unwrap();
        assert_eq!(store.list_versions().unwrap(), vec![3]);

        store.remove_version(3).unwrap();
        assert_eq!(store.list_versions().unwrap(), Vec::<u32>::new());

        // Removing again is a no-op, not an error
        store.remove_version(3).unwrap();
    }
}
