//! Scoped acquisition of a candidate version
//!
//! A freshly trained candidate is visible to the serving collaborator the
//! moment it is installed, because the collaborator serves the highest
//! existing id. Until the gate decision is recorded, the candidate is
//! unvetted: if the run is rejected or aborts, the candidate must disappear
//! so the serving view reverts to the previous version. [`CandidateGuard`]
//! enforces that: promotion is the only path that releases a candidate
//! without removal.

use tracing::warn;

use common::error::Result;

use crate::store::VersionStore;

/// Removes a candidate version on drop unless explicitly kept
pub struct CandidateGuard<'a> {
    /// Store the candidate lives in
    store: &'a VersionStore,

    /// Candidate version id
    version: u32,

    /// Whether the guard still owns the candidate
    armed: bool,
}

impl<'a> CandidateGuard<'a> {
    /// Creates a guard over an installed candidate version
    pub fn new(store: &'a VersionStore, version: u32) -> Self {
        Self {
            store,
            version,
            armed: true,
        }
    }

    /// The guarded candidate version id
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Releases the candidate without removal (promotion path)
    pub fn keep(mut self) {
        self.armed = false;
    }

    /// Removes the candidate now, surfacing any removal error (reject path)
    pub fn discard(mut self) -> Result<()> {
        self.armed = false;
        self.store.remove_version(self.version)
    }
}

impl Drop for CandidateGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.store.remove_version(self.version) {
                warn!(
                    "Failed to remove candidate version {} during cleanup: {}",
                    self.version, e
                );
            }
        }
    }
}
