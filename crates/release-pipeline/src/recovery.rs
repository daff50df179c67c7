//! Orphaned candidate recovery
//!
//! A run interrupted between artifact-write and decision leaves a version
//! with a metrics sidecar but no promotion log entry. Such an orphan is
//! treated as rejected: an external maintenance pass removes it so the
//! serving collaborator's "highest version" view reverts to the last
//! decided version. This never runs automatically inside a release run.

use tracing::{info, warn};

use common::error::Result;
use version_store::VersionStore;

use crate::log::PromotionLog;

/// Finds versions with metrics but no recorded promotion decision
pub fn find_orphans(store: &VersionStore, log: &dyn PromotionLog) -> Result<Vec<u32>> {
    let decided: std::collections::HashSet<u32> =
        log.records()?.iter().map(|r| r.to_version).collect();

    let orphans = store
        .list_versions()?
        .into_iter()
        .filter(|v| store.has_metrics(*v) && !decided.contains(v))
        .collect();

    Ok(orphans)
}

/// Removes all orphaned candidates, returning the ids that were removed
pub fn reconcile(store: &VersionStore, log: &dyn PromotionLog) -> Result<Vec<u32>> {
    let orphans = find_orphans(store, log)?;

    if orphans.is_empty() {
        info!("No orphaned candidates found");
        return Ok(orphans);
    }

    for version in &orphans {
        warn!(
            "Removing orphaned candidate {} (metrics present, no decision recorded)",
            version
        );
        store.remove_version(*version)?;
    }

    Ok(orphans)
}
