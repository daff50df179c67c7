//! Utility functions for the model release pipeline
//!
//! This module provides utility functions used throughout the release
//! pipeline crates.

use std::fs;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;

use crate::error::{Error, Result};

/// Formats a duration into a human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    if total_secs == 0 {
        return format!("{}ms", duration.subsec_millis());
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;

    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Returns a filesystem-safe UTC timestamp slug, e.g. `20260824T101500Z`
pub fn timestamp_slug() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Executes a future with a timeout
pub async fn execute_with_timeout<T, F>(
    future: F,
    duration: Duration,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "Operation '{}' timed out after {}",
            operation_name,
            format_duration(duration)
        ))),
    }
}

/// Recursively copies a directory tree, creating the destination if absent
///
/// Symlinks are not followed; the artifact layouts handled here contain
/// only plain files and directories.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_timestamp_slug_shape() {
        let slug = timestamp_slug();
        assert_eq!(slug.len(), 16);
        assert!(slug.ends_with('Z'));
        assert!(slug.contains('T'));
    }

    #[test]
    fn test_copy_dir_all_copies_nested_tree() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        fs::write(src.path().join("saved_model.pb"), b"weights").unwrap();
        fs::create_dir(src.path().join("variables")).unwrap();
        fs::write(src.path().join("variables").join("data"), b"v").unwrap();

        let target = dst.path().join("copy");
        copy_dir_all(src.path(), &target).unwrap();

        assert_eq!(fs::read(target.join("saved_model.pb")).unwrap(), b"weights");
        assert_eq!(fs::read(target.join("variables").join("data")).unwrap(), b"v");
    }

    #[tokio::test]
    async fn test_execute_with_timeout_expires() {
        let result: Result<()> = execute_with_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Duration::from_millis(10),
            "slow operation",
        )
        .await;

        assert!(result.unwrap_err().is_timeout());
    }
}
