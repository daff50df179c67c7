//! Notification sink seam
//!
//! Notification delivery is best-effort: the pipeline logs delivery
//! failures and never escalates them to its caller.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use common::error::{Error, Result};

/// Delivers success/failure messages for pipeline runs
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one message
    async fn notify(&self, subject: &str, body: &str, success: bool) -> Result<()>;
}

/// Notification sink appending to a log file
pub struct FileNotifier {
    /// File messages are appended to
    path: PathBuf,
}

impl FileNotifier {
    /// Creates a notifier over a file path; the file is created on first use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl NotificationSink for FileNotifier {
    async fn notify(&self, subject: &str, body: &str, _success: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::ExternalService(format!("notifier: {}", e)))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::ExternalService(format!("notifier: {}", e)))?;

        writeln!(file, "{} {} {}", Utc::now().to_rfc3339(), subject, body)
            .map_err(|e| Error::ExternalService(format!("notifier: {}", e)))?;

        Ok(())
    }
}

/// One captured notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Message subject
    pub subject: String,

    /// Message body
    pub body: String,

    /// Whether the run succeeded
    pub success: bool,
}

/// In-memory notification sink for tests
#[derive(Default)]
pub struct MemoryNotifier {
    /// Captured messages
    messages: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Creates an empty in-memory notifier
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages delivered so far
    pub fn messages(&self) -> Vec<Notification> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifier {
    async fn notify(&self, subject: &str, body: &str, success: bool) -> Result<()> {
        self.messages.lock().push(Notification {
            subject: subject.to_string(),
            body: body.to_string(),
            success,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_notifier_appends_timestamped_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notifications.log");
        let notifier = FileNotifier::new(&path);

        notifier
            .notify("[PROMOTE] simple_classifier version 2", "meets gate", true)
            .await
            .unwrap();
        notifier
            .notify("[REJECT] simple_classifier version 3", "fails gate", false)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[PROMOTE]"));
        assert!(lines[1].contains("[REJECT]"));
    }

    #[tokio::test]
    async fn test_memory_notifier_captures_messages() {
        let notifier = MemoryNotifier::new();
        notifier.notify("subject", "body", true).await.unwrap();

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].success);
        assert_eq!(messages[0].subject, "subject");
    }
}
