//! Append-only promotion log
//!
//! Every completed run appends exactly one [`PromotionRecord`]. The log is
//! injected into the pipeline as a capability so tests can capture records
//! without touching a filesystem, and so the recovery pass can detect
//! candidates that have metrics but no recorded decision.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::debug;

use common::error::Result;
use common::records::PromotionRecord;

/// Append-only log of promotion decisions
pub trait PromotionLog: Send + Sync {
    /// Appends one record
    fn append(&self, record: &PromotionRecord) -> Result<()>;

    /// Reads all records in append order
    fn records(&self) -> Result<Vec<PromotionRecord>>;
}

/// Promotion log backed by a JSON-lines file
pub struct FilePromotionLog {
    /// Log file, one JSON record per line
    path: PathBuf,
}

impl FilePromotionLog {
    /// Creates a log over a file path; the file is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PromotionLog for FilePromotionLog {
    fn append(&self, record: &PromotionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;

        debug!(
            "Recorded {} of version {} in {:?}",
            record.decision, record.to_version, self.path
        );

        Ok(())
    }

    fn records(&self) -> Result<Vec<PromotionRecord>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            records.push(serde_json::from_str(line)?);
        }

        Ok(records)
    }
}

/// In-memory promotion log for tests
#[derive(Default)]
pub struct MemoryPromotionLog {
    /// Captured records
    records: Mutex<Vec<PromotionRecord>>,
}

impl MemoryPromotionLog {
    /// Creates an empty in-memory log
    pub fn new() -> Self {
        Self::default()
    }
}

impl PromotionLog for MemoryPromotionLog {
    fn append(&self, record: &PromotionRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<PromotionRecord>> {
        Ok(self.records.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::records::GateDecision;
    use tempfile::TempDir;

    fn record(to_version: u32, decision: GateDecision) -> PromotionRecord {
        PromotionRecord {
            from_version: to_version.checked_sub(1).filter(|v| *v > 0),
            to_version,
            decision,
            reason: "test".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_file_log_appends_one_line_per_record() {
        let tmp = TempDir::new().unwrap();
        let log = FilePromotionLog::new(tmp.path().join("promotions.log"));

        log.append(&record(1, GateDecision::Promote)).unwrap();
        log.append(&record(2, GateDecision::Reject)).unwrap();

        let raw = std::fs::read_to_string(tmp.path().join("promotions.log")).unwrap();
        assert_eq!(raw.lines().count(), 2);

        let records = log.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].to_version, 1);
        assert_eq!(records[1].decision, GateDecision::Reject);
    }

    #[test]
    fn test_file_log_missing_file_reads_empty() {
        let tmp = TempDir::new().unwrap();
        let log = FilePromotionLog::new(tmp.path().join("never-written.log"));
        assert!(log.records().unwrap().is_empty());
    }

    #[test]
    fn test_memory_log_captures_records() {
        let log = MemoryPromotionLog::new();
        log.append(&record(3, GateDecision::Promote)).unwrap();
        assert_eq!(log.records().unwrap().len(), 1);
    }
}
