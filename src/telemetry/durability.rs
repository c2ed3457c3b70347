//! Crash-recovery snapshot of the pending telemetry buffer
//!
//! The snapshot is a JSON array of `[predicted_tip, words_count, timestamp]`
//! triples. It is rewritten wholesale through a temporary file and a rename,
//! so a crash mid-write leaves the previous snapshot intact.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use super::entry::LogEntry;

#[derive(Debug, Error)]
pub enum DurabilityError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRow(String, i32, NaiveDateTime);

impl From<&LogEntry> for SnapshotRow {
    fn from(entry: &LogEntry) -> Self {
        Self(entry.predicted_tip.clone(), entry.words_count, entry.timestamp)
    }
}

impl From<SnapshotRow> for LogEntry {
    fn from(row: SnapshotRow) -> Self {
        LogEntry::at(row.0, row.1, row.2)
    }
}

#[derive(Debug, Clone)]
pub struct DurabilityStore {
    path: PathBuf,
}

impl DurabilityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the snapshot with `entries`
    pub async fn save(&self, entries: &[LogEntry]) -> Result<(), DurabilityError> {
        let rows: Vec<SnapshotRow> = entries.iter().map(SnapshotRow::from).collect();
        let bytes = serde_json::to_vec(&rows)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, bytes).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    /// Read the snapshot. A missing or empty file is an empty history.
    pub async fn try_load(&self) -> Result<Vec<LogEntry>, DurabilityError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let rows: Vec<SnapshotRow> = serde_json::from_slice(&bytes)?;
        Ok(rows.into_iter().map(LogEntry::from).collect())
    }

    /// Like [`try_load`](Self::try_load), but an unreadable snapshot is
    /// logged and treated as empty.
    pub async fn load(&self) -> Vec<LogEntry> {
        match self.try_load().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Unreadable telemetry snapshot, starting with empty history"
                );
                Vec::new()
            }
        }
    }
}
