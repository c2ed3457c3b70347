//! Request telemetry pipeline
//!
//! ```text
//! interceptor ──► extract ──► LogBuffer.append ──► snapshot
//!                                   │
//!                                   └─► BatchFlusher (len ≥ threshold) ──► store.insert
//! ```
//!
//! The buffer, its snapshot and the flush all live under one mutex. A slow
//! insert therefore stalls concurrent appends, which keeps the
//! copy-then-confirm drain simple: nothing can be appended between the copy
//! and the confirmation.

pub mod buffer;
pub mod durability;
pub mod entry;
pub mod extract;
pub mod flusher;
pub mod interceptor;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::TelemetryConfig;
use crate::metrics;
use crate::schema::MODEL_LOGS;
use crate::store::AnalyticalStore;

pub use buffer::LogBuffer;
pub use durability::{DurabilityError, DurabilityStore};
pub use entry::LogEntry;
pub use flusher::{BatchFlusher, FlushOutcome, DEFAULT_FLUSH_THRESHOLD};
pub use interceptor::telemetry_middleware;

pub struct TelemetryPipeline {
    monitored_path: String,
    buffer: Mutex<LogBuffer>,
    flusher: BatchFlusher,
    /// Buffer length as of the last append or flush, readable without the lock
    pending: AtomicUsize,
}

impl TelemetryPipeline {
    pub fn new(monitored_path: impl Into<String>, buffer: LogBuffer, flusher: BatchFlusher) -> Self {
        let pending = AtomicUsize::new(buffer.len());
        Self {
            monitored_path: monitored_path.into(),
            buffer: Mutex::new(buffer),
            flusher,
            pending,
        }
    }

    /// Build the pipeline for the built-in telemetry table and restore any
    /// entries left in the snapshot by a previous run.
    pub async fn bootstrap(config: &TelemetryConfig, store: Arc<dyn AnalyticalStore>) -> Self {
        let durability = DurabilityStore::new(&config.snapshot_path);
        let restored = durability.load().await;

        let mut buffer = LogBuffer::new(durability);
        if !restored.is_empty() {
            tracing::info!(
                count = restored.len(),
                path = %config.snapshot_path.display(),
                "Restored pending telemetry from snapshot"
            );
        }
        buffer.restore(restored);
        metrics::set_pending(buffer.len());

        let flusher = BatchFlusher::for_entity(store, &MODEL_LOGS, config.flush_threshold);
        Self::new(config.monitored_path.clone(), buffer, flusher)
    }

    pub fn monitored_path(&self) -> &str {
        &self.monitored_path
    }

    pub fn is_monitored(&self, path: &str) -> bool {
        path == self.monitored_path
    }

    /// Append `entry` and flush if the threshold is reached.
    ///
    /// Never fails: snapshot and store errors are logged and reported
    /// through the outcome only.
    pub async fn record(&self, entry: LogEntry) -> FlushOutcome {
        let mut buffer = self.buffer.lock().await;

        if let Err(e) = buffer.append(entry).await {
            tracing::warn!(
                path = %buffer.durability().path().display(),
                error = %e,
                "Failed to write telemetry snapshot"
            );
            metrics::record_snapshot_error();
        }
        metrics::record_entry();
        self.publish_pending(buffer.len());

        let outcome = self.flusher.maybe_flush(&mut buffer).await;
        self.publish_pending(buffer.len());
        outcome
    }

    /// Flush everything pending regardless of the threshold
    pub async fn flush_pending(&self) -> FlushOutcome {
        let mut buffer = self.buffer.lock().await;
        let outcome = self.flusher.flush_pending(&mut buffer).await;
        self.publish_pending(buffer.len());
        outcome
    }

    pub async fn pending(&self) -> Vec<LogEntry> {
        self.buffer.lock().await.entries().to_vec()
    }

    /// Pending count without waiting on an in-flight flush
    pub fn pending_len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    fn publish_pending(&self, len: usize) {
        self.pending.store(len, Ordering::Release);
        metrics::set_pending(len);
    }

    pub fn flusher(&self) -> &BatchFlusher {
        &self.flusher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::RecordingStore;
    use std::path::Path;

    fn pipeline(store: Arc<RecordingStore>, snapshot: &Path) -> TelemetryPipeline {
        let buffer = LogBuffer::new(DurabilityStore::new(snapshot));
        let flusher = BatchFlusher::for_entity(store, &MODEL_LOGS, DEFAULT_FLUSH_THRESHOLD);
        TelemetryPipeline::new("/predict", buffer, flusher)
    }

    #[tokio::test]
    async fn test_multiples_of_threshold_flush_in_batches_of_five() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline(store.clone(), &dir.path().join("logs.json"));

        for i in 0..15 {
            pipeline.record(LogEntry::new("joy", i)).await;
        }

        let inserts = store.inserts();
        assert_eq!(inserts.len(), 3);
        for insert in &inserts {
            assert_eq!(insert.table, "ModelLogs");
            assert_eq!(insert.columns, vec!["predicted_tip", "words_count", "datetime"]);
            assert_eq!(insert.rows.len(), 5);
        }
        assert_eq!(pipeline.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_below_threshold_keeps_entries_pending() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline(store.clone(), &dir.path().join("logs.json"));

        for i in 0..4 {
            assert_eq!(
                pipeline.record(LogEntry::new("fear", i)).await,
                FlushOutcome::BelowThreshold
            );
        }

        assert!(store.inserts().is_empty());
        assert_eq!(pipeline.pending_len(), 4);
    }

    #[tokio::test]
    async fn test_failed_insert_retries_without_loss() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("logs.json");
        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline(store.clone(), &snapshot);

        store.fail_next(1);
        for i in 0..5 {
            pipeline.record(LogEntry::new("anger", i)).await;
        }
        assert!(store.inserts().is_empty());
        assert_eq!(pipeline.pending_len(), 5);
        assert_eq!(DurabilityStore::new(&snapshot).try_load().await.unwrap().len(), 5);

        // the sixth append re-triggers the threshold and carries everything
        let outcome = pipeline.record(LogEntry::new("anger", 5)).await;
        assert_eq!(outcome, FlushOutcome::Flushed(6));

        let inserts = store.inserts();
        assert_eq!(inserts.len(), 1);
        let words: Vec<_> = inserts[0].rows.iter().map(|row| row[1].clone()).collect();
        assert_eq!(words, (0..6).map(serde_json::Value::from).collect::<Vec<_>>());
        assert!(DurabilityStore::new(&snapshot).try_load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_restores_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("logs.json");
        let previous = vec![LogEntry::new("joy", 1), LogEntry::new("sadness", 2)];
        DurabilityStore::new(&snapshot).save(&previous).await.unwrap();

        let config = TelemetryConfig {
            monitored_path: "/predict".to_string(),
            flush_threshold: 5,
            snapshot_path: snapshot,
        };
        let store = Arc::new(RecordingStore::new());
        let pipeline = TelemetryPipeline::bootstrap(&config, store).await;

        assert_eq!(pipeline.pending().await, previous);
    }

    #[tokio::test]
    async fn test_flush_pending_ignores_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline(store.clone(), &dir.path().join("logs.json"));

        pipeline.record(LogEntry::new("joy", 1)).await;
        assert_eq!(pipeline.flush_pending().await, FlushOutcome::Flushed(1));
        assert_eq!(pipeline.flush_pending().await, FlushOutcome::BelowThreshold);
        assert_eq!(store.inserts().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_write_failure_keeps_entry_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the snapshot file should be makes the rename fail
        let snapshot = dir.path().join("logs.json");
        std::fs::create_dir(&snapshot).unwrap();
        std::fs::write(snapshot.join("occupied"), b"x").unwrap();

        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline(store, &snapshot);

        pipeline.record(LogEntry::new("joy", 1)).await;
        assert_eq!(pipeline.pending_len(), 1);
    }

    #[tokio::test]
    async fn test_pending_len_does_not_wait_for_buffer_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordingStore::new());
        let pipeline = pipeline(store, &dir.path().join("logs.json"));

        pipeline.record(LogEntry::new("joy", 1)).await;
        pipeline.record(LogEntry::new("fear", 2)).await;

        // a flush in progress holds this lock for the whole insert
        let _held = pipeline.buffer.lock().await;
        assert_eq!(pipeline.pending_len(), 2);
    }
}
