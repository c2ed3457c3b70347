use super::durability::{DurabilityError, DurabilityStore};
use super::entry::LogEntry;

/// Pending telemetry rows and their snapshot.
///
/// Not synchronized by itself; [`TelemetryPipeline`](super::TelemetryPipeline)
/// keeps it behind a single mutex so that append, snapshot and flush happen
/// in one critical section.
#[derive(Debug)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    durability: DurabilityStore,
}

impl LogBuffer {
    pub fn new(durability: DurabilityStore) -> Self {
        Self {
            entries: Vec::new(),
            durability,
        }
    }

    /// Push `entry` and rewrite the snapshot.
    ///
    /// The entry stays buffered even when the snapshot write fails; memory is
    /// authoritative until the next successful snapshot.
    pub async fn append(&mut self, entry: LogEntry) -> Result<(), DurabilityError> {
        self.entries.push(entry);
        self.durability.save(&self.entries).await
    }

    /// Copy of the whole buffer when it holds at least `n` entries.
    ///
    /// Nothing is removed; call [`confirm_flushed`](Self::confirm_flushed)
    /// once the copy is safely in the store.
    pub fn drain_if_at_least(&self, n: usize) -> Option<Vec<LogEntry>> {
        if self.entries.len() >= n && !self.entries.is_empty() {
            Some(self.entries.clone())
        } else {
            None
        }
    }

    /// Drop the first `count` entries and rewrite the snapshot
    pub async fn confirm_flushed(&mut self, count: usize) -> Result<(), DurabilityError> {
        let count = count.min(self.entries.len());
        self.entries.drain(..count);
        self.durability.save(&self.entries).await
    }

    /// Replace the buffer wholesale (startup recovery)
    pub fn restore(&mut self, initial: Vec<LogEntry>) {
        self.entries = initial;
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn durability(&self) -> &DurabilityStore {
        &self.durability
    }
}
