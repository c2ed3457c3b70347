use std::sync::Arc;
use std::time::Instant;

use super::buffer::LogBuffer;
use crate::metrics;
use crate::schema::EntityDescriptor;
use crate::store::{AnalyticalStore, Row};

/// Buffer length that triggers a flush unless configured otherwise
pub const DEFAULT_FLUSH_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Not enough entries buffered yet
    BelowThreshold,
    /// This many rows were written and removed from the buffer
    Flushed(usize),
    /// The insert failed; the buffer is unchanged
    Failed,
}

/// Writes the buffer to the store once it reaches the threshold.
///
/// Runs inside the buffer's critical section: the caller holds the buffer
/// lock for the whole drain → insert → confirm sequence.
pub struct BatchFlusher {
    store: Arc<dyn AnalyticalStore>,
    table: String,
    columns: Vec<String>,
    threshold: usize,
}

impl BatchFlusher {
    pub fn new(
        store: Arc<dyn AnalyticalStore>,
        table: impl Into<String>,
        columns: Vec<String>,
        threshold: usize,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            columns,
            threshold: threshold.max(1),
        }
    }

    /// Flusher targeting `descriptor`'s table and store columns
    pub fn for_entity(
        store: Arc<dyn AnalyticalStore>,
        descriptor: &EntityDescriptor,
        threshold: usize,
    ) -> Self {
        Self::new(store, descriptor.name, descriptor.store_column_names(), threshold)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub async fn maybe_flush(&self, buffer: &mut LogBuffer) -> FlushOutcome {
        self.flush_at_least(buffer, self.threshold).await
    }

    /// Flush whatever is pending, ignoring the threshold
    pub async fn flush_pending(&self, buffer: &mut LogBuffer) -> FlushOutcome {
        self.flush_at_least(buffer, 1).await
    }

    async fn flush_at_least(&self, buffer: &mut LogBuffer, n: usize) -> FlushOutcome {
        let Some(batch) = buffer.drain_if_at_least(n) else {
            return FlushOutcome::BelowThreshold;
        };

        let count = batch.len();
        let rows: Vec<Row> = batch.iter().map(|entry| entry.to_row()).collect();
        let start = Instant::now();

        if let Err(e) = self.store.insert(&self.table, &self.columns, &rows).await {
            tracing::error!(
                table = %self.table,
                count = count,
                error = %e,
                "Failed to insert telemetry batch, keeping entries buffered"
            );
            metrics::record_flush("error", 0);
            return FlushOutcome::Failed;
        }

        if let Err(e) = buffer.confirm_flushed(count).await {
            tracing::warn!(error = %e, "Failed to write snapshot after flush");
            metrics::record_snapshot_error();
        }

        tracing::info!(
            table = %self.table,
            count = count,
            duration_ms = start.elapsed().as_millis(),
            "Flushed telemetry batch"
        );
        metrics::record_flush("ok", count);
        FlushOutcome::Flushed(count)
    }
}
