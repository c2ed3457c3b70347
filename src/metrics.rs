use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder. Fails if one is already installed.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "telemetry_entries_total",
        "Telemetry entries appended to the buffer"
    );
    describe_counter!(
        "telemetry_flushes_total",
        "Batch flush attempts by status"
    );
    describe_counter!(
        "telemetry_rows_flushed_total",
        "Rows written to the analytical store"
    );
    describe_counter!(
        "telemetry_snapshot_errors_total",
        "Failed snapshot writes"
    );
    describe_gauge!(
        "telemetry_buffer_pending",
        "Entries waiting for the next flush"
    );
    describe_counter!(
        "predictions_total",
        "Predictions served by label"
    );
    describe_gauge!(
        "predict_telemetry_info",
        "Service version information"
    );

    gauge!("predict_telemetry_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

pub fn record_entry() {
    counter!("telemetry_entries_total").increment(1);
}

/// Record a flush attempt; `status` is `ok` or `error`
pub fn record_flush(status: &str, rows: usize) {
    counter!("telemetry_flushes_total", "status" => status.to_string()).increment(1);
    if rows > 0 {
        counter!("telemetry_rows_flushed_total").increment(rows as u64);
    }
}

pub fn record_snapshot_error() {
    counter!("telemetry_snapshot_errors_total").increment(1);
}

pub fn set_pending(count: usize) {
    gauge!("telemetry_buffer_pending").set(count as f64);
}

pub fn record_prediction(label: &str) {
    counter!("predictions_total", "label" => label.to_string()).increment(1);
}
