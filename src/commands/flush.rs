use anyhow::Result;
use colored::Colorize;
use predict_telemetry::{
    config, schema,
    store::{self, AnalyticalStore, ClickHouseClient},
    telemetry::{FlushOutcome, TelemetryPipeline},
};
use std::sync::Arc;

/// Flush the snapshot left by a stopped server
///
/// Must not run while a server shares the same snapshot file.
pub async fn execute(config_path: &str) -> Result<()> {
    let cfg = config::load_config_from(config_path)?;

    let client = Arc::new(ClickHouseClient::new(&cfg.store)?);
    client.create_database_if_missing().await?;
    let registry = schema::register_builtin_entities();
    store::create_registered_tables(client.as_ref(), &registry).await;

    let store: Arc<dyn AnalyticalStore> = client;
    let pipeline = TelemetryPipeline::bootstrap(&cfg.telemetry, store.clone()).await;
    let pending = pipeline.pending_len();

    let result = match pipeline.flush_pending().await {
        FlushOutcome::BelowThreshold => {
            println!("{}", "Nothing to flush".yellow());
            Ok(())
        }
        FlushOutcome::Flushed(count) => {
            println!(
                "{}",
                format!("✓ Flushed {} entries to {}", count, pipeline.flusher().table()).green()
            );
            Ok(())
        }
        FlushOutcome::Failed => {
            println!(
                "{}",
                format!("✗ Flush failed, {} entries kept in snapshot", pending).red()
            );
            Err(anyhow::anyhow!("failed to flush pending telemetry"))
        }
    };

    store.close().await;
    result
}
