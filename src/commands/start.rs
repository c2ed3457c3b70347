use anyhow::Result;
use colored::Colorize;
use predict_telemetry::{config, init_tracing, server};
use tracing::info;

/// Execute the start command
///
/// Loads configuration, initializes tracing from it and runs the server
/// until a shutdown signal arrives.
pub async fn execute(config_path: &str) -> Result<()> {
    println!("{}", "Starting prediction service...".green());

    let cfg = config::load_config_from(config_path)?;
    init_tracing(&cfg.server);

    info!(config = config_path, "Configuration loaded");

    server::start_server(cfg).await?;

    Ok(())
}
