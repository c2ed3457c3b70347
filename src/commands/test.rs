use anyhow::Result;
use colored::Colorize;
use predict_telemetry::config;
use tracing::info;

/// Execute the test command
///
/// This validates the configuration file without starting the server
pub fn execute(config_path: &str) -> Result<()> {
    println!("{}", "Testing configuration...".yellow());
    info!("Loading and validating configuration");

    let cfg = config::load_config_from(config_path)?;

    println!("{}", "✓ Configuration test successful".green());
    println!();

    println!("{}", "Configuration Summary:".bold());
    println!("  {}: {}:{}", "Server".cyan(), cfg.server.host, cfg.server.port);
    println!("  {}: {}", "Log Level".cyan(), cfg.server.log_level);
    println!("  {}: {}", "Log Format".cyan(), cfg.server.log_format);
    println!();

    println!("{}", "Telemetry:".cyan());
    println!("    Monitored path: {}", cfg.telemetry.monitored_path);
    println!("    Flush threshold: {}", cfg.telemetry.flush_threshold);
    println!("    Snapshot: {}", cfg.telemetry.snapshot_path.display());
    println!();

    println!("{}", "Store:".cyan());
    println!("    Endpoint: {}", cfg.store.endpoint());
    println!("    Database: {}", cfg.store.database);
    println!("    User: {}", cfg.store.username);
    println!(
        "    Password: {}",
        if cfg.store.password.is_empty() {
            "(empty)".dimmed()
        } else {
            "***".normal()
        }
    );
    println!("    Timeout: {}s", cfg.store.timeout_seconds);

    info!("Configuration validation completed successfully");
    Ok(())
}
