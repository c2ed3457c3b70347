use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config_path = args.config_path();

    // `start` initializes tracing itself once the log settings are loaded
    match args.get_command() {
        cli::Commands::Start => {
            commands::start::execute(&config_path).await?;
        }
        cli::Commands::Test => {
            predict_telemetry::init_default_tracing();
            commands::test::execute(&config_path)?;
        }
        cli::Commands::Schema { database } => {
            predict_telemetry::init_default_tracing();
            commands::schema::execute(&config_path, database)?;
        }
        cli::Commands::Inspect { snapshot } => {
            predict_telemetry::init_default_tracing();
            commands::inspect::execute(&config_path, snapshot).await?;
        }
        cli::Commands::Flush => {
            predict_telemetry::init_default_tracing();
            commands::flush::execute(&config_path).await?;
        }
        cli::Commands::Version => {
            println!("Predict Telemetry v{}", env!("CARGO_PKG_VERSION"));
            println!("Rust {}", env!("CARGO_PKG_RUST_VERSION"));
        }
    }

    Ok(())
}
