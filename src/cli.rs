use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "predict-telemetry", version, about = "Prediction service with request telemetry")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the prediction server (default)
    Start,

    /// Test configuration file validity
    Test,

    /// Print the CREATE TABLE statement of every registered entity
    Schema {
        /// Database to qualify table names with (defaults to store.database)
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Show telemetry entries waiting in the snapshot
    Inspect {
        /// Snapshot file (defaults to telemetry.snapshot_path)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Write every pending snapshot entry to the store now
    Flush,

    /// Show version information
    Version,
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }

    /// Config path in the form `load_config_from` expects
    pub fn config_path(&self) -> String {
        self.config.to_string_lossy().into_owned()
    }
}
