use anyhow::Result;
use colored::Colorize;
use predict_telemetry::{config, telemetry::DurabilityStore};
use std::path::PathBuf;

/// Print the entries a restart would restore
pub async fn execute(config_path: &str, snapshot: Option<PathBuf>) -> Result<()> {
    let path = match snapshot {
        Some(path) => path,
        None => config::load_config_from(config_path)?.telemetry.snapshot_path,
    };

    let store = DurabilityStore::new(&path);
    let entries = store.try_load().await?;

    println!(
        "{} {} ({})",
        "Pending telemetry entries:".bold(),
        entries.len(),
        path.display()
    );

    for (idx, entry) in entries.iter().enumerate() {
        println!(
            "  {:>3}. {} {:<8} words={}",
            idx + 1,
            entry.timestamp.format(predict_telemetry::telemetry::entry::STORE_DATETIME_FORMAT),
            entry.predicted_tip.cyan(),
            entry.words_count
        );
    }

    Ok(())
}
