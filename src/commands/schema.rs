use anyhow::Result;
use colored::Colorize;
use predict_telemetry::{config, schema};

/// Print the DDL the server runs at startup
pub fn execute(config_path: &str, database: Option<String>) -> Result<()> {
    let database = match database {
        Some(db) => db,
        None => config::load_config_from(config_path)?.store.database,
    };

    let registry = schema::register_builtin_entities();
    for descriptor in registry.all_descriptors() {
        println!("{} {}", "--".dimmed(), descriptor.name.bold());
        println!("{};", schema::create_table_statement(descriptor, Some(database.as_str())));
        println!();
    }

    Ok(())
}
