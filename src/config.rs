use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment prefix for every service setting (`PREDICT_TELEMETRY__SERVER__PORT`)
pub const ENV_PREFIX: &str = "PREDICT_TELEMETRY";

/// Environment prefix for store connection settings (`CLICKHOUSE_HOST`)
pub const STORE_ENV_PREFIX: &str = "CLICKHOUSE";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Only requests to this path are intercepted
    pub monitored_path: String,
    /// Buffer length that triggers a batch flush
    pub flush_threshold: usize,
    /// Crash-recovery snapshot of the pending buffer
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub timeout_seconds: u64,
}

impl StoreConfig {
    /// HTTP endpoint of the store
    pub fn endpoint(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}/", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}/", self.host, self.port)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                log_level: "info".to_string(),
                log_format: "text".to_string(),
            },
            telemetry: TelemetryConfig {
                monitored_path: "/predict".to_string(),
                flush_threshold: 5,
                snapshot_path: PathBuf::from("logs.json"),
            },
            store: StoreConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8123,
            username: "default".to_string(),
            password: String::new(),
            database: "default".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Load configuration from `config.toml` (optional) and the environment
pub fn load_config() -> anyhow::Result<Config> {
    load_config_from("config")
}

/// Load configuration from `path` (extension optional, file optional)
///
/// Precedence, lowest first: built-in defaults, the file,
/// `PREDICT_TELEMETRY__*` variables, `CLICKHOUSE_*` variables for the store.
pub fn load_config_from(path: &str) -> anyhow::Result<Config> {
    let defaults = Config::default();

    let settings = config::Config::builder()
        .add_source(config::Config::try_from(&defaults)?)
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX).separator("__"),
        )
        .build()?;

    let mut cfg: Config = settings.try_deserialize()?;
    cfg.store = apply_store_env(&cfg.store)?;
    validate_config(&cfg)?;

    Ok(cfg)
}

/// Overlay `CLICKHOUSE_HOST`, `CLICKHOUSE_PORT`, ... on the store section
fn apply_store_env(base: &StoreConfig) -> anyhow::Result<StoreConfig> {
    let store = config::Config::builder()
        .add_source(config::Config::try_from(base)?)
        .add_source(config::Environment::with_prefix(STORE_ENV_PREFIX))
        .build()?;

    Ok(store.try_deserialize()?)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    let path = &cfg.telemetry.monitored_path;
    if path.is_empty() {
        anyhow::bail!("telemetry.monitored_path cannot be empty");
    }
    if !path.starts_with('/') {
        anyhow::bail!("telemetry.monitored_path must start with '/': {}", path);
    }

    if cfg.telemetry.flush_threshold == 0 {
        anyhow::bail!("telemetry.flush_threshold must be at least 1");
    }

    if cfg.store.database.is_empty() {
        anyhow::bail!("store.database cannot be empty");
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("server.log_format must be 'text' or 'json', got '{}'", other),
    }

    Ok(())
}
