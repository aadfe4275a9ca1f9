//! Layered configuration: built-in defaults, then an optional TOML file, then
//! `MEUSGASTOS_*` environment variables. Command-line flags are applied on top
//! by the CLI.

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

/// Config file looked up when `--config` is not given (`meusgastos.toml`).
pub const DEFAULT_CONFIG_PATH: &str = "meusgastos";
pub const DEFAULT_DATABASE: &str = "meusgastos.db";
/// Label given to restored transactions that lost their category.
pub const DEFAULT_FALLBACK_CATEGORY: &str = "Outros";
pub const DEFAULT_LOG_FILTER: &str = "meusgastos=info";
const ENV_PREFIX: &str = "MEUSGASTOS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// SQLite database file holding the ledger
    pub database: String,
    pub fallback_category: String,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            fallback_category: DEFAULT_FALLBACK_CATEGORY.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    pub fn load(config_path: Option<&str>) -> Result<Self, SettingsError> {
        Self::load_with_env(config_path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(
        config_path: Option<&str>,
        environment: Environment,
    ) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .set_default("database", DEFAULT_DATABASE)?
            .set_default("fallback_category", DEFAULT_FALLBACK_CATEGORY)?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .add_source(File::with_name(config_path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(environment)
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
