//! Configuration loading, environment overrides and validation
//!
//! ```rust,ignore
//! use metrix_config::{load_config, apply_env_overrides};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("metrix.toml"))?;
//! apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
//! ```

use crate::constants::{
    ENV_METRIX_DATABASE_URL, ENV_METRIX_FILE_STORAGE_PATH, ENV_METRIX_RESTORE,
    ENV_METRIX_STORAGE_BACKEND, ENV_METRIX_STORE_INTERVAL_MS,
};
use crate::{Config, StorageBackend};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Errors that can occur during config loading
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    EnvError { key: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file. Errors if the file does not exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    debug!(path = %path.display(), "Loading config file");
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parse and validate configuration from a TOML string
pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Build configuration from defaults plus the process environment
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Overlay `METRIX_*` variables on top of `config`, then re-validate.
///
/// `lookup` is injected so callers (and tests) control where values come from.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_METRIX_STORAGE_BACKEND) {
        config.storage.backend = raw
            .parse::<StorageBackend>()
            .map_err(|message| env_error(ENV_METRIX_STORAGE_BACKEND, message))?;
    }

    if let Some(raw) = lookup(ENV_METRIX_FILE_STORAGE_PATH) {
        config.storage.file.path = PathBuf::from(raw);
    }

    if let Some(raw) = lookup(ENV_METRIX_STORE_INTERVAL_MS) {
        config.storage.file.store_interval_ms = raw.trim().parse::<u64>().map_err(|e| {
            env_error(ENV_METRIX_STORE_INTERVAL_MS, e.to_string())
        })?;
    }

    if let Some(raw) = lookup(ENV_METRIX_RESTORE) {
        config.storage.file.restore = parse_bool(&raw)
            .ok_or_else(|| env_error(ENV_METRIX_RESTORE, format!("expected a boolean, got '{}'", raw)))?;
    }

    if let Some(raw) = lookup(ENV_METRIX_DATABASE_URL) {
        config.storage.postgres.url = raw;
        // A database URL without an explicit backend selects postgres
        if lookup(ENV_METRIX_STORAGE_BACKEND).is_none() {
            config.storage.backend = StorageBackend::Postgres;
        }
    }

    debug!(backend = config.storage.backend.as_str(), "Applied environment overrides");
    validate_config(config)
}

fn env_error(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::EnvError {
        key: key.to_string(),
        message: message.into(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validate configuration values, reporting every problem at once
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut all_errors = config.storage.validate();

    if let Err(e) = config.logging.validate() {
        all_errors.push(e);
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(all_errors.join("; ")))
    }
}
