//! Logging configuration

use crate::constants::DEFAULT_LOG_LEVEL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily-rotated log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_file_prefix() -> String {
    "metrix".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
            file_prefix: default_file_prefix(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.level.trim().is_empty() {
            return Err("logging.level must not be empty".to_string());
        }
        if self.log_dir.is_some() && self.file_prefix.trim().is_empty() {
            return Err("logging.file_prefix must not be empty when log_dir is set".to_string());
        }
        Ok(())
    }
}
