//! Configuration types and loading for Metrix
//!
//! This crate provides:
//! - Configuration structures for the storage backends and logging
//! - Config file loading (TOML format)
//! - Environment variable overrides
//!
//! # Module Organization
//!
//! - `storage` - backend selection, journal file and PostgreSQL settings
//! - `retry` - bounded retry policies used by backend setup
//! - `logging` - log level and file output
//! - `types` - root [`Config`] and re-exports
//!
//! # Usage
//!
//! ```rust,ignore
//! use metrix_config::{Config, load_config};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("metrix.toml"))?;
//! println!("Backend: {}", config.storage.backend.as_str());
//! ```

mod loader;

// Default constants for all configuration values
pub mod constants;

mod logging;
mod retry;
mod storage;

mod types;

pub use loader::{
    apply_env_overrides, load_config, load_config_from_env, load_config_from_str,
    validate_config, ConfigError,
};
pub use types::*;
