//! Top-level configuration

pub use crate::logging::LoggingConfig;
pub use crate::retry::{BackoffKind, RetryConfig};
pub use crate::storage::{FileStorageConfig, PostgresConfig, StorageBackend, StorageConfig};

use serde::{Deserialize, Serialize};

/// Root of `metrix.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}
