//! Default constants for Metrix configuration
//!
//! Single source of truth for default values. Everything that is
//! configurable should be here.
//!
//! # Organization
//!
//! - Environment variables
//! - File storage
//! - PostgreSQL
//! - Retry
//! - Logging

// ============================================================================
// ENVIRONMENT VARIABLES
// ============================================================================

/// Storage backend override ("memory", "file", "postgres")
pub const ENV_METRIX_STORAGE_BACKEND: &str = "METRIX_STORAGE_BACKEND";

/// Journal file path override
pub const ENV_METRIX_FILE_STORAGE_PATH: &str = "METRIX_FILE_STORAGE_PATH";

/// Journal flush interval override in milliseconds (0 = synchronous)
pub const ENV_METRIX_STORE_INTERVAL_MS: &str = "METRIX_STORE_INTERVAL_MS";

/// Restore journal on startup ("true"/"false")
pub const ENV_METRIX_RESTORE: &str = "METRIX_RESTORE";

/// PostgreSQL connection string override
pub const ENV_METRIX_DATABASE_URL: &str = "METRIX_DATABASE_URL";

// ============================================================================
// FILE STORAGE
// ============================================================================

/// Default journal location
pub const DEFAULT_FILE_STORAGE_PATH: &str = "/tmp/metrics-db.json";

/// Journal flush interval (5 minutes)
pub const DEFAULT_STORE_INTERVAL_MS: u64 = 300_000;

/// Replay the journal into memory on startup
pub const DEFAULT_RESTORE: bool = true;

/// Attempts to create the journal directory and file
pub const DEFAULT_FILE_SETUP_ATTEMPTS: u32 = 3;

/// Fixed delay between journal setup attempts
pub const DEFAULT_FILE_SETUP_DELAY_MS: u64 = 1_000;

/// Time allowed for the flusher to finish its final flush on shutdown
pub const DEFAULT_FLUSH_DRAIN_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// POSTGRES
// ============================================================================

/// Maximum pooled connections
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;

/// Time to wait for a pooled connection
pub const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

/// Per-attempt ping timeout
pub const DEFAULT_PG_PING_TIMEOUT_MS: u64 = 2_000;

// ============================================================================
// RETRY
// ============================================================================

/// Ping attempts before the connection is declared dead
pub const DEFAULT_PING_ATTEMPTS: u32 = 4;

/// Delay after the first failed ping
pub const DEFAULT_PING_INITIAL_DELAY_MS: u64 = 1_000;

/// Added to the delay after each further failed ping (1s, 3s, 5s, ...)
pub const DEFAULT_PING_STEP_MS: u64 = 2_000;

// ============================================================================
// LOGGING
// ============================================================================

/// Default log level when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";
