//! Error types for Metrix core domain

use crate::entities::MetricKey;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Error Codes - Machine-readable codes for API consumers
// ============================================================================

/// Machine-readable error codes for API consumers.
///
/// Error code ranges:
/// - 1xxx: Metric errors
/// - 3xxx: Config errors
/// - 4xxx: Connection errors
/// - 5xxx: Infrastructure errors
/// - 9xxx: Generic errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u16")]
pub enum ErrorCode {
    // Metric errors (1xxx)
    /// Metric not found (1001)
    MetricNotFound = 1001,
    /// Metric failed validation (1002)
    MetricInvalid = 1002,
    /// Value kind does not match the metric type (1003)
    MetricConversion = 1003,

    // Config errors (3xxx)
    /// Invalid configuration (3001)
    ConfigInvalid = 3001,

    // Connection errors (4xxx)
    /// Liveness probe failed (4001)
    ConnectionFailed = 4001,

    // Infrastructure errors (5xxx)
    /// Database error (5001)
    DatabaseError = 5001,
    /// I/O error (5003)
    IoError = 5003,
    /// Serialization error (5004)
    SerializationError = 5004,
    /// Transaction aborted and rolled back (5006)
    TransactionFailed = 5006,

    // Generic (9xxx)
    /// Deadline expired before the operation completed (9005)
    DeadlineExceeded = 9005,
    /// Caller cancelled the operation (9006)
    Cancelled = 9006,
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

// ============================================================================
// Error Categories - Classification for retry logic
// ============================================================================

/// Error categorization for client retry handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Temporary failure, safe to retry (connection timeout, busy DB)
    Retryable,
    /// Permanent failure, don't retry (invalid input, not found)
    Terminal,
    /// Server-side issue
    Internal,
}

impl ErrorCategory {
    /// Get the category name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCategory::Retryable => "retryable",
            ErrorCategory::Terminal => "terminal",
            ErrorCategory::Internal => "internal",
        }
    }

    /// Returns true if this error category indicates the operation can be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Retryable)
    }
}

impl ErrorCode {
    /// Get the numeric value of the error code
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the category of this error code
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::DatabaseError => ErrorCategory::Retryable,
            ErrorCode::IoError => ErrorCategory::Retryable,
            ErrorCode::ConnectionFailed => ErrorCategory::Retryable,
            ErrorCode::TransactionFailed => ErrorCategory::Retryable,
            ErrorCode::DeadlineExceeded => ErrorCategory::Retryable,

            ErrorCode::MetricNotFound => ErrorCategory::Terminal,
            ErrorCode::MetricInvalid => ErrorCategory::Terminal,
            ErrorCode::MetricConversion => ErrorCategory::Terminal,
            ErrorCode::ConfigInvalid => ErrorCategory::Terminal,
            ErrorCode::Cancelled => ErrorCategory::Terminal,

            ErrorCode::SerializationError => ErrorCategory::Internal,
        }
    }

    /// Get the error code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::MetricNotFound => "METRIC_NOT_FOUND",
            ErrorCode::MetricInvalid => "METRIC_INVALID",
            ErrorCode::MetricConversion => "METRIC_CONVERSION",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::SerializationError => "SERIALIZATION_ERROR",
            ErrorCode::TransactionFailed => "TRANSACTION_FAILED",
            ErrorCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ErrorCode::Cancelled => "CANCELLED",
        }
    }
}

// ============================================================================
// NotFoundError Trait - Common interface for "not found" style errors
// ============================================================================

/// Trait for "not found" style errors.
///
/// Lets callers classify a lookup miss by variant rather than by message text.
pub trait NotFoundError {
    /// Returns true if this error represents a "not found" condition
    fn is_not_found(&self) -> bool;

    /// The key that wasn't found
    fn missing_key(&self) -> Option<&MetricKey>;
}

impl NotFoundError for Error {
    fn is_not_found(&self) -> bool {
        matches!(self, Error::MetricNotFound(_))
    }

    fn missing_key(&self) -> Option<&MetricKey> {
        match self {
            Error::MetricNotFound(key) => Some(key),
            _ => None,
        }
    }
}

impl Error {
    /// Helper to create a metric not found error
    pub fn metric_not_found(key: MetricKey) -> Self {
        Error::MetricNotFound(key)
    }

    /// Prefix the error message with operation context.
    ///
    /// The variant is preserved so classification (`is_not_found`, `code`)
    /// still works after wrapping.
    pub fn context(self, context: impl Display) -> Self {
        match self {
            Error::MetricNotFound(key) => Error::MetricNotFound(key),
            Error::Validation(msg) => Error::Validation(format!("{}: {}", context, msg)),
            Error::Conversion(msg) => Error::Conversion(format!("{}: {}", context, msg)),
            Error::InvalidConfig(msg) => Error::InvalidConfig(format!("{}: {}", context, msg)),
            Error::Database(msg) => Error::Database(format!("{}: {}", context, msg)),
            Error::Transaction(msg) => Error::Transaction(format!("{}: {}", context, msg)),
            Error::Connection(msg) => Error::Connection(format!("{}: {}", context, msg)),
            Error::Io(msg) => Error::Io(format!("{}: {}", context, msg)),
            Error::Serialization(msg) => Error::Serialization(format!("{}: {}", context, msg)),
            Error::DeadlineExceeded(msg) => {
                Error::DeadlineExceeded(format!("{}: {}", context, msg))
            }
            Error::Cancelled(msg) => Error::Cancelled(format!("{}: {}", context, msg)),
        }
    }
}

/// Extension trait for attaching context to core results
pub trait ResultExt<T> {
    /// Wrap the error with operation context, keeping its variant
    fn context(self, context: impl Display) -> Result<T>;

    /// Like [`ResultExt::context`], but builds the context lazily
    fn with_context<C: Display>(self, f: impl FnOnce() -> C) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Display) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<C: Display>(self, f: impl FnOnce() -> C) -> Result<T> {
        self.map_err(|e| e.context(f()))
    }
}

// Error conversions
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Metric errors
    /// Missing or malformed metric fields (caller's fault)
    #[error("Invalid metric: {0}")]
    Validation(String),

    #[error("Metric not found: {0}")]
    MetricNotFound(MetricKey),

    /// Value kind does not match the declared metric type
    #[error("Conversion error: {0}")]
    Conversion(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(String),

    /// A transactional batch failed and was rolled back
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Liveness probe failed
    #[error("Connection error: {0}")]
    Connection(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Context errors
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl Error {
    /// Get the machine-readable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::MetricNotFound(_) => ErrorCode::MetricNotFound,
            Error::Validation(_) => ErrorCode::MetricInvalid,
            Error::Conversion(_) => ErrorCode::MetricConversion,
            Error::InvalidConfig(_) => ErrorCode::ConfigInvalid,
            Error::Connection(_) => ErrorCode::ConnectionFailed,
            Error::Database(_) => ErrorCode::DatabaseError,
            Error::Transaction(_) => ErrorCode::TransactionFailed,
            Error::Io(_) => ErrorCode::IoError,
            Error::Serialization(_) => ErrorCode::SerializationError,
            Error::DeadlineExceeded(_) => ErrorCode::DeadlineExceeded,
            Error::Cancelled(_) => ErrorCode::Cancelled,
        }
    }

    /// Get the error code name (e.g., "METRIC_NOT_FOUND")
    pub fn code_name(&self) -> &'static str {
        self.code().name()
    }

    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// Returns true if this error is safe to retry.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}
