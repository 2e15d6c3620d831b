//! Application layer error types
//!
//! Wraps domain errors and adds the service's own sentinels.
//!
//! ## Error Handling Philosophy
//!
//! Errors are returned, never logged and dropped. The delivery layer alone
//! decides which status a caller sees, using [`Error::code`] and
//! [`Error::is_not_found`] rather than message text.
//!
//! ## Typed Error Strategy
//!
//! - `#[from]` for domain errors that need no extra context
//! - [`CoreResultExt::context`] at call sites that add business context
//! - A dedicated `MetricNotFound` so callers never match on backend error identities

use metrix_core::{ErrorCategory, ErrorCode, MetricKey, NotFoundError};
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Domain layer error
    #[error(transparent)]
    Core(#[from] metrix_core::Error),

    /// No metric stored under the requested key
    #[error("Metric not found: {0}")]
    MetricNotFound(MetricKey),

    /// Domain error wrapped with business context
    #[error("{context}: {source}")]
    Operation {
        context: String,
        source: metrix_core::Error,
    },
}

impl Error {
    pub fn operation(context: impl Into<String>, source: metrix_core::Error) -> Self {
        Error::Operation {
            context: context.into(),
            source,
        }
    }

    /// Get the machine-readable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Core(err) => err.code(),
            Error::MetricNotFound(_) => ErrorCode::MetricNotFound,
            Error::Operation { source, .. } => source.code(),
        }
    }

    pub fn code_name(&self) -> &'static str {
        self.code().name()
    }

    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// The underlying domain error, if any
    pub fn core(&self) -> Option<&metrix_core::Error> {
        match self {
            Error::Core(err) => Some(err),
            Error::Operation { source, .. } => Some(source),
            Error::MetricNotFound(_) => None,
        }
    }
}

impl NotFoundError for Error {
    fn is_not_found(&self) -> bool {
        self.missing_key().is_some()
    }

    fn missing_key(&self) -> Option<&MetricKey> {
        match self {
            Error::MetricNotFound(key) => Some(key),
            Error::Core(err) | Error::Operation { source: err, .. } => err.missing_key(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Extension Traits for Contextual Errors
// ============================================================================

/// Extension trait for wrapping domain results with business context
pub trait CoreResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> CoreResultExt<T> for std::result::Result<T, metrix_core::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::operation(context, e))
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::operation(f(), e))
    }
}
