//! Metrix Core - Domain entities for metric storage
//!
//! This crate contains the domain model shared by every layer.
//! It has minimal dependencies and no infrastructure concerns.
//!
//! # Architecture
//!
//! - `entities` - Metric, MetricValue, MetricKey, MetricBatch
//! - `context` - Deadline and cancellation carried through every operation
//! - `error` - Domain error types
//!
//! # Related Crates
//!
//! - Repository port: `metrix-ports`
//! - Backends: `metrix-storage`
//! - Counter/gauge semantics: `metrix-application`

pub mod context;
pub mod entities;
pub mod error;

pub use context::Context;
pub use entities::{
    Metric, MetricBatch, MetricKey, MetricRecord, MetricType, MetricValue, METRIC_TYPE_COUNTER,
    METRIC_TYPE_GAUGE,
};
pub use error::{Error, ErrorCategory, ErrorCode, NotFoundError, Result, ResultExt};
