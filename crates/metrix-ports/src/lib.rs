//! Port trait definitions for Metrix
//!
//! This crate contains the port (interface) traits following Clean Architecture.
//! Storage crates implement these traits, the application layer uses them.
//!
//! # Port Types
//!
//! - **Repository ports**: metric persistence abstraction shared by every backend

mod repository;

pub use repository::MetricRepository;

use std::sync::Arc;

/// Thread-safe reference to a metric repository
pub type MetricRepositoryRef = Arc<dyn MetricRepository + Send + Sync>;
