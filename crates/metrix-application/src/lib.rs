//! # Metrix Application Layer
//!
//! Use cases over the metric repository port.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Delivery Layer                     │  <- HTTP/gRPC handlers (not here)
//! ├─────────────────────────────────────┤
//! │  Application Layer                  │  <- THIS CRATE
//! │  (MetricService)                    │
//! ├─────────────────────────────────────┤
//! │  Infrastructure Layer               │  <- metrix-storage
//! │  (memory, file journal, PostgreSQL) │
//! ├─────────────────────────────────────┤
//! │  Domain Layer                       │  <- metrix-core
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Services
//!
//! - [`MetricService`] - push (counter accumulation, gauge overwrite), pull and liveness
//!
//! Repositories only store what they are given. Deciding that a counter
//! push adds to the stored value is this crate's job alone.

pub mod error;
pub mod services;

pub use error::{CoreResultExt, Error, Result};
pub use services::MetricService;

// Port re-exports so callers wiring a service need one import
pub use metrix_ports::{MetricRepository, MetricRepositoryRef};
