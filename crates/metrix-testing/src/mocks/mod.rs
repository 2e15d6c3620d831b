//! Mock implementations of the repository port
//!
//! - [`MockMetricRepository`] - in-memory storage with injectable failures
//! - [`FlakyProbe`] - scripted liveness check for retry tests

mod repositories;

pub use repositories::{FlakyProbe, MockMetricRepository};
