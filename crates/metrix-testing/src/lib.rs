//! Test utilities for Metrix
//!
//! # Mocks
//!
//! - [`MockMetricRepository`] - in-memory repository with failure injection
//! - [`FlakyProbe`] - repository whose liveness check fails a set number of times
//!
//! # Fixtures
//!
//! - [`fixtures::sample_batch`] - small mixed counter/gauge batch
//! - [`fixtures::arb_metric`] - proptest strategy over a small key space
//!
//! # Usage
//!
//! ```no_run
//! use metrix_testing::{fixtures, MockMetricRepository};
//! use metrix_core::Error;
//!
//! let repo = MockMetricRepository::with_metrics(fixtures::sample_batch());
//! repo.fail_update_batch(Error::Transaction("injected".to_string()));
//! ```

pub mod fixtures;
mod mocks;
pub mod proptest_config;

pub use mocks::{FlakyProbe, MockMetricRepository};

/// Install a test-writer subscriber once per process
pub fn init_test_logging() {
    metrix_logging::init_test();
}
