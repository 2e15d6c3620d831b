//! Application services (use cases)

mod metric_service;

#[cfg(test)]
mod metric_service_tests;

pub use metric_service::MetricService;
