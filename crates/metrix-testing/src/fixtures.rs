//! Test fixtures and sample data factories

use metrix_core::{Metric, MetricRecord};
use proptest::prelude::*;

/// Two counters and a gauge with distinct keys
pub fn sample_batch() -> Vec<Metric> {
    vec![
        Metric::counter("requests", 5),
        Metric::counter("errors", 1),
        Metric::gauge("cpu_load", 0.42),
    ]
}

/// Boundary record as the delivery layer would hand it over
pub fn record(name: &str, metric_type: &str, value: serde_json::Value) -> MetricRecord {
    MetricRecord {
        name: name.to_string(),
        metric_type: metric_type.to_string(),
        value: Some(value),
    }
}

/// Metric that every backend rejects (non-finite gauge)
pub fn unstorable_metric(name: &str) -> Metric {
    Metric::gauge(name, f64::NAN)
}

/// Names drawn from a tiny pool so generated batches repeat keys
pub fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("a"), Just("b"), Just("c"), Just("d")].prop_map(str::to_string)
}

/// Counter or finite gauge over [`arb_name`]
pub fn arb_metric() -> impl Strategy<Value = Metric> {
    prop_oneof![
        (arb_name(), -1_000i64..1_000).prop_map(|(name, delta)| Metric::counter(name, delta)),
        (arb_name(), -1_000.0f64..1_000.0).prop_map(|(name, value)| Metric::gauge(name, value)),
    ]
}

pub fn arb_batch(max_len: usize) -> impl Strategy<Value = Vec<Metric>> {
    prop::collection::vec(arb_metric(), 0..max_len)
}
