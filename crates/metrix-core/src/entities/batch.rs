//! Ordered metric batches and duplicate merging

use super::metric::{Metric, MetricKey, MetricValue};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Ordered set of metrics submitted together.
///
/// Entries need not be unique by (type, name) until [`MetricBatch::merge_duplicates`]
/// has been applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBatch {
    metrics: Vec<Metric>,
}

impl MetricBatch {
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.metrics.iter()
    }

    pub fn as_slice(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn into_inner(self) -> Vec<Metric> {
        self.metrics
    }

    /// Keys in batch order (may repeat before merging)
    pub fn keys(&self) -> Vec<MetricKey> {
        self.metrics.iter().map(Metric::key).collect()
    }

    /// Collapse repeated keys into one entry each.
    ///
    /// Counters sharing a key are summed with checked addition; overflow is
    /// a [`Error::Conversion`]. Gauges sharing a key keep the last occurrence.
    /// Output order follows the first occurrence of each key.
    pub fn merge_duplicates(self) -> Result<Self> {
        let mut positions: HashMap<MetricKey, usize> = HashMap::with_capacity(self.metrics.len());
        let mut merged: Vec<Metric> = Vec::with_capacity(self.metrics.len());

        for metric in self.metrics {
            let key = metric.key();
            if let Some(&idx) = positions.get(&key) {
                let existing = &mut merged[idx];
                existing.value = match (existing.value, metric.value) {
                    (MetricValue::Counter(a), MetricValue::Counter(b)) => a
                        .checked_add(b)
                        .map(MetricValue::Counter)
                        .ok_or_else(|| {
                            Error::Conversion(format!(
                                "counter '{}' overflows while merging: {} + {}",
                                key.name, a, b
                            ))
                        })?,
                    (_, latest) => latest,
                };
            } else {
                positions.insert(key, merged.len());
                merged.push(metric);
            }
        }

        Ok(Self { metrics: merged })
    }
}

impl From<Vec<Metric>> for MetricBatch {
    fn from(metrics: Vec<Metric>) -> Self {
        Self::new(metrics)
    }
}

impl FromIterator<Metric> for MetricBatch {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for MetricBatch {
    type Item = Metric;
    type IntoIter = std::vec::IntoIter<Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.into_iter()
    }
}

impl<'a> IntoIterator for &'a MetricBatch {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_merge_sums_counters_and_keeps_gauges() {
        let batch = MetricBatch::new(vec![
            Metric::counter("hits", 1),
            Metric::counter("hits", 2),
            Metric::gauge("temp", 36.6),
        ]);

        let merged = batch.merge_duplicates().unwrap();
        assert_eq!(
            merged.into_inner(),
            vec![Metric::counter("hits", 3), Metric::gauge("temp", 36.6)]
        );
    }

    #[test]
    fn test_merge_gauge_last_occurrence_wins() {
        let batch = MetricBatch::new(vec![
            Metric::gauge("temp", 1.0),
            Metric::counter("hits", 4),
            Metric::gauge("temp", 2.0),
            Metric::gauge("temp", 3.5),
        ]);

        let merged = batch.merge_duplicates().unwrap();
        assert_eq!(
            merged.into_inner(),
            vec![Metric::gauge("temp", 3.5), Metric::counter("hits", 4)]
        );
    }

    #[test]
    fn test_same_name_different_types_are_distinct() {
        let batch = MetricBatch::new(vec![Metric::counter("load", 1), Metric::gauge("load", 0.5)]);
        assert_eq!(batch.merge_duplicates().unwrap().len(), 2);
    }

    #[test]
    fn test_merge_counter_overflow_is_conversion_error() {
        let batch = MetricBatch::new(vec![
            Metric::counter("x", i64::MAX),
            Metric::gauge("temp", 1.0),
            Metric::counter("x", 1),
        ]);
        assert!(matches!(batch.merge_duplicates(), Err(Error::Conversion(_))));

        let batch = MetricBatch::new(vec![Metric::counter("x", i64::MIN), Metric::counter("x", -1)]);
        assert!(matches!(batch.merge_duplicates(), Err(Error::Conversion(_))));
    }

    #[test]
    fn test_merge_empty() {
        assert!(MetricBatch::default().merge_duplicates().unwrap().is_empty());
    }

    fn arb_metric() -> impl Strategy<Value = Metric> {
        let name = prop_oneof![Just("a"), Just("b"), Just("c")];
        prop_oneof![
            (name.clone(), -1000i64..1000).prop_map(|(n, v)| Metric::counter(n, v)),
            (name, -1000.0f64..1000.0).prop_map(|(n, v)| Metric::gauge(n, v)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        /// After merging, every key appears exactly once
        #[test]
        fn proptest_merge_yields_unique_keys(metrics in prop::collection::vec(arb_metric(), 0..32)) {
            let merged = MetricBatch::new(metrics.clone()).merge_duplicates().unwrap();
            let mut keys = merged.keys();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(keys.len(), total);
        }

        /// Merged counter equals the sum of its occurrences; merged gauge equals the last one
        #[test]
        fn proptest_merge_values(metrics in prop::collection::vec(arb_metric(), 0..32)) {
            let merged = MetricBatch::new(metrics.clone()).merge_duplicates().unwrap();
            for m in merged.iter() {
                let same_key: Vec<&Metric> = metrics.iter().filter(|o| o.key() == m.key()).collect();
                match m.value {
                    MetricValue::Counter(v) => {
                        let sum: i64 = same_key.iter().map(|o| match o.value {
                            MetricValue::Counter(d) => d,
                            MetricValue::Gauge(_) => 0,
                        }).sum();
                        prop_assert_eq!(v, sum);
                    }
                    MetricValue::Gauge(_) => {
                        prop_assert_eq!(Some(m), same_key.last().copied());
                    }
                }
            }
        }
    }
}
