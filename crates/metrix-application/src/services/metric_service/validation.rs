//! Metric validation for MetricService

use crate::{CoreResultExt, Result};
use metrix_core::{Error as CoreError, Metric, MetricRecord, MetricValue};

use super::MetricService;

impl MetricService {
    /// Reject metrics that can never be stored.
    ///
    /// Type and value are always present on a typed [`Metric`], so only the
    /// name and gauge finiteness are left to check here.
    pub fn validate(metric: &Metric) -> Result<()> {
        if metric.name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "{} metric has an empty name",
                metric.metric_type()
            ))
            .into());
        }
        if let MetricValue::Gauge(v) = metric.value {
            if !v.is_finite() {
                return Err(CoreError::Validation(format!(
                    "gauge '{}' has non-finite value {}",
                    metric.name, v
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Convert a boundary record, rejecting missing name, type or value
    pub(super) fn validate_record(index: usize, record: MetricRecord) -> Result<Metric> {
        let metric = Metric::try_from(record).with_context(|| format!("record {}", index))?;
        Self::validate(&metric)?;
        Ok(metric)
    }
}
