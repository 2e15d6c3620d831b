//! Metric entity and value types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Metric Type Constants
// =============================================================================
// Canonical string representations used on the wire, in the journal and in SQL.

/// String representation for Counter metrics
pub const METRIC_TYPE_COUNTER: &str = "counter";
/// String representation for Gauge metrics
pub const METRIC_TYPE_GAUGE: &str = "gauge";

/// Kind of metric, deciding how pushes combine with the stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Pushes accumulate into the stored value
    Counter,
    /// Pushes overwrite the stored value
    Gauge,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => METRIC_TYPE_COUNTER,
            Self::Gauge => METRIC_TYPE_GAUGE,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MetricType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            METRIC_TYPE_COUNTER => Ok(Self::Counter),
            METRIC_TYPE_GAUGE => Ok(Self::Gauge),
            "" => Err(Error::Validation("metric type is empty".to_string())),
            other => Err(Error::Validation(format!(
                "unknown metric type '{}', expected '{}' or '{}'",
                other, METRIC_TYPE_COUNTER, METRIC_TYPE_GAUGE
            ))),
        }
    }
}

/// Repository key: metrics are unique by (type, name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey {
    pub metric_type: MetricType,
    pub name: String,
}

impl MetricKey {
    pub fn new(metric_type: MetricType, name: impl Into<String>) -> Self {
        Self {
            metric_type,
            name: name.into(),
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.metric_type, self.name)
    }
}

/// Typed metric payload. The variant is the metric type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Counter(i64),
    Gauge(f64),
}

impl MetricValue {
    pub fn metric_type(&self) -> MetricType {
        match self {
            Self::Counter(_) => MetricType::Counter,
            Self::Gauge(_) => MetricType::Gauge,
        }
    }

    /// Decode a JSON number into the runtime kind required by `metric_type`.
    ///
    /// Counters arriving as floating point are truncated toward zero since
    /// JSON does not distinguish integer and float numbers.
    pub fn from_json(metric_type: MetricType, value: &serde_json::Value) -> Result<Self> {
        match metric_type {
            MetricType::Counter => {
                if let Some(delta) = value.as_i64() {
                    return Ok(Self::Counter(delta));
                }
                match value.as_f64() {
                    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
                    Some(f) if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                        Ok(Self::Counter(f.trunc() as i64))
                    }
                    Some(f) => Err(Error::Conversion(format!(
                        "counter value {} is out of the i64 range",
                        f
                    ))),
                    None => Err(Error::Conversion(format!(
                        "counter value must be a number, got {}",
                        value
                    ))),
                }
            }
            MetricType::Gauge => match value.as_f64() {
                Some(f) if f.is_finite() => Ok(Self::Gauge(f)),
                _ => Err(Error::Conversion(format!(
                    "gauge value must be a finite number, got {}",
                    value
                ))),
            },
        }
    }

    /// Encode as a JSON number. Fails for non-finite gauges, which JSON cannot carry.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        match *self {
            Self::Counter(v) => Ok(serde_json::Value::from(v)),
            Self::Gauge(v) => serde_json::Number::from_f64(v)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    Error::Conversion(format!("gauge value {} is not representable", v))
                }),
        }
    }

    /// Combine a pushed delta with the currently stored value.
    ///
    /// Counters sum (checked); gauges take the new value.
    pub fn accumulate(self, delta: MetricValue) -> Result<MetricValue> {
        match (self, delta) {
            (Self::Counter(current), Self::Counter(d)) => current
                .checked_add(d)
                .map(Self::Counter)
                .ok_or_else(|| {
                    Error::Conversion(format!("counter overflow: {} + {}", current, d))
                }),
            (Self::Gauge(_), Self::Gauge(v)) => Ok(Self::Gauge(v)),
            (current, d) => Err(Error::Conversion(format!(
                "cannot combine {} value with {} delta",
                current.metric_type(),
                d.metric_type()
            ))),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter(v) => write!(f, "{}", v),
            Self::Gauge(v) => write!(f, "{}", v),
        }
    }
}

/// A named numeric measurement
///
/// Serializes as `{"name": ..., "type": "counter"|"gauge", "value": number}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MetricRecord", into = "MetricRecord")]
pub struct Metric {
    pub name: String,
    pub value: MetricValue,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: MetricValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn counter(name: impl Into<String>, delta: i64) -> Self {
        Self::new(name, MetricValue::Counter(delta))
    }

    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, MetricValue::Gauge(value))
    }

    pub fn metric_type(&self) -> MetricType {
        self.value.metric_type()
    }

    pub fn key(&self) -> MetricKey {
        MetricKey::new(self.metric_type(), self.name.clone())
    }

    /// Check the metric can be persisted by any backend.
    pub fn ensure_storable(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(format!(
                "{} metric has an empty name",
                self.metric_type()
            )));
        }
        if let MetricValue::Gauge(v) = self.value {
            if !v.is_finite() {
                return Err(Error::Conversion(format!(
                    "gauge '{}' has non-finite value {}",
                    self.name, v
                )));
            }
        }
        Ok(())
    }
}

/// Untyped metric as it arrives from the outside world or the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub metric_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl TryFrom<MetricRecord> for Metric {
    type Error = Error;

    fn try_from(record: MetricRecord) -> Result<Self> {
        if record.name.trim().is_empty() {
            return Err(Error::Validation("metric name is empty".to_string()));
        }
        let metric_type: MetricType = record.metric_type.parse()?;
        let raw = match record.value {
            Some(serde_json::Value::Null) | None => {
                return Err(Error::Validation(format!(
                    "metric '{}' has no value",
                    record.name
                )))
            }
            Some(raw) => raw,
        };
        let value = MetricValue::from_json(metric_type, &raw)
            .map_err(|e| e.context(format!("metric '{}'", record.name)))?;
        Ok(Metric::new(record.name, value))
    }
}

impl From<Metric> for MetricRecord {
    fn from(metric: Metric) -> Self {
        let metric_type = metric.metric_type().as_str().to_string();
        MetricRecord {
            name: metric.name,
            metric_type,
            // Non-finite gauges are rejected before they reach any serializer
            value: metric.value.to_json().ok(),
        }
    }
}
