//! Core domain entities for Metrix
//!
//! # Modules
//!
//! - `metric` - Metric entity, typed values and the untyped boundary record
//! - `batch` - Ordered metric batches and duplicate merging

mod batch;
mod metric;

pub use batch::MetricBatch;
pub use metric::{
    Metric, MetricKey, MetricRecord, MetricType, MetricValue, METRIC_TYPE_COUNTER,
    METRIC_TYPE_GAUGE,
};
