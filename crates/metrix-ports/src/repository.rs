//! Repository port trait for metric persistence
//!
//! Per Clean Architecture, repository interfaces (output ports) belong with the
//! application layer. Storage adapters (metrix-storage) implement this trait.

use async_trait::async_trait;
use metrix_core::{Context, Metric, MetricType, Result};

/// Capability set every metric backend must provide
///
/// Keys are (type, name). Writes overwrite; accumulating counters is the
/// service's job, not the repository's.
#[async_trait]
pub trait MetricRepository: Send + Sync {
    /// Upsert one metric by its (type, name) key. Last write wins.
    async fn update(&self, ctx: &Context, metric: &Metric) -> Result<()>;

    /// Apply every entry of the batch atomically.
    ///
    /// Either all entries become visible or none do. Any per-item failure
    /// (validation, serialization, storage) leaves prior state unchanged, and
    /// concurrent readers never observe a partially applied batch.
    async fn update_batch(&self, ctx: &Context, metrics: &[Metric]) -> Result<()>;

    /// Find the metric stored under (type, name).
    ///
    /// Fails with [`metrix_core::Error::MetricNotFound`] when absent.
    async fn find(&self, ctx: &Context, metric_type: MetricType, name: &str) -> Result<Metric>;

    /// Snapshot of every stored metric, in unspecified order
    async fn all(&self, ctx: &Context) -> Result<Vec<Metric>>;

    /// Liveness probe, independent of the data path
    async fn check_connection(&self, ctx: &Context) -> Result<()>;
}
