//! Read operations for MetricService

use crate::{CoreResultExt, Error, Result};
use metrix_core::{Context, Error as CoreError, Metric, MetricType};
use tracing::trace;

use super::MetricService;

impl MetricService {
    /// Stored metric for (type, name).
    ///
    /// A missing key surfaces as [`Error::MetricNotFound`] whatever backend
    /// is configured.
    pub async fn pull(&self, ctx: &Context, metric_type: MetricType, name: &str) -> Result<Metric> {
        let metric = self
            .storage
            .find(ctx, metric_type, name)
            .await
            .map_err(|e| match e {
                CoreError::MetricNotFound(key) => Error::MetricNotFound(key),
                other => Error::operation(format!("failed to pull {}/{}", metric_type, name), other),
            })?;
        trace!(key = %metric.key(), value = %metric.value, "Pulled metric");
        Ok(metric)
    }

    /// Latest value of every stored metric
    pub async fn pull_all(&self, ctx: &Context) -> Result<Vec<Metric>> {
        self.storage.all(ctx).await.context("failed to pull metrics")
    }

    pub async fn check_connection(&self, ctx: &Context) -> Result<()> {
        self.storage.check_connection(ctx).await.map_err(Error::from)
    }
}
