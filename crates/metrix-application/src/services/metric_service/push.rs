//! Write operations for MetricService

use crate::{CoreResultExt, Error, Result};
use metrix_core::{
    Context, Error as CoreError, Metric, MetricBatch, MetricRecord, MetricType, MetricValue,
    NotFoundError,
};
use tracing::{debug, warn};

use super::MetricService;

impl MetricService {
    /// Push one metric and return the value now stored for its key
    pub async fn push(&self, ctx: &Context, metric: Metric) -> Result<Metric> {
        let key = metric.key();
        self.push_batch(ctx, vec![metric])
            .await?
            .pop()
            .ok_or_else(|| {
                Error::operation(
                    format!("push {}", key),
                    CoreError::Validation("batch produced no result".to_string()),
                )
            })
    }

    /// Push a batch atomically.
    ///
    /// Counters add their delta to the stored value (absent counts as zero),
    /// gauges replace it. Repeated keys are merged first, so a counter pushed
    /// twice in one batch ends at `stored + d1 + d2`. Returns one entry per
    /// distinct key, in first-occurrence order, holding the value persisted.
    ///
    /// The backend is left unchanged if any step fails.
    pub async fn push_batch(&self, ctx: &Context, metrics: Vec<Metric>) -> Result<Vec<Metric>> {
        if metrics.is_empty() {
            return Ok(Vec::new());
        }
        let submitted = metrics.len();

        for (index, metric) in metrics.iter().enumerate() {
            if let Err(e) = Self::validate(metric) {
                warn!(index, name = %metric.name, error = %e, "Rejected metric batch");
                return Err(e);
            }
        }

        let batch = MetricBatch::new(metrics).merge_duplicates().map_err(|e| {
            warn!(submitted, error = %e, "Rejected metric batch");
            Error::operation("failed to merge metric batch", e)
        })?;

        let _guard = ctx
            .run("acquire push lock", async { Ok(self.push_lock.lock().await) })
            .await?;

        let prepared = self.resolve_counters(ctx, batch).await?;

        if let Err(e) = self.storage.update_batch(ctx, prepared.as_slice()).await {
            warn!(count = prepared.len(), error = %e, "Metric batch was not persisted");
            return Err(Error::operation("failed to persist metric batch", e));
        }

        debug!(submitted, stored = prepared.len(), "Pushed metric batch");
        Ok(prepared.into_inner())
    }

    /// Convert boundary records and push them as one batch
    pub async fn push_records(
        &self,
        ctx: &Context,
        records: Vec<MetricRecord>,
    ) -> Result<Vec<Metric>> {
        let metrics = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| Self::validate_record(index, record))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| {
                warn!(error = %e, "Rejected metric records");
                e
            })?;

        self.push_batch(ctx, metrics).await
    }

    /// Replace every counter delta with the value it produces once added to
    /// what is stored. Must run under the push lock.
    async fn resolve_counters(&self, ctx: &Context, batch: MetricBatch) -> Result<MetricBatch> {
        let mut resolved = Vec::with_capacity(batch.len());

        for metric in batch {
            if metric.metric_type() == MetricType::Gauge {
                resolved.push(metric);
                continue;
            }

            let stored = match self.storage.find(ctx, MetricType::Counter, &metric.name).await {
                Ok(existing) => existing.value,
                Err(e) if e.is_not_found() => MetricValue::Counter(0),
                Err(e) => {
                    warn!(name = %metric.name, error = %e, "Counter lookup failed");
                    return Err(Error::operation(
                        format!("failed to prepare counter {}", metric.name),
                        e,
                    ));
                }
            };

            let value = stored
                .accumulate(metric.value)
                .with_context(|| format!("failed to prepare counter {}", metric.name))?;
            resolved.push(Metric::new(metric.name, value));
        }

        Ok(resolved.into())
    }
}
