//! MetricRepository implementation for PostgreSQL

use super::PostgresRepository;
use async_trait::async_trait;
use metrix_core::{
    Context, Error, Metric, MetricKey, MetricType, MetricValue, Result, ResultExt,
};
use metrix_ports::MetricRepository;
use sqlx::types::Json;
use sqlx::{Connection, Row};
use tracing::{debug, trace, warn};

const UPSERT_METRIC: &str = r#"
INSERT INTO metrics (m_type, m_name, m_value)
VALUES ($1, $2, $3)
ON CONFLICT (m_type, m_name) DO UPDATE SET m_value = EXCLUDED.m_value
"#;

const SELECT_METRIC: &str = "SELECT m_value FROM metrics WHERE m_type = $1 AND m_name = $2";

const SELECT_ALL_METRICS: &str = "SELECT m_type, m_name, m_value FROM metrics";

/// Validate and encode a metric for binding
fn prepare(metric: &Metric) -> Result<(MetricKey, Json<serde_json::Value>)> {
    metric.ensure_storable()?;
    let value = metric.value.to_json()?;
    Ok((metric.key(), Json(value)))
}

fn decode_row(metric_type: MetricType, name: String, value: &serde_json::Value) -> Result<Metric> {
    let value = MetricValue::from_json(metric_type, value)
        .with_context(|| format!("stored {}/{}", metric_type, name))?;
    Ok(Metric::new(name, value))
}

#[async_trait]
impl MetricRepository for PostgresRepository {
    async fn update(&self, ctx: &Context, metric: &Metric) -> Result<()> {
        let (key, value) = prepare(metric)?;

        ctx.run("postgres update", async {
            sqlx::query(UPSERT_METRIC)
                .bind(key.metric_type.as_str())
                .bind(&key.name)
                .bind(value)
                .execute(self.pool())
                .await
                .map_err(|e| Error::from(e).context(format!("upsert {}", key)))?;
            trace!(key = %key, "Upserted metric");
            Ok(())
        })
        .await
    }

    async fn update_batch(&self, ctx: &Context, metrics: &[Metric]) -> Result<()> {
        // Everything that can be checked without the database fails before BEGIN
        let prepared = metrics
            .iter()
            .enumerate()
            .map(|(idx, metric)| prepare(metric).with_context(|| format!("batch item {}", idx)))
            .collect::<Result<Vec<_>>>()?;

        if prepared.is_empty() {
            return Ok(());
        }

        ctx.run("postgres update batch", async {
            let mut tx = self
                .pool()
                .begin()
                .await
                .map_err(|e| Error::Transaction(format!("begin: {}", e)))?;

            for (key, value) in prepared {
                let result = sqlx::query(UPSERT_METRIC)
                    .bind(key.metric_type.as_str())
                    .bind(&key.name)
                    .bind(value)
                    .execute(&mut *tx)
                    .await;

                if let Err(e) = result {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "Rollback failed");
                    }
                    return Err(Error::Transaction(format!("upsert {}: {}", key, e)));
                }
            }

            tx.commit()
                .await
                .map_err(|e| Error::Transaction(format!("commit: {}", e)))?;
            debug!(count = metrics.len(), "Committed metric batch");
            Ok(())
        })
        .await
    }

    async fn find(&self, ctx: &Context, metric_type: MetricType, name: &str) -> Result<Metric> {
        ctx.run("postgres find", async {
            let row = sqlx::query(SELECT_METRIC)
                .bind(metric_type.as_str())
                .bind(name)
                .fetch_optional(self.pool())
                .await
                .map_err(|e| Error::from(e).context(format!("select {}/{}", metric_type, name)))?;

            let row = row.ok_or_else(|| Error::metric_not_found(MetricKey::new(metric_type, name)))?;
            let Json(value): Json<serde_json::Value> = row.try_get("m_value")?;
            decode_row(metric_type, name.to_string(), &value)
        })
        .await
    }

    async fn all(&self, ctx: &Context) -> Result<Vec<Metric>> {
        ctx.run("postgres all", async {
            let rows = sqlx::query(SELECT_ALL_METRICS)
                .fetch_all(self.pool())
                .await
                .map_err(|e| Error::from(e).context("select all metrics"))?;

            rows.iter()
                .map(|row| {
                    let raw_type: String = row.try_get("m_type")?;
                    let name: String = row.try_get("m_name")?;
                    let Json(value): Json<serde_json::Value> = row.try_get("m_value")?;
                    let metric_type: MetricType = raw_type
                        .parse()
                        .map_err(|e: Error| Error::Conversion(e.to_string()))?;
                    decode_row(metric_type, name, &value)
                })
                .collect()
        })
        .await
    }

    async fn check_connection(&self, ctx: &Context) -> Result<()> {
        ctx.run("postgres ping", async {
            let mut conn = self
                .pool()
                .acquire()
                .await
                .map_err(|e| Error::Connection(e.to_string()))?;
            conn.ping()
                .await
                .map_err(|e| Error::Connection(e.to_string()))
        })
        .await
    }
}
