//! PostgreSQL storage implementation
//!
//! # Module Structure
//! - `mod.rs` - PostgresRepository, pool setup and schema
//! - `metric_repo.rs` - MetricRepository implementation

mod metric_repo;

#[cfg(test)]
mod metric_repo_tests;

use crate::retry::check_connection_with_retry;
use metrix_config::PostgresConfig;
use metrix_core::{Context, Error, Result, ResultExt};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

/// Idempotent schema for the metrics table
pub(crate) const CREATE_METRICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS metrics (
    id SERIAL PRIMARY KEY,
    m_type TEXT NOT NULL,
    m_name TEXT NOT NULL,
    m_value JSONB NOT NULL,
    CONSTRAINT unique_type_name UNIQUE (m_type, m_name)
)
"#;

/// PostgreSQL-backed repository with a connection pool
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Build the pool, create the table and wait for the database to answer.
    ///
    /// Both schema creation and the connectivity check are fatal on failure.
    pub async fn connect(ctx: &Context, config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(&config.url)
            .map_err(|e| Error::InvalidConfig(format!("database url: {}", e)))?;

        let repo = Self {
            pool,
            config: config.clone(),
        };

        repo.create_schema(ctx).await?;
        repo.check_connection_with_retry(ctx).await?;

        info!(
            max_connections = config.max_connections,
            "PostgreSQL storage initialized"
        );
        Ok(repo)
    }

    /// Wrap an existing pool without running startup steps
    pub fn from_pool(pool: PgPool, config: PostgresConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the metrics table if it does not exist
    pub async fn create_schema(&self, ctx: &Context) -> Result<()> {
        ctx.run("create schema", async {
            sqlx::query(CREATE_METRICS_TABLE)
                .execute(&self.pool)
                .await
                .map_err(Error::from)
        })
        .await
        .context("create metrics table")?;

        debug!("Metrics table ready");
        Ok(())
    }

    /// Ping with the configured bounded linear backoff
    pub async fn check_connection_with_retry(&self, ctx: &Context) -> Result<()> {
        check_connection_with_retry(
            ctx,
            self,
            &self.config.ping_retry,
            self.config.ping_timeout(),
        )
        .await
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}
