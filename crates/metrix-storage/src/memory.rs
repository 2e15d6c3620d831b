//! In-memory metric repository
//!
//! A nested map `type -> name -> value` guarded by one reader/writer lock.
//! Single writes and batches both go through [`apply`], which never locks;
//! the public entry point owns the only lock acquisition. The file backend
//! reuses the same store through [`InMemoryRepository::with_store`].

use async_trait::async_trait;
use metrix_core::{Context, Error, Metric, MetricKey, MetricType, MetricValue, Result, ResultExt};
use metrix_ports::MetricRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// `type -> name -> value`
pub type Store = HashMap<MetricType, HashMap<String, MetricValue>>;

/// Lock-guarded store shared between a cache and its owner
pub type SharedStore = Arc<RwLock<Store>>;

/// Thread-safe key-value cache keyed by (type, name)
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    store: SharedStore,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository over an existing store
    pub fn with_store(store: SharedStore) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Number of stored metrics across both types
    pub async fn len(&self) -> usize {
        self.store.read().await.values().map(HashMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Write already-validated metrics under one exclusive lock
    pub(crate) async fn load(&self, metrics: Vec<Metric>) {
        let mut store = self.store.write().await;
        for metric in &metrics {
            apply(&mut store, metric);
        }
    }
}

/// Store `metric` verbatim. Caller holds the write lock.
pub(crate) fn apply(store: &mut Store, metric: &Metric) {
    store
        .entry(metric.metric_type())
        .or_default()
        .insert(metric.name.clone(), metric.value);
}

/// Copy every entry out of the store, ordered by key
pub(crate) fn snapshot(store: &Store) -> Vec<Metric> {
    let mut metrics: Vec<Metric> = store
        .values()
        .flat_map(|by_name| {
            by_name
                .iter()
                .map(|(name, value)| Metric::new(name.clone(), *value))
        })
        .collect();
    metrics.sort_by_key(Metric::key);
    metrics
}

/// Check every batch item before any of them is applied
pub(crate) fn ensure_batch_storable(metrics: &[Metric]) -> Result<()> {
    for (idx, metric) in metrics.iter().enumerate() {
        metric
            .ensure_storable()
            .with_context(|| format!("batch item {}", idx))?;
    }
    Ok(())
}

#[async_trait]
impl MetricRepository for InMemoryRepository {
    async fn update(&self, ctx: &Context, metric: &Metric) -> Result<()> {
        metric.ensure_storable()?;
        ctx.run("memory update", async {
            let mut store = self.store.write().await;
            apply(&mut store, metric);
            trace!(key = %metric.key(), value = %metric.value, "Stored metric");
            Ok(())
        })
        .await
    }

    async fn update_batch(&self, ctx: &Context, metrics: &[Metric]) -> Result<()> {
        ensure_batch_storable(metrics)?;
        ctx.run("memory update batch", async {
            let mut store = self.store.write().await;
            for metric in metrics {
                apply(&mut store, metric);
            }
            trace!(count = metrics.len(), "Stored metric batch");
            Ok(())
        })
        .await
    }

    async fn find(&self, ctx: &Context, metric_type: MetricType, name: &str) -> Result<Metric> {
        ctx.run("memory find", async {
            let store = self.store.read().await;
            store
                .get(&metric_type)
                .and_then(|by_name| by_name.get(name))
                .map(|value| Metric::new(name, *value))
                .ok_or_else(|| Error::metric_not_found(MetricKey::new(metric_type, name)))
        })
        .await
    }

    async fn all(&self, ctx: &Context) -> Result<Vec<Metric>> {
        ctx.run("memory all", async {
            let store = self.store.read().await;
            Ok(snapshot(&store))
        })
        .await
    }

    async fn check_connection(&self, ctx: &Context) -> Result<()> {
        ctx.check("memory ping")
    }
}
