//! Mock repository implementations for testing

use async_trait::async_trait;
use metrix_core::{Context, Error, Metric, MetricKey, MetricType, MetricValue, Result};
use metrix_ports::MetricRepository;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

// ============================================================================
// Mock Metric Repository
// ============================================================================

/// A mock metric repository for testing
///
/// Stores metrics in a HashMap behind a RwLock. Errors set with
/// [`MockMetricRepository::fail_find`] or [`MockMetricRepository::fail_update_batch`]
/// are returned by every call until cleared. Batches are applied atomically.
#[derive(Debug, Default)]
pub struct MockMetricRepository {
    metrics: RwLock<HashMap<MetricKey, MetricValue>>,
    find_error: Mutex<Option<Error>>,
    update_batch_error: Mutex<Option<Error>>,
    find_calls: AtomicUsize,
    update_batch_calls: AtomicUsize,
    batches: Mutex<Vec<Vec<Metric>>>,
}

impl MockMetricRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `metrics`
    pub fn with_metrics(metrics: impl IntoIterator<Item = Metric>) -> Self {
        let repo = Self::new();
        {
            let mut store = repo.metrics.write().unwrap();
            for metric in metrics {
                store.insert(metric.key(), metric.value);
            }
        }
        repo
    }

    pub fn fail_find(&self, error: Error) {
        *self.find_error.lock().unwrap() = Some(error);
    }

    pub fn fail_update_batch(&self, error: Error) {
        *self.update_batch_error.lock().unwrap() = Some(error);
    }

    pub fn clear_failures(&self) {
        *self.find_error.lock().unwrap() = None;
        *self.update_batch_error.lock().unwrap() = None;
    }

    /// Stored value for a key, bypassing failure injection
    pub fn get(&self, metric_type: MetricType, name: &str) -> Option<Metric> {
        self.metrics
            .read()
            .unwrap()
            .get(&MetricKey::new(metric_type, name))
            .map(|value| Metric::new(name, *value))
    }

    /// Every stored metric ordered by key
    pub fn snapshot(&self) -> Vec<Metric> {
        let mut metrics: Vec<Metric> = self
            .metrics
            .read()
            .unwrap()
            .iter()
            .map(|(key, value)| Metric::new(key.name.clone(), *value))
            .collect();
        metrics.sort_by_key(Metric::key);
        metrics
    }

    pub fn count(&self) -> usize {
        self.metrics.read().unwrap().len()
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn update_batch_calls(&self) -> usize {
        self.update_batch_calls.load(Ordering::SeqCst)
    }

    /// Batches that were successfully applied, in call order
    pub fn applied_batches(&self) -> Vec<Vec<Metric>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricRepository for MockMetricRepository {
    async fn update(&self, ctx: &Context, metric: &Metric) -> Result<()> {
        ctx.check("mock update")?;
        metric.ensure_storable()?;
        self.metrics
            .write()
            .unwrap()
            .insert(metric.key(), metric.value);
        Ok(())
    }

    async fn update_batch(&self, ctx: &Context, metrics: &[Metric]) -> Result<()> {
        self.update_batch_calls.fetch_add(1, Ordering::SeqCst);
        ctx.check("mock update batch")?;
        if let Some(error) = self.update_batch_error.lock().unwrap().clone() {
            return Err(error);
        }
        for metric in metrics {
            metric.ensure_storable()?;
        }

        let mut store = self.metrics.write().unwrap();
        for metric in metrics {
            store.insert(metric.key(), metric.value);
        }
        self.batches.lock().unwrap().push(metrics.to_vec());
        Ok(())
    }

    async fn find(&self, ctx: &Context, metric_type: MetricType, name: &str) -> Result<Metric> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        ctx.check("mock find")?;
        if let Some(error) = self.find_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.get(metric_type, name)
            .ok_or_else(|| Error::metric_not_found(MetricKey::new(metric_type, name)))
    }

    async fn all(&self, ctx: &Context) -> Result<Vec<Metric>> {
        ctx.check("mock all")?;
        Ok(self.snapshot())
    }

    async fn check_connection(&self, ctx: &Context) -> Result<()> {
        ctx.check("mock ping")
    }
}

// ============================================================================
// Flaky Probe
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum ProbeBehavior {
    /// Fail this many times, then succeed
    FailTimes(u32),
    AlwaysFail,
    /// Never answer; only the context deadline ends the call
    Hang,
}

/// Repository stand-in whose `check_connection` follows a script
///
/// Data operations are inert: writes succeed, reads find nothing.
#[derive(Debug)]
pub struct FlakyProbe {
    behavior: ProbeBehavior,
    attempts: AtomicU32,
}

impl FlakyProbe {
    /// Fail the first `failures` probes, succeed afterwards
    pub fn failing_times(failures: u32) -> Self {
        Self::with_behavior(ProbeBehavior::FailTimes(failures))
    }

    pub fn always_failing() -> Self {
        Self::with_behavior(ProbeBehavior::AlwaysFail)
    }

    pub fn hanging() -> Self {
        Self::with_behavior(ProbeBehavior::Hang)
    }

    fn with_behavior(behavior: ProbeBehavior) -> Self {
        Self {
            behavior,
            attempts: AtomicU32::new(0),
        }
    }

    /// Number of probes received so far
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricRepository for FlakyProbe {
    async fn update(&self, _ctx: &Context, _metric: &Metric) -> Result<()> {
        Ok(())
    }

    async fn update_batch(&self, _ctx: &Context, _metrics: &[Metric]) -> Result<()> {
        Ok(())
    }

    async fn find(&self, _ctx: &Context, metric_type: MetricType, name: &str) -> Result<Metric> {
        Err(Error::metric_not_found(MetricKey::new(metric_type, name)))
    }

    async fn all(&self, _ctx: &Context) -> Result<Vec<Metric>> {
        Ok(Vec::new())
    }

    async fn check_connection(&self, ctx: &Context) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        match self.behavior {
            ProbeBehavior::FailTimes(failures) if attempt > failures => Ok(()),
            ProbeBehavior::FailTimes(_) | ProbeBehavior::AlwaysFail => Err(Error::Connection(
                format!("probe attempt {} refused", attempt),
            )),
            ProbeBehavior::Hang => {
                ctx.run("probe", std::future::pending::<Result<()>>())
                    .await
            }
        }
    }
}
