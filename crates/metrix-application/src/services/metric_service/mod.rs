//! Metric push/pull use cases (protocol-agnostic)
//!
//! This module contains the MetricService, including:
//! - Validation of incoming metrics and boundary records
//! - Push pipeline: validate, merge duplicates, resolve counters, persist atomically
//! - Pull of single metrics and full snapshots
//! - Backend liveness

mod pull;
mod push;
mod validation;

use metrix_ports::MetricRepositoryRef;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Metric service (protocol-agnostic)
///
/// Owns counter and gauge semantics. Clones share the repository and the
/// push lock, so every clone serializes counter resolution with the others.
#[derive(Clone)]
pub struct MetricService {
    pub(super) storage: MetricRepositoryRef,
    /// Held from the first counter lookup until the batch is persisted
    pub(super) push_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for MetricService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricService")
            .field("storage", &"<MetricRepository>")
            .finish()
    }
}

impl MetricService {
    pub fn new(storage: MetricRepositoryRef) -> Self {
        Self {
            storage,
            push_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The repository this service writes through
    pub fn storage(&self) -> &MetricRepositoryRef {
        &self.storage
    }
}
