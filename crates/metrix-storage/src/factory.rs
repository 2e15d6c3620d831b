//! Backend selection from configuration

use crate::{FileRepository, InMemoryRepository, PostgresRepository};
use metrix_config::{StorageBackend, StorageConfig};
use metrix_core::{Context, Result};
use metrix_ports::MetricRepositoryRef;
use std::sync::Arc;
use tracing::info;

/// The configured backend, kept concrete so shutdown can reach it
#[derive(Debug, Clone)]
pub enum Storage {
    Memory(Arc<InMemoryRepository>),
    File(Arc<FileRepository>),
    Postgres(Arc<PostgresRepository>),
}

impl Storage {
    /// Build and start the backend selected by `config.backend`
    pub async fn open(ctx: &Context, config: &StorageConfig) -> Result<Self> {
        info!(backend = config.backend.as_str(), "Opening metric storage");
        let storage = match config.backend {
            StorageBackend::Memory => Storage::Memory(Arc::new(InMemoryRepository::new())),
            StorageBackend::File => {
                Storage::File(Arc::new(FileRepository::open(ctx, &config.file).await?))
            }
            StorageBackend::Postgres => Storage::Postgres(Arc::new(
                PostgresRepository::connect(ctx, &config.postgres).await?,
            )),
        };
        Ok(storage)
    }

    pub fn backend(&self) -> StorageBackend {
        match self {
            Storage::Memory(_) => StorageBackend::Memory,
            Storage::File(_) => StorageBackend::File,
            Storage::Postgres(_) => StorageBackend::Postgres,
        }
    }

    /// The backend behind the repository port
    pub fn repository(&self) -> MetricRepositoryRef {
        match self {
            Storage::Memory(repo) => repo.clone(),
            Storage::File(repo) => repo.clone(),
            Storage::Postgres(repo) => repo.clone(),
        }
    }

    /// Stop background work and release resources.
    ///
    /// Flushes the journal for the file backend and closes the pool for
    /// PostgreSQL; nothing to do in memory.
    pub async fn shutdown(&self) -> Result<()> {
        match self {
            Storage::Memory(_) => Ok(()),
            Storage::File(repo) => repo.shutdown().await,
            Storage::Postgres(repo) => {
                repo.close().await;
                Ok(())
            }
        }
    }
}
