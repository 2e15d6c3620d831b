//! File-journaled metric repository
//!
//! Owns an [`InMemoryRepository`] and mirrors its contents to a journal file.
//!
//! # Module Structure
//! - `mod.rs` - FileRepository and the flush path
//! - `journal.rs` - line codec and atomic rewrite
//! - `flusher.rs` - interval flush task

mod flusher;
pub mod journal;


use crate::memory::{snapshot, InMemoryRepository};
use crate::retry::retry_with_backoff;
use async_trait::async_trait;
use flusher::FlushTask;
use metrix_config::FileStorageConfig;
use metrix_core::{Context, Error, Metric, MetricType, Result, ResultExt};
use metrix_ports::MetricRepository;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// State shared between the repository and its flush task
pub(crate) struct FileInner {
    cache: InMemoryRepository,
    path: PathBuf,
    /// Serializes journal rewrites
    flush_lock: Mutex<()>,
}

impl FileInner {
    /// Rewrite the journal from the current in-memory snapshot.
    ///
    /// The snapshot is taken after the flush lock is held, so whichever flush
    /// finishes last carries the latest state.
    async fn flush(&self) -> Result<()> {
        let _guard = self.flush_lock.lock().await;
        let metrics = {
            let store = self.cache.store().read().await;
            snapshot(&store)
        };
        let bytes = journal::encode(&metrics)?;
        journal::write_atomic(&self.path, &bytes)
            .await
            .map_err(|e| Error::from(e).context(format!("write journal {}", self.path.display())))?;
        debug!(path = %self.path.display(), count = metrics.len(), "Journal flushed");
        Ok(())
    }

    /// Flush, logging instead of returning the error.
    ///
    /// Memory stays authoritative; the next flush retries the write.
    async fn flush_logged(&self) {
        if let Err(e) = self.flush().await {
            warn!(path = %self.path.display(), error = %e, "Journal flush failed");
        }
    }
}

/// In-memory cache with a JSON-lines journal for durability
pub struct FileRepository {
    inner: Arc<FileInner>,
    synchronous: bool,
    flusher: Mutex<Option<FlushTask>>,
}

impl std::fmt::Debug for FileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRepository")
            .field("path", &self.inner.path)
            .field("synchronous", &self.synchronous)
            .finish_non_exhaustive()
    }
}

impl FileRepository {
    /// Prepare the journal, optionally restore it, and start flushing.
    ///
    /// Failing to create the journal after every setup attempt is fatal.
    pub async fn open(ctx: &Context, config: &FileStorageConfig) -> Result<Self> {
        Self::open_with_cache(ctx, config, InMemoryRepository::new()).await
    }

    /// Like [`FileRepository::open`], journaling an existing cache
    pub async fn open_with_cache(
        ctx: &Context,
        config: &FileStorageConfig,
        cache: InMemoryRepository,
    ) -> Result<Self> {
        let path = config.path.clone();

        retry_with_backoff(ctx, &config.setup_retry, "prepare journal", |_| {
            let path = path.clone();
            async move {
                journal::ensure_exists(&path)
                    .await
                    .map_err(|e| Error::from(e).context(path.display()))
            }
        })
        .await?;

        let inner = Arc::new(FileInner {
            cache,
            path,
            flush_lock: Mutex::new(()),
        });

        if config.restore {
            restore(ctx, &inner).await?;
        }

        let synchronous = config.is_synchronous();
        let flusher = if synchronous {
            None
        } else {
            Some(FlushTask::spawn(
                Arc::clone(&inner),
                config.store_interval(),
                config.drain_timeout(),
            ))
        };

        info!(
            path = %inner.path.display(),
            synchronous,
            restore = config.restore,
            "File storage initialized"
        );

        Ok(Self {
            inner,
            synchronous,
            flusher: Mutex::new(flusher),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    /// Rewrite the journal now, returning any I/O error
    pub async fn flush_now(&self, ctx: &Context) -> Result<()> {
        ctx.run("journal flush", self.inner.flush()).await
    }

    /// Stop the flush task (if any) and write the journal one last time.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) -> Result<()> {
        let task = self.flusher.lock().await.take();
        if let Some(task) = task {
            task.stop().await;
        }
        self.inner.flush().await?;
        info!(path = %self.inner.path.display(), "File storage shut down");
        Ok(())
    }

    /// Post-write hook: in synchronous mode the journal follows every write
    async fn after_write(&self, ctx: &Context) {
        if !self.synchronous {
            return;
        }
        if let Err(e) = ctx.run("journal flush", self.inner.flush()).await {
            warn!(path = %self.inner.path.display(), error = %e, "Journal flush failed");
        }
    }
}

async fn restore(ctx: &Context, inner: &FileInner) -> Result<()> {
    let content = ctx
        .run("restore journal", async {
            journal::read(&inner.path).await.map_err(Error::from)
        })
        .await
        .with_context(|| format!("read journal {}", inner.path.display()))?;

    let decoded = journal::decode(&content);
    let restored = decoded.metrics.len();
    inner.cache.load(decoded.metrics).await;

    info!(
        path = %inner.path.display(),
        restored,
        skipped = decoded.skipped,
        "Journal restored"
    );
    Ok(())
}

#[async_trait]
impl MetricRepository for FileRepository {
    async fn update(&self, ctx: &Context, metric: &Metric) -> Result<()> {
        self.inner.cache.update(ctx, metric).await?;
        self.after_write(ctx).await;
        Ok(())
    }

    async fn update_batch(&self, ctx: &Context, metrics: &[Metric]) -> Result<()> {
        self.inner.cache.update_batch(ctx, metrics).await?;
        self.after_write(ctx).await;
        Ok(())
    }

    async fn find(&self, ctx: &Context, metric_type: MetricType, name: &str) -> Result<Metric> {
        self.inner.cache.find(ctx, metric_type, name).await
    }

    async fn all(&self, ctx: &Context) -> Result<Vec<Metric>> {
        self.inner.cache.all(ctx).await
    }

    async fn check_connection(&self, ctx: &Context) -> Result<()> {
        ctx.run("journal ping", async {
            tokio::fs::metadata(&self.inner.path)
                .await
                .map(|_| ())
                .map_err(|e| {
                    Error::Connection(format!("journal {}: {}", self.inner.path.display(), e))
                })
        })
        .await
    }
}
