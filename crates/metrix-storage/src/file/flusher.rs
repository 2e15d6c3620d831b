//! Background journal flusher
//!
//! Rewrites the journal on a fixed interval until stopped. An explicit
//! [`FlushTask::stop`] waits for the task to exit (bounded by the drain
//! timeout). Dropping the task handle without stopping it makes the task run
//! one final flush before exiting.

use super::FileInner;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Why the flush loop is exiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    /// `stop()` was called; the caller flushes afterwards
    Requested,
    /// The owning repository was dropped
    OwnerDropped,
}

/// Handle to the spawned flush loop
pub(crate) struct FlushTask {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    drain_timeout: Duration,
}

impl FlushTask {
    pub(crate) fn spawn(inner: Arc<FileInner>, period: Duration, drain_timeout: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(inner, period, shutdown_rx));
        Self {
            shutdown_tx,
            handle: Some(handle),
            drain_timeout,
        }
    }

    /// Signal the loop and wait for it to exit, aborting after the drain timeout
    pub(crate) async fn stop(mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        if self.shutdown_tx.send(true).is_err() {
            debug!("Flush task already exited");
            return;
        }

        let abort = handle.abort_handle();
        match tokio::time::timeout(self.drain_timeout, handle).await {
            Ok(Ok(())) => debug!("Flush task drained"),
            Ok(Err(e)) if e.is_cancelled() => debug!("Flush task was cancelled"),
            Ok(Err(e)) => warn!(error = %e, "Flush task panicked"),
            Err(_) => {
                warn!(
                    timeout_ms = self.drain_timeout.as_millis() as u64,
                    "Flush task did not stop in time, aborting"
                );
                abort.abort();
            }
        }
    }
}

async fn run(inner: Arc<FileInner>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    // First tick one period from now; flushing right away would only rewrite
    // what restore just read.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        path = %inner.path.display(),
        interval_ms = period.as_millis() as u64,
        "Journal flush task started"
    );

    let reason = loop {
        tokio::select! {
            biased;
            reason = wait_for_shutdown(&mut shutdown_rx) => break reason,
            _ = interval.tick() => inner.flush_logged().await,
        }
    };

    if reason == StopReason::OwnerDropped {
        debug!("Repository dropped, performing final flush");
        inner.flush_logged().await;
    }
    info!(path = %inner.path.display(), "Journal flush task stopped");
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) -> StopReason {
    loop {
        if *rx.borrow_and_update() {
            return StopReason::Requested;
        }
        if rx.changed().await.is_err() {
            return StopReason::OwnerDropped;
        }
    }
}
