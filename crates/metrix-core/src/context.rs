//! Request context: deadline plus cancellation
//!
//! Every repository and service call takes a [`Context`]. Work is wrapped in
//! [`Context::run`], which races it against the deadline and the cancellation
//! token so a call blocked on I/O or on a lock returns promptly.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellable context carrying an optional deadline
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl Context {
    /// Context with no deadline that is never cancelled unless asked to
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            token: CancellationToken::new(),
        }
    }

    /// Derive a context that expires after `timeout` or at the parent's
    /// deadline, whichever comes first. Cancelling the parent cancels the child.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            token: self.token.child_token(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline (`None` when there is no deadline)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fail fast if the context is already cancelled or expired
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled(operation.to_string()));
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(Error::DeadlineExceeded(operation.to_string()));
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the deadline passes or the context is
    /// cancelled first. The future is dropped in that case.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(operation)?;

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled(operation.to_string())),
            _ = sleep_until(self.deadline) => Err(Error::DeadlineExceeded(operation.to_string())),
            result = fut => result,
        }
    }

    /// Cancellable sleep, used between retry attempts
    pub async fn sleep(&self, operation: &str, duration: Duration) -> Result<()> {
        self.run(operation, async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes_before_deadline() {
        let ctx = Context::with_timeout(Duration::from_secs(5));
        let value = ctx.run("fast", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_deadline_exceeded() {
        let ctx = Context::with_timeout(Duration::from_millis(20));
        let result = ctx
            .run("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(Error::DeadlineExceeded("slow".to_string())));
    }

    #[tokio::test]
    async fn test_run_cancelled() {
        let ctx = Context::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let result = ctx
            .run("blocked", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(Error::Cancelled("blocked".to_string())));
    }

    #[tokio::test]
    async fn test_expired_context_fails_without_polling() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let polled = AtomicBool::new(false);
        let ctx = Context::with_timeout(Duration::ZERO);
        let result = ctx
            .run("never", async {
                polled.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(Error::DeadlineExceeded(_))));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_child_takes_earliest_deadline() {
        let parent = Context::with_timeout(Duration::from_millis(50));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let parent = Context::with_timeout(Duration::from_secs(60));
        let child = parent.child_with_timeout(Duration::from_millis(50));
        assert!(child.deadline().unwrap() < parent.deadline().unwrap());
    }

    #[tokio::test]
    async fn test_parent_cancel_propagates_to_child() {
        let parent = Context::background();
        let child = parent.child_with_timeout(Duration::from_secs(60));
        parent.cancel();
        assert!(child.is_cancelled());
        assert!(matches!(child.check("op"), Err(Error::Cancelled(_))));
    }

    #[test]
    fn test_background_has_no_deadline() {
        let ctx = Context::background();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(ctx.check("op").is_ok());
    }
}
