//! Bounded retry loops for backend setup and liveness checks
//!
//! The wait between attempts comes from [`RetryConfig::delay_for_attempt`],
//! so the loop keeps no backoff state beyond the attempt counter.

use metrix_config::RetryConfig;
use metrix_core::{Context, Error, Result};
use metrix_ports::MetricRepository;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Run `op` until it succeeds or `policy.max_attempts` attempts have failed.
///
/// `op` receives the 1-based attempt number. The last error is returned with
/// the operation name and attempt count prefixed. Cancellation or expiry of
/// `ctx` stops the loop immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    ctx: &Context,
    policy: &RetryConfig,
    operation: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        ctx.check(operation)?;

        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt >= max_attempts => {
                warn!(operation, attempts = attempt, error = %e, "Giving up");
                return Err(e.context(format!("{} failed after {} attempts", operation, attempt)));
            }
            Err(e) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                ctx.sleep(operation, delay).await?;
                attempt += 1;
            }
        }
    }
}

/// Probe `repo` until it answers, giving each attempt its own `ping_timeout`.
///
/// Any failure other than cancellation of `ctx` is reported as
/// [`Error::Connection`] once every attempt is spent.
pub async fn check_connection_with_retry<R>(
    ctx: &Context,
    repo: &R,
    policy: &RetryConfig,
    ping_timeout: Duration,
) -> Result<()>
where
    R: MetricRepository + ?Sized,
{
    retry_with_backoff(ctx, policy, "check connection", |_| {
        let attempt_ctx = ctx.child_with_timeout(ping_timeout);
        async move { repo.check_connection(&attempt_ctx).await }
    })
    .await
    .map_err(|e| match e {
        Error::Cancelled(_) | Error::Connection(_) => e,
        other => Error::Connection(other.to_string()),
    })
}
