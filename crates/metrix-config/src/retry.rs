//! Retry policy configuration
//!
//! The delay before the next attempt is a pure function of the attempt number,
//! so retry loops carry no mutable backoff state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the delay grows between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// Same delay after every failure
    #[default]
    Fixed,
    /// `initial_delay + step * (attempt - 1)`
    Linear,
}

/// Bounded retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt (ms)
    #[serde(default)]
    pub initial_delay_ms: u64,
    /// Growth per attempt for linear backoff (ms)
    #[serde(default)]
    pub step_ms: u64,
    #[serde(default)]
    pub backoff: BackoffKind,
}

impl RetryConfig {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: delay.as_millis() as u64,
            step_ms: 0,
            backoff: BackoffKind::Fixed,
        }
    }

    pub fn linear(max_attempts: u32, initial_delay: Duration, step: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: initial_delay.as_millis() as u64,
            step_ms: step.as_millis() as u64,
            backoff: BackoffKind::Linear,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms;
        let millis = match self.backoff {
            BackoffKind::Fixed => base,
            BackoffKind::Linear => {
                let steps = u64::from(attempt.saturating_sub(1));
                base.saturating_add(self.step_ms.saturating_mul(steps))
            }
        };
        Duration::from_millis(millis)
    }

    pub fn validate(&self, field: &str) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err(format!("{}.max_attempts must be greater than 0", field));
        }
        Ok(())
    }
}
