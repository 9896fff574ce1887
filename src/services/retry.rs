//! Bounded exponential backoff for transport-level failures
//!
//! Only `AppError::Transient` is retried. Conflicts, validation failures and
//! ambiguous write outcomes are returned on the first occurrence.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::{config::BookingConfig, error::AppResult};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &BookingConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based), without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        let spread = delay.as_millis() as u64 / 5;
        if spread == 0 {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(0..=spread);
        (delay + Duration::from_millis(jitter)).min(self.max_delay.max(delay))
    }

    /// Run `op`, retrying transient failures
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = self.jittered(self.backoff(attempt));
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    tracing::error!(operation, attempts = self.max_attempts, error = %e, "Retries exhausted");
                    return Err(e);
                }
                other => return other,
            }
        }
    }
}
