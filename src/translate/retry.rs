//! Bounded retry with linear backoff for generation work units

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{Result, TranslateError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay after failed attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
    /// Upper bound on one whole attempt, request and checks included.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// the attempt ceiling is reached. The closure receives the 1-based attempt
    /// number. Exhaustion is reported as `Exhausted` naming `unit`.
    pub async fn run<T, F, Fut>(&self, unit: &str, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let outcome = match tokio::time::timeout(self.attempt_timeout, operation(attempt)).await
            {
                Ok(result) => result,
                Err(_) => Err(TranslateError::Timeout(self.attempt_timeout)),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(unit, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    warn!(unit, attempt, max_attempts, error = %err, "attempt failed");
                    last_error = Some(err);
                    if attempt < max_attempts {
                        tokio::time::sleep(self.delay_after(attempt)).await;
                    }
                }
            }
        }

        Err(TranslateError::Exhausted {
            unit: unit.to_string(),
            attempts: max_attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
