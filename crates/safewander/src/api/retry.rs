//! Linear-backoff retries for transient remote failures.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::config::RetryConfig;
use crate::error::Result;

/// How often, and how patiently, a remote call is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

/// Delay schedule between attempts.
pub trait BackoffPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    fn delay_for_attempt(&self, attempt: usize) -> Duration;
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_backoff_ms: config.base_backoff_ms,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_backoff_ms: 0,
        }
    }

    /// Total attempts, never less than one.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }
}

impl BackoffPolicy for RetryPolicy {
    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(attempt as u64))
    }
}

/// Run `f` until it succeeds, fails for good, or the attempts run out.
///
/// Only errors for which [`crate::Error::is_retryable`] holds are retried.
/// The last error is returned on exhaustion.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && e.is_retryable() => {
                let delay = policy.delay_for_attempt(attempt);
                debug!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    operation, attempt, attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
