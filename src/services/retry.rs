//! Retry with exponential backoff for transient infrastructure errors.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::models::RetryConfig;

/// Exponential backoff for transient infrastructure errors.
///
/// Attempt `n` (0-indexed) waits `initial_backoff_ms * 2^n`, capped at
/// `max_backoff_ms`. Only [`DomainError::is_transient`] errors are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// A policy that runs the operation exactly once.
    pub const fn none() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(operation = operation_name, retries = attempt, "Operation succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if !self.should_retry(&err, attempt) {
                        if attempt >= self.max_retries && err.is_transient() {
                            warn!(operation = operation_name, attempts = attempt + 1, error = %err, "Retries exhausted");
                        }
                        return Err(err);
                    }

                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    fn should_retry(&self, error: &DomainError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_transient()
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.initial_backoff_ms, config.max_backoff_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::new(5, 1000, 6000);

        assert_eq!(policy.calculate_backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(4000));
        assert_eq!(policy.calculate_backoff(3), Duration::from_millis(6000));
        assert_eq!(policy.calculate_backoff(40), Duration::from_millis(6000));
    }

    #[test]
    fn test_only_transient_errors_are_retried() {
        let policy = RetryPolicy::new(3, 10, 100);

        assert!(policy.should_retry(&DomainError::TransientInfra("timeout".into()), 0));
        assert!(!policy.should_retry(&DomainError::Validation("bad".into()), 0));
        assert!(!policy.should_retry(&DomainError::TransientInfra("timeout".into()), 3));
    }

    #[tokio::test]
    async fn test_execute_retries_until_success() {
        let policy = RetryPolicy::new(3, 1, 5);
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute("flaky", || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(DomainError::TransientInfra("busy".into()))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_gives_up_after_max_retries() {
        let policy = RetryPolicy::new(2, 1, 5);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .execute("down", || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DomainError::TransientInfra("down".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(DomainError::TransientInfra(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_does_not_retry_permanent_errors() {
        let policy = RetryPolicy::new(3, 1, 5);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .execute("invalid", || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DomainError::Validation("not a pdf".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
