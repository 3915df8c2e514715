//! Async utilities
//!
//! Retry with exponential backoff, shared by the web-facing collaborators.

use crate::error::InquestResult;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: usize,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier (exponential backoff)
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 16000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Retry an async operation with exponential backoff.
///
/// Only errors that report themselves recoverable are retried; anything
/// else is returned immediately. A recoverable error may carry its own
/// delay hint (rate limit responses do), which overrides the schedule.
pub async fn retry_async<T, F, Fut>(
    mut operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> InquestResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = InquestResult<T>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay_ms;

    loop {
        attempt += 1;

        debug!(
            operation = operation_name,
            attempt = attempt,
            max_attempts = config.max_attempts,
            "Attempting operation"
        );

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_recoverable() || attempt >= config.max_attempts {
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        error = %err,
                        "Operation failed"
                    );
                    return Err(err);
                }

                let base_delay = err.retry_delay_ms().unwrap_or(delay);
                let actual_delay = if config.jitter {
                    let jitter_factor = 0.1;
                    let jitter = (fastrand::f64() - 0.5) * 2.0 * jitter_factor;
                    ((base_delay as f64) * (1.0 + jitter)) as u64
                } else {
                    base_delay
                };

                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    error = %err,
                    delay_ms = actual_delay,
                    "Operation failed, retrying"
                );

                sleep(Duration::from_millis(actual_delay)).await;

                delay = ((delay as f64) * config.backoff_multiplier) as u64;
                delay = delay.min(config.max_delay_ms);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorContext, InquestError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rate_limited() -> InquestError {
        InquestError::RateLimit {
            message: "slow down".to_string(),
            retry_after_ms: Some(1),
            context: ErrorContext::new("test"),
        }
    }

    #[tokio::test]
    async fn retries_recoverable_errors_until_success() {
        let calls = AtomicUsize::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
            jitter: false,
        };

        let result = retry_async(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(rate_limited())
                    } else {
                        Ok(42u32)
                    }
                }
            },
            &config,
            "test_op",
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_recoverable_errors_fail_immediately() {
        let calls = AtomicUsize::new(0);
        let config = RetryConfig::default();

        let result: InquestResult<()> = retry_async(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(crate::validation_error!("bad input", "test"))
                }
            },
            &config,
            "test_op",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
            jitter: false,
        };

        let result: InquestResult<()> = retry_async(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            },
            &config,
            "test_op",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
