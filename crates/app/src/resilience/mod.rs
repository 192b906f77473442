//! Deadlines, bounded retry and circuit breaking for collaborator calls.

use std::{fmt::Display, future::Future, time::Duration};

use tokio::time::sleep;
use tracing::warn;

mod circuit_breaker;
mod retry;

pub use circuit_breaker::*;
pub use retry::*;

/// Errors that can tell whether trying again might succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Settings shared by every HTTP collaborator client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResilienceConfig {
    /// Deadline for a single HTTP request, connect included.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub breaker: CircuitBreakerConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Runs calls through a circuit breaker, retrying transient failures.
#[derive(Debug)]
pub struct Resilient {
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl Resilient {
    #[must_use]
    pub fn new(name: &'static str, config: &ResilienceConfig) -> Self {
        Self {
            retry: config.retry,
            breaker: CircuitBreaker::new(name, config.breaker),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Run `operation`, retrying while it fails transiently and the breaker
    /// stays closed.
    ///
    /// Non-transient errors count as a healthy collaborator for the breaker and
    /// are returned immediately.
    ///
    /// # Errors
    ///
    /// Returns the last error from `operation`, or `E::from(CircuitOpen)` when the
    /// breaker rejects an attempt.
    pub async fn call<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display + From<CircuitOpen>,
    {
        let mut attempt = 0;

        loop {
            self.breaker.try_acquire()?;

            let error = match operation().await {
                Ok(value) => {
                    self.breaker.record_success();

                    return Ok(value);
                }
                Err(error) if !error.is_transient() => {
                    self.breaker.record_success();

                    return Err(error);
                }
                Err(error) => error,
            };

            self.breaker.record_failure();

            if attempt >= self.retry.max_retries {
                return Err(error);
            }

            let delay = self.retry.delay_for_attempt(attempt);

            warn!(
                attempt,
                delay_ms = delay.as_millis(),
                "transient collaborator failure, retrying: {error}"
            );

            sleep(delay).await;

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use thiserror::Error;

    use super::*;

    #[derive(Debug, Error, PartialEq, Eq)]
    enum TestError {
        #[error("flaky")]
        Flaky,

        #[error("gone")]
        Gone,

        #[error("open")]
        Open,
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Flaky)
        }
    }

    impl From<CircuitOpen> for TestError {
        fn from(_: CircuitOpen) -> Self {
            Self::Open
        }
    }

    fn resilient(max_retries: u32, failure_threshold: u32) -> Resilient {
        Resilient::new(
            "test",
            &ResilienceConfig {
                timeout: Duration::from_secs(1),
                retry: RetryPolicy {
                    max_retries,
                    initial_delay: Duration::from_millis(10),
                    max_delay: Duration::from_millis(100),
                },
                breaker: CircuitBreakerConfig {
                    failure_threshold,
                    open_timeout: Duration::from_secs(30),
                    success_threshold: 1,
                },
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_until_success() {
        let calls = &AtomicU32::new(0);
        let resilient = resilient(3, 10);

        let result = resilient
            .call(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Flaky)
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = &AtomicU32::new(0);
        let resilient = resilient(2, 10);

        let result: Result<(), TestError> = resilient
            .call(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Flaky)
            })
            .await;

        assert_eq!(result, Err(TestError::Flaky));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_permanent_errors() {
        let calls = &AtomicU32::new(0);
        let resilient = resilient(3, 1);

        let result: Result<(), TestError> = resilient
            .call(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Gone)
            })
            .await;

        assert_eq!(result, Err(TestError::Gone));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resilient.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn open_breaker_fails_fast() {
        let calls = &AtomicU32::new(0);
        let resilient = resilient(5, 2);

        let result: Result<(), TestError> = resilient
            .call(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Flaky)
            })
            .await;

        assert_eq!(result, Err(TestError::Open));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resilient.state(), CircuitState::Open);

        let result: Result<(), TestError> = resilient.call(move || async move { Ok(()) }).await;

        assert_eq!(result, Err(TestError::Open));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
