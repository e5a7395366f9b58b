//! Bounded retry for rate-limited store calls.
//!
//! Each call moves through `Calling -> Succeeded | Backoff | Failed`, and
//! `Backoff -> Calling`. Only [`StoreError::RateLimited`] enters `Backoff`. The
//! pause is uniform in `[0, max_backoff]` on every attempt (no exponential
//! growth), and at most `max_retries` retries follow the first call. An optional
//! deadline bounds the whole sequence: an in-flight call is cancelled when it
//! passes, and a pause that would end after it fails immediately.

use crate::error::{Error, StoreError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, max_backoff: DEFAULT_MAX_BACKOFF }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    fn exceeded(&self) -> Error {
        Error::DeadlineExceeded { timeout: self.timeout }
    }
}

#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    deadline: Option<Deadline>,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, deadline: None }
    }

    /// Bound every call made through this retrier to `timeout` from now.
    /// A timeout too large to represent as an instant leaves the run unbounded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout).map(|at| Deadline { at, timeout });
        if self.deadline.is_none() {
            debug!(
                timeout_secs = timeout.as_secs(),
                "Timeout out of range, running without deadline"
            );
        }
        self
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or the
    /// retry budget runs out. The last error is returned on failure.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut retries = 0u32;

        loop {
            let outcome = match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline.at, call())
                    .await
                    .map_err(|_| deadline.exceeded())?,
                None => call().await,
            };

            let err = match outcome {
                Ok(value) => {
                    if retries > 0 {
                        debug!(operation, retries, "Store call succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_rate_limited() {
                return Err(err.into());
            }
            if retries >= self.policy.max_retries {
                warn!(operation, retries, "Retry budget exhausted while rate limited");
                return Err(err.into());
            }

            retries += 1;
            let delay = self.backoff();
            if let Some(deadline) = self.deadline {
                let resumes_in_time =
                    Instant::now().checked_add(delay).is_some_and(|resume| resume < deadline.at);
                if !resumes_in_time {
                    warn!(operation, retries, "Deadline reached while rate limited");
                    return Err(deadline.exceeded());
                }
            }

            debug!(
                operation,
                attempt = retries,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Rate limited, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn backoff(&self) -> Duration {
        let ceiling = self.policy.max_backoff.as_millis() as u64;
        Duration::from_millis(fastrand::u64(0..=ceiling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy { max_retries, max_backoff: Duration::from_millis(50) }
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limit_uses_whole_budget() {
        let calls = Cell::new(0);
        let retrier = Retrier::new(policy(3));

        let result: Result<(), _> = retrier
            .run("op", || {
                calls.set(calls.get() + 1);
                async { Err(StoreError::RateLimited("throttled".into())) }
            })
            .await;

        assert_eq!(calls.get(), 4);
        assert!(matches!(result, Err(Error::Store(StoreError::RateLimited(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let retrier = Retrier::new(policy(3));

        let result = retrier
            .run("op", || {
                let attempt = calls.get() + 1;
                calls.set(attempt);
                async move {
                    if attempt < 3 {
                        Err(StoreError::RateLimited("throttled".into()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn terminal_errors_are_not_retried() {
        let calls = Cell::new(0);
        let retrier = Retrier::new(policy(3));

        let result: Result<(), _> = retrier
            .run("op", || {
                calls.set(calls.get() + 1);
                async { Err(StoreError::Other("access denied".into())) }
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(Error::Store(StoreError::Other(_)))));
    }

    #[tokio::test]
    async fn zero_retries_means_single_call() {
        let calls = Cell::new(0);
        let retrier = Retrier::new(policy(0));

        let result: Result<(), _> = retrier
            .run("op", || {
                calls.set(calls.get() + 1);
                async { Err(StoreError::RateLimited("throttled".into())) }
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_slow_call() {
        let retrier = Retrier::new(policy(3)).with_timeout(Duration::from_secs(1));

        let result: Result<(), _> = retrier
            .run("op", || async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(Error::DeadlineExceeded { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_stops_backoff() {
        let calls = Cell::new(0);
        let retrier = Retrier::new(RetryPolicy {
            max_retries: 1_000,
            max_backoff: Duration::from_millis(500),
        })
        .with_timeout(Duration::from_secs(2));

        let result: Result<(), _> = retrier
            .run("op", || {
                calls.set(calls.get() + 1);
                async { Err(StoreError::RateLimited("throttled".into())) }
            })
            .await;

        assert!(matches!(result, Err(Error::DeadlineExceeded { .. })));
        assert!(calls.get() < 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_timeout_runs_unbounded() {
        let retrier = Retrier::new(policy(3)).with_timeout(Duration::from_secs(u64::MAX));

        let result = retrier
            .run("op", || async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(7)
            })
            .await;

        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_backoff_counts_as_past_the_deadline() {
        let calls = Cell::new(0);
        let retrier = Retrier::new(RetryPolicy {
            max_retries: 3,
            max_backoff: Duration::from_millis(u64::MAX),
        })
        .with_timeout(Duration::from_secs(1));

        let result: Result<(), _> = retrier
            .run("op", || {
                calls.set(calls.get() + 1);
                async { Err(StoreError::RateLimited("throttled".into())) }
            })
            .await;

        assert!(matches!(result, Err(Error::DeadlineExceeded { .. })));
        assert_eq!(calls.get(), 1);
    }
}
