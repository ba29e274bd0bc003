//! Deadline-bounded retry with exponential backoff

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// How long and how often to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Ceiling on total elapsed time, not on attempts
    pub timeout: Duration,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10 * 60),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Outcome of one failed attempt
#[derive(Debug)]
pub enum RetryError<E> {
    Retryable(E),
    NonRetryable(E),
}

/// Why the loop gave up
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// A non-retryable error ended the loop
    Aborted(E),
    /// The deadline passed; carries the last retryable error
    TimedOut { last: E, elapsed: Duration },
}

/// Run `operation` until it succeeds, fails permanently, or the deadline passes
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryFailure<E>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
{
    let started = Instant::now();
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 1;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(err)) => return Err(RetryFailure::Aborted(err)),
            Err(RetryError::Retryable(err)) => err,
        };

        let elapsed = started.elapsed();
        if elapsed + delay > policy.timeout {
            return Err(RetryFailure::TimedOut { last: err, elapsed });
        }

        tracing::warn!(
            "Attempt {} failed, retrying in {:?}: {}",
            attempt,
            delay,
            err
        );
        tokio::time::sleep(delay).await;

        delay = (delay * 2).min(policy.max_delay);
        attempt += 1;
    }
}
