//! Retry schedule for the matching service client.
//!
//! Kept separate from the client so the schedule and the retry predicate
//! can be exercised directly with injected failures, without a live
//! endpoint.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Exponential backoff with bounded jitter. Delay for retry `n` is
/// `base_delay * 2^n` plus a uniform jitter in `[0, max_jitter)`, so with
/// the default policy consecutive delays never decrease.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following failed retry number `retry`
    /// (zero-based).
    fn backoff_delay(&self, retry: u32) -> Duration {
        let backoff = self.base_delay * (1u32 << retry);
        let max_jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter_ms = if max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..max_jitter_ms)
        };
        backoff + Duration::from_millis(jitter_ms)
    }

    /// Drives `op` until it succeeds, a non-retryable error occurs, or
    /// `max_attempts` calls have been made. `op` receives the zero-based
    /// attempt number; `retryable` decides whether an error is worth
    /// another attempt.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !retryable(&err) {
                        return Err(err);
                    }
                    let delay = self.backoff_delay(attempt - 1);
                    warn!(
                        "attempt {}/{} failed ({}), retrying in {}ms",
                        attempt,
                        self.max_attempts,
                        err,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
