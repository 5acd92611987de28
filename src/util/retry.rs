//! Retry with exponential backoff and jitter for request establishment.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry` (0-based), without jitter.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return self.initial_backoff.min(self.max_backoff);
        }
        let factor = self.multiplier.powi(retry.min(32) as i32);
        self.initial_backoff.mul_f64(factor).min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or attempts run out.
    ///
    /// Only wrap the part of a call that happens before response bytes flow;
    /// a stream that already dispatched chunks must not be replayed.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if attempt >= attempts || !err.is_retryable() {
                return Err(err);
            }

            // 75%..125% of the nominal backoff
            let nominal = self.backoff_for(attempt - 1);
            let delay = nominal.mul_f64(0.75 + jitter() * 0.5);
            tracing::warn!(
                attempt,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying local LLM request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Cheap pseudo-random factor in `[0, 1)`.
fn jitter() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos(),
    );
    (hasher.finish() % 10_000) as f64 / 10_000.0
}
