//! Bounded-retry wrapper for contended topology mutations.
//!
//! Mutations are optimistic: they read a neighborhood, decide a write set,
//! and commit with version fingerprints. When a concurrent commit wins the
//! race, the batch is rejected with a retryable conflict and the whole
//! read-decide-write sequence runs again on a fresh snapshot, after an
//! exponentially growing backoff, up to a bounded attempt budget.

use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Retry budget and backoff schedule for optimistic mutations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget and backoff bounds.
    ///
    /// The budget is clamped to at least one attempt.
    #[must_use]
    pub fn new(max_attempts: u32, base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
            max_backoff: max_backoff.max(base_backoff),
        }
    }

    /// Returns the attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Drives one mutation until it commits, fails non-retryably, or the
    /// attempt budget runs out.
    pub(crate) fn run<T>(
        &self,
        operation: &'static str,
        mut attempt_fn: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        for attempt in 0..self.max_attempts {
            match attempt_fn() {
                Err(err) if err.is_retryable() => {
                    let backoff = self.backoff(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "commit contention, retrying on a fresh snapshot"
                    );
                    thread::sleep(backoff);
                }
                other => return other,
            }
        }
        Err(Error::Unavailable {
            attempts: self.max_attempts,
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
        )
    }
}
