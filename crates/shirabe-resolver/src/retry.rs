//! Exponential backoff around provider calls.

use std::thread;
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

/// Retry schedule for transient provider failures.
///
/// Only [`ProviderError::is_transient`] errors are retried. A 429 with a
/// `Retry-After` header waits for the header value (capped at `max_delay`)
/// instead of the computed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit values.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// A policy that retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// Backoff before retry number `retry` (0 for the first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `call` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T, F>(&self, operation: &str, mut call: F) -> ProviderResult<T>
    where
        F: FnMut() -> ProviderResult<T>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match call() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_transient() || attempt >= attempts {
                if err.is_transient() {
                    tracing::warn!(operation, attempts, error = %err, "giving up after retries");
                }
                return Err(err);
            }

            let delay = match err {
                ProviderError::RateLimited {
                    retry_after: Some(wait),
                } => wait.min(self.max_delay),
                _ => self.delay_for(attempt - 1),
            };
            tracing::warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying provider call"
            );
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn transient() -> ProviderError {
        ProviderError::Transient {
            reason: "connection reset".into(),
        }
    }

    #[test]
    fn default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(3), Duration::from_secs(40));
        assert_eq!(policy.delay_for(4), Duration::from_secs(60));
        assert_eq!(policy.delay_for(40), Duration::from_secs(60));
    }

    #[test]
    fn recovers_from_transient_failures() {
        let calls = Cell::new(0);
        let result = RetryPolicy::immediate(3).run("search", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 { Err(transient()) } else { Ok(42) }
        });
        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn stops_after_max_attempts() {
        let calls = Cell::new(0);
        let result: ProviderResult<()> = RetryPolicy::immediate(3).run("search", || {
            calls.set(calls.get() + 1);
            Err(ProviderError::RateLimited { retry_after: None })
        });
        assert!(matches!(result, Err(ProviderError::RateLimited { .. })));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn permanent_and_credential_errors_are_not_retried() {
        for err in [
            ProviderError::Credential,
            ProviderError::Permanent {
                status: 404,
                reason: "not found".into(),
            },
        ] {
            let calls = Cell::new(0);
            let result: ProviderResult<()> = RetryPolicy::immediate(5).run("details", || {
                calls.set(calls.get() + 1);
                Err(err.clone())
            });
            assert_eq!(result, Err(err));
            assert_eq!(calls.get(), 1);
        }
    }

    #[test]
    fn zero_attempts_still_calls_once() {
        let calls = Cell::new(0);
        let _ = RetryPolicy::immediate(0).run("search", || {
            calls.set(calls.get() + 1);
            Err::<(), _>(transient())
        });
        assert_eq!(calls.get(), 1);
    }
}
