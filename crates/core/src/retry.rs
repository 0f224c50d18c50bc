//! Exponential-backoff retry for transient counter-store reads.

use std::time::Duration;

use tracing::warn;

use crate::StoreError;

/// Retry settings for transient store failures.
///
/// Only errors where [`StoreError::is_retryable()`] is `true` are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. `0` behaves as `1`.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// delay = min(initial_delay * 2^attempt, max_delay), `attempt` 0-indexed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Result<T, StoreError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(op = what, attempt = attempt + 1, ?delay, error = %e, "retrying store operation");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn delays_double_and_cap() {
        let p = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(p.delay_for(0), Duration::from_millis(100));
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(350));
        assert_eq!(p.delay_for(40), Duration::from_millis(350));
    }

    #[test]
    fn transient_errors_are_retried() {
        let calls = Cell::new(0);
        let out = fast(3).run("read", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(StoreError::Backend("reset".into()))
            } else {
                Ok(7)
            }
        });
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let out: Result<(), _> = fast(2).run("read", || {
            calls.set(calls.get() + 1);
            Err(StoreError::Backend("down".into()))
        });
        assert!(matches!(out, Err(StoreError::Backend(_))));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let out: Result<(), _> = fast(5).run("read", || {
            calls.set(calls.get() + 1);
            Err(StoreError::PartNotFound("x".into()))
        });
        assert!(out.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let _ = fast(0).run("read", || {
            calls.set(calls.get() + 1);
            Err::<(), _>(StoreError::Backend("x".into()))
        });
        assert_eq!(calls.get(), 1);
    }
}
