//! Timeouts and retry policy for reaching a printer.

use std::time::Duration;

/// How long to wait on a printer, and how often to try again.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct PrinterConfig {
    /// Connect and write timeouts.
    pub timeouts: PrinterTimeouts,
    /// Backoff for connection attempts (and test-label resends).
    pub retry: RetryConfig,
}

/// Connect and write timeouts.
///
/// A printer that is powered on answers a connect on the station LAN well
/// within 3 s. Writes get 30 s because a batch of 100 labels with embedded
/// graphics runs to megabytes and the printer stops reading while its
/// buffer is full.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct PrinterTimeouts {
    /// TCP connect timeout. Serial opens use it as the port timeout.
    pub connect: Duration,
    /// Per-write timeout.
    pub write: Duration,
}

impl Default for PrinterTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(3),
            write: Duration::from_secs(30),
        }
    }
}

/// Exponential backoff: `initial_delay`, doubled per retry, capped at
/// `max_delay`.
///
/// Only errors for which [`PrintError::is_retryable`](crate::PrintError::is_retryable)
/// holds are retried.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts in total, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any one delay.
    pub max_delay: Duration,
    /// Draw each delay from `[d/2, d]` so stations that lost the same
    /// printer do not reconnect in lockstep.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(4),
            jitter: true,
        }
    }
}
