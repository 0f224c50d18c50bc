//! Backoff for printer connections and test-label sends.
//!
//! Opening a connection is always safe to repeat. Resending a payload is
//! not: a label batch whose write failed halfway may already be partly
//! printed. `retry_connect` covers the first case; [`ReconnectRetryPrinter`]
//! resends whole payloads and is meant for the fixed test label only.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::config::RetryConfig;
use crate::{PrintError, Printer, Reconnectable};

// ── Backoff loop ────────────────────────────────────────────────────────

/// Open a connection, retrying timeouts with backoff.
///
/// A refused connection or an unknown serial port fails on the first try.
pub(crate) fn retry_connect<T, F>(config: &RetryConfig, connect: F) -> Result<T, PrintError>
where
    F: FnMut() -> Result<T, PrintError>,
{
    with_backoff(config, "connect", connect, || {})
}

/// Run `attempt` until it succeeds, fails with a non-retryable error, or
/// `config.max_attempts` is used up. `between` runs before every retry.
fn with_backoff<T, A, B>(
    config: &RetryConfig,
    what: &'static str,
    mut attempt: A,
    mut between: B,
) -> Result<T, PrintError>
where
    A: FnMut() -> Result<T, PrintError>,
    B: FnMut(),
{
    if config.max_attempts == 0 {
        return Err(PrintError::InvalidConfig(
            "retry max_attempts must be at least 1".into(),
        ));
    }

    let mut n = 1;
    loop {
        let err = match attempt() {
            Ok(val) => return Ok(val),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => e,
        };
        if n >= config.max_attempts {
            return Err(PrintError::RetriesExhausted {
                attempts: n,
                last_error: Box::new(err),
            });
        }
        let delay = backoff_delay(config, n - 1);
        warn!(attempt = n, ?delay, error = %err, "printer {what} failed, retrying");
        std::thread::sleep(delay);
        between();
        n += 1;
    }
}

/// Delay before retry number `retry` (0-based): `initial_delay * 2^retry`
/// capped at `max_delay`, drawn from the upper half when jitter is on.
fn backoff_delay(config: &RetryConfig, retry: u32) -> Duration {
    let capped = config
        .initial_delay
        .saturating_mul(2u32.saturating_pow(retry))
        .min(config.max_delay);
    if config.jitter {
        jittered(capped)
    } else {
        capped
    }
}

/// A duration in `[d/2, d]`, seeded from the clock's sub-second nanos.
fn jittered(d: Duration) -> Duration {
    let half = d / 2;
    let span = (d - half).as_nanos();
    if span == 0 {
        return d;
    }
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let offset = u64::try_from(u128::from(seed) % span).unwrap_or(0);
    half + Duration::from_nanos(offset)
}

// ── Whole-payload retry ─────────────────────────────────────────────────

/// Resends a failed payload on a fresh connection.
///
/// Before each retry the inner printer is reconnected, so a printer that
/// was power-cycled or a USB-serial adapter that was replugged gets a new
/// handle instead of failing every attempt on the dead one.
///
/// A resend writes the whole payload again. Wrap only payloads where a
/// duplicate label is harmless, such as the test label; serialized batches
/// go through [`PrinterTarget::send`](crate::PrinterTarget::send), which
/// never resends.
///
/// ```rust,no_run
/// use zpl_labeler_print_client::{
///     Printer, PrinterConfig, PrinterTarget, ReconnectRetryPrinter,
/// };
///
/// # fn main() -> Result<(), zpl_labeler_print_client::PrintError> {
/// let config = PrinterConfig::default();
/// let target = PrinterTarget::Ip { host: "10.0.4.21".into(), port: 9100 };
/// let mut printer = ReconnectRetryPrinter::new(target.open(&config)?, config.retry.clone());
/// printer.send_zpl("^XA^FO50,50^FDTEST^FS^XZ")?;
/// # Ok(())
/// # }
/// ```
pub struct ReconnectRetryPrinter<P> {
    inner: P,
    retry: RetryConfig,
}

impl<P> ReconnectRetryPrinter<P> {
    /// Wrap `inner`, retrying sends per `retry`.
    pub fn new(inner: P, retry: RetryConfig) -> Self {
        Self { inner, retry }
    }

    /// The wrapped printer.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Printer + Reconnectable> Printer for ReconnectRetryPrinter<P> {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError> {
        // The attempt and the reconnect both need the printer; they never
        // run at the same time.
        let inner = std::cell::RefCell::new(&mut self.inner);
        with_backoff(
            &self.retry,
            "send",
            || inner.borrow_mut().send_raw(data),
            || {
                if let Err(e) = inner.borrow_mut().reconnect() {
                    warn!(error = %e, "reconnect failed; next attempt will report it");
                }
            },
        )
    }
}

impl<P: Reconnectable> Reconnectable for ReconnectRetryPrinter<P> {
    fn reconnect(&mut self) -> Result<(), PrintError> {
        self.inner.reconnect()
    }
}
