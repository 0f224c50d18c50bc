//! Errors raised while reaching a printer.

use std::io;
use std::time::Duration;

/// Why a label did not reach the printer.
///
/// Use [`PrintError::is_retryable()`] to classify transient vs permanent
/// failures and [`PrintError::code()`] for the stable message code shown to
/// operators.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    // -- Connection --
    /// Nothing listens on the printer port (printer off or wrong port).
    #[error("connection refused: {addr}")]
    ConnectionRefused {
        /// Printer address.
        addr: String,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// The printer did not answer within the connect timeout.
    #[error("connection timed out: {addr} ({timeout:?})")]
    ConnectionTimeout {
        /// Printer address.
        addr: String,
        /// The configured timeout that elapsed.
        timeout: Duration,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// Connection failed for a reason other than refusal or timeout.
    #[error("connection failed: {addr}")]
    ConnectionFailed {
        /// Printer address.
        addr: String,
        /// OS error.
        #[source]
        source: io::Error,
    },

    // -- Address --
    /// The printer host name resolved to nothing.
    #[error("no address found for hostname: {0}")]
    NoAddressFound(String),

    // -- I/O --
    /// A write to a network printer failed.
    #[error("write failed: {0}")]
    WriteFailed(#[source] io::Error),

    // -- Serial-specific --
    /// No serial port matches the configured name.
    #[error("serial port {requested} not found (available: {})", available.join(", "))]
    SerialPortNotFound {
        /// The configured port name.
        requested: String,
        /// Port names currently present on the system.
        available: Vec<String>,
    },

    /// The serial port exists but another process holds it.
    #[error("serial port {port} is busy: {reason}")]
    SerialPortBusy {
        /// The port that was opened.
        port: String,
        /// Driver message.
        reason: String,
    },

    /// Opening the serial port failed.
    #[error("could not open serial port {port}: {reason}")]
    SerialOpenFailed {
        /// The port that was opened.
        port: String,
        /// Driver message.
        reason: String,
    },

    /// Writing to an open serial port failed.
    #[error("serial write failed: {0}")]
    SerialWriteFailed(#[source] io::Error),

    // -- Retry --
    /// Every retry attempt failed; the code is that of the last failure.
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// Total number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last_error: Box<PrintError>,
    },

    // -- Configuration --
    /// An invalid configuration was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The transport needed by the target was compiled out.
    #[error("{0} transport not enabled in this build")]
    TransportUnavailable(&'static str),
}

impl PrintError {
    /// Returns `true` if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PrintError::ConnectionTimeout { .. }
                | PrintError::WriteFailed(_)
                | PrintError::SerialWriteFailed(_)
        )
    }

    /// Stable message code for this failure.
    ///
    /// [`RetriesExhausted`](Self::RetriesExhausted) reports the code of the
    /// final attempt's error.
    pub fn code(&self) -> &'static str {
        match self {
            PrintError::ConnectionRefused { .. }
            | PrintError::ConnectionFailed { .. }
            | PrintError::NoAddressFound(_) => "backend.printer.connection_error",
            PrintError::ConnectionTimeout { .. } => "backend.printer.timeout",
            PrintError::WriteFailed(_) => "backend.printer.send_error",
            PrintError::SerialPortNotFound { .. } => "backend.printer.com_not_found",
            PrintError::SerialPortBusy { .. } => "backend.printer.com_busy",
            PrintError::SerialOpenFailed { .. } => "backend.printer.com_open_error",
            PrintError::SerialWriteFailed(_) => "backend.printer.com_write_error",
            PrintError::RetriesExhausted { last_error, .. } => last_error.code(),
            PrintError::InvalidConfig(_) => "backend.printer.invalid_config",
            PrintError::TransportUnavailable(_) => "backend.printer.transport_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(
            PrintError::ConnectionTimeout {
                addr: "x".into(),
                timeout: Duration::from_secs(1),
                source: io::Error::new(io::ErrorKind::TimedOut, "test"),
            }
            .is_retryable()
        );
        assert!(
            PrintError::WriteFailed(io::Error::new(io::ErrorKind::BrokenPipe, "test"))
                .is_retryable()
        );
        assert!(PrintError::SerialWriteFailed(io::Error::other("test")).is_retryable());
    }

    #[test]
    fn non_retryable_errors() {
        assert!(
            !PrintError::ConnectionRefused {
                addr: "x".into(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "test"),
            }
            .is_retryable()
        );
        assert!(!PrintError::NoAddressFound("x".into()).is_retryable());
        assert!(
            !PrintError::SerialPortNotFound {
                requested: "COM9".into(),
                available: vec![],
            }
            .is_retryable()
        );
        assert!(!PrintError::InvalidConfig("test".into()).is_retryable());
        assert!(
            !PrintError::RetriesExhausted {
                attempts: 3,
                last_error: Box::new(PrintError::WriteFailed(io::Error::other("x"))),
            }
            .is_retryable()
        );
    }

    #[test]
    fn codes() {
        let timeout = PrintError::ConnectionTimeout {
            addr: "10.0.0.5:9100".into(),
            timeout: Duration::from_secs(3),
            source: io::Error::new(io::ErrorKind::TimedOut, "t"),
        };
        assert_eq!(timeout.code(), "backend.printer.timeout");
        assert_eq!(
            PrintError::NoAddressFound("h".into()).code(),
            "backend.printer.connection_error"
        );
        assert_eq!(
            PrintError::SerialPortBusy {
                port: "COM3".into(),
                reason: "Access denied".into()
            }
            .code(),
            "backend.printer.com_busy"
        );
        let exhausted = PrintError::RetriesExhausted {
            attempts: 3,
            last_error: Box::new(timeout),
        };
        assert_eq!(exhausted.code(), "backend.printer.timeout");
    }

    #[test]
    fn not_found_lists_available_ports() {
        let e = PrintError::SerialPortNotFound {
            requested: "COM9".into(),
            available: vec!["COM1".into(), "COM3".into()],
        };
        assert_eq!(
            e.to_string(),
            "serial port COM9 not found (available: COM1, COM3)"
        );
    }
}
