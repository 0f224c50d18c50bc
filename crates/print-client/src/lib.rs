//! ZPL Labeler print client: deliver label batches to Zebra printers.
//!
//! Supports TCP (port 9100) and serial/COM transports behind the `tcp` and
//! `serial` features. The API is synchronous (`std::net`), with no async
//! runtime required. Most callers only need [`PrinterTarget::send`].
mod addr;
mod config;
mod error;
mod retry;
#[cfg(feature = "serial")]
mod serial;
mod target;
#[cfg(feature = "tcp")]
mod tcp;

pub use addr::{DEFAULT_PORT, resolve_printer_addr, resolve_serial_port};
pub use config::{PrinterConfig, PrinterTimeouts, RetryConfig};
pub use error::PrintError;
pub use retry::ReconnectRetryPrinter;
#[cfg(feature = "serial")]
pub use serial::{DEFAULT_BAUD, SerialPrinter};
pub use target::{PrinterConnection, PrinterTarget};
#[cfg(feature = "tcp")]
pub use tcp::TcpPrinter;

// ── Traits ──────────────────────────────────────────────────────────────

/// Send data to a printer. All transports implement this.
pub trait Printer: Send {
    /// Send raw bytes to the printer.
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError>;

    /// Send a ZPL string to the printer (convenience wrapper over `send_raw`).
    fn send_zpl(&mut self, zpl: &str) -> Result<(), PrintError> {
        self.send_raw(zpl.as_bytes())
    }
}

/// A printer that can re-establish its connection after a failure.
///
/// Implementing this trait enables [`ReconnectRetryPrinter`] to reconnect
/// between retry attempts, so retries work even after a full connection
/// drop (TCP disconnect, serial adapter unplugged and replugged).
pub trait Reconnectable {
    /// Re-establish the connection.
    ///
    /// Implementations should close the old connection (if any) and open a
    /// fresh one.
    fn reconnect(&mut self) -> Result<(), PrintError>;
}

// ── Discovery ───────────────────────────────────────────────────────────

/// Serial port names present on this machine.
///
/// Fails with [`PrintError::TransportUnavailable`] when the `serial`
/// feature is off.
pub fn list_serial_ports() -> Result<Vec<String>, PrintError> {
    #[cfg(feature = "serial")]
    {
        SerialPrinter::list_ports()
    }
    #[cfg(not(feature = "serial"))]
    {
        Err(PrintError::TransportUnavailable("serial"))
    }
}
