//! Where a station's labels go: a network printer or a serial one.

use tracing::{debug, info};

use crate::retry::retry_connect;
use crate::{PrintError, Printer, PrinterConfig, Reconnectable};

/// An open connection to either kind of printer.
pub trait PrinterConnection: Printer + Reconnectable {}

impl<T: Printer + Reconnectable> PrinterConnection for T {}

/// A configured printer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum PrinterTarget {
    /// Raw TCP printer.
    Ip {
        /// Host name or IP address, optionally with `:PORT`.
        host: String,
        /// TCP port used when `host` carries none.
        port: u16,
    },
    /// Serial printer.
    Serial {
        /// Port name, matched case-insensitively against the system's ports.
        port: String,
        /// Baud rate.
        baud: u32,
    },
}

impl PrinterTarget {
    /// Check the target has what its transport needs.
    pub fn validate(&self) -> Result<(), PrintError> {
        match self {
            PrinterTarget::Ip { host, port } => {
                if host.trim().is_empty() {
                    return Err(PrintError::InvalidConfig("printer IP is required".into()));
                }
                if *port == 0 {
                    return Err(PrintError::InvalidConfig("printer port must be > 0".into()));
                }
            }
            PrinterTarget::Serial { port, baud } => {
                if port.trim().is_empty() {
                    return Err(PrintError::InvalidConfig("COM port is required".into()));
                }
                if *baud == 0 {
                    return Err(PrintError::InvalidConfig("baud rate must be > 0".into()));
                }
            }
        }
        Ok(())
    }

    /// Open a connection, retrying transient connect failures per
    /// `config.retry`.
    pub fn open(&self, config: &PrinterConfig) -> Result<Box<dyn PrinterConnection>, PrintError> {
        self.validate()?;
        retry_connect(&config.retry, || self.open_once(config))
    }

    #[cfg(feature = "tcp")]
    fn open_tcp(
        host: &str,
        port: u16,
        config: &PrinterConfig,
    ) -> Result<Box<dyn PrinterConnection>, PrintError> {
        Ok(Box::new(crate::TcpPrinter::connect(host, port, config.clone())?))
    }

    #[cfg(not(feature = "tcp"))]
    fn open_tcp(
        _host: &str,
        _port: u16,
        _config: &PrinterConfig,
    ) -> Result<Box<dyn PrinterConnection>, PrintError> {
        Err(PrintError::TransportUnavailable("tcp"))
    }

    #[cfg(feature = "serial")]
    fn open_serial(
        port: &str,
        baud: u32,
        config: &PrinterConfig,
    ) -> Result<Box<dyn PrinterConnection>, PrintError> {
        Ok(Box::new(crate::SerialPrinter::open(port, baud, config.clone())?))
    }

    #[cfg(not(feature = "serial"))]
    fn open_serial(
        _port: &str,
        _baud: u32,
        _config: &PrinterConfig,
    ) -> Result<Box<dyn PrinterConnection>, PrintError> {
        Err(PrintError::TransportUnavailable("serial"))
    }

    fn open_once(&self, config: &PrinterConfig) -> Result<Box<dyn PrinterConnection>, PrintError> {
        match self {
            PrinterTarget::Ip { host, port } => Self::open_tcp(host, *port, config),
            PrinterTarget::Serial { port, baud } => Self::open_serial(port, *baud, config),
        }
    }

    /// Send `payload` over a fresh connection that is closed afterwards.
    ///
    /// Connecting is retried; the write is not, so a batch is never
    /// printed twice.
    pub fn send(&self, payload: &str, config: &PrinterConfig) -> Result<(), PrintError> {
        let mut conn = self.open(config)?;
        conn.send_zpl(payload)?;
        info!(printer = %self, bytes = payload.len(), "label batch sent");
        Ok(())
    }

    /// Check the printer is reachable by opening and closing a connection.
    pub fn probe(&self, config: &PrinterConfig) -> Result<(), PrintError> {
        self.validate()?;
        let conn = self.open_once(config)?;
        drop(conn);
        debug!(printer = %self, "printer reachable");
        Ok(())
    }
}

impl std::fmt::Display for PrinterTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrinterTarget::Ip { host, port } => write!(f, "tcp://{host}:{port}"),
            PrinterTarget::Serial { port, baud } => write!(f, "serial://{port}@{baud}"),
        }
    }
}

// Boxed connections are what `open` hands out.
impl<P: Printer + ?Sized> Printer for Box<P> {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError> {
        (**self).send_raw(data)
    }
}

impl<P: Reconnectable + ?Sized> Reconnectable for Box<P> {
    fn reconnect(&mut self) -> Result<(), PrintError> {
        (**self).reconnect()
    }
}
