//! Serial (COM) transport for Zebra printers using the `serialport` crate.
//!
//! Feature-gated behind the `serial` Cargo feature.

use std::io::{self, Write};

use tracing::debug;

use crate::addr::resolve_serial_port;
use crate::{PrintError, Printer, PrinterConfig, Reconnectable};

/// Default baud rate for Zebra label printers (9600 8N1).
pub const DEFAULT_BAUD: u32 = 9600;

/// A Zebra printer connected over a serial port (RS-232 or USB-serial).
pub struct SerialPrinter {
    port: Box<dyn serialport::SerialPort>,
    path: String,
    baud: u32,
    config: PrinterConfig,
}

impl SerialPrinter {
    /// Open the port matching `requested` at `baud`.
    ///
    /// The name is resolved against [`list_ports`](Self::list_ports) with
    /// [`resolve_serial_port`], so `com3` opens `COM3`.
    ///
    /// # Errors
    ///
    /// `SerialPortNotFound` when no port matches, `SerialPortBusy` when
    /// another process holds it, `SerialOpenFailed` otherwise.
    pub fn open(requested: &str, baud: u32, config: PrinterConfig) -> Result<Self, PrintError> {
        if baud == 0 {
            return Err(PrintError::InvalidConfig("baud rate must be > 0".into()));
        }
        let available = Self::list_ports()?;
        let path = resolve_serial_port(requested, &available)?;
        let port = open_port(&path, baud, &config)?;
        debug!(port = %path, baud, "opened serial printer");

        Ok(Self {
            port,
            path,
            baud,
            config,
        })
    }

    /// Name of the opened port as the system spells it.
    pub fn port_name(&self) -> &str {
        &self.path
    }

    /// List available serial port names on the system.
    ///
    /// **Note:** On Linux, this crate is built with `serialport`'s default
    /// features disabled (no `libudev`). Enumeration still works via a sysfs
    /// fallback but may return fewer details than the libudev backend.
    pub fn list_ports() -> Result<Vec<String>, PrintError> {
        let ports = serialport::available_ports()
            .map_err(|e| PrintError::SerialOpenFailed {
                port: "*".into(),
                reason: e.to_string(),
            })?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

fn open_port(
    path: &str,
    baud: u32,
    config: &PrinterConfig,
) -> Result<Box<dyn serialport::SerialPort>, PrintError> {
    let timeout = config.timeouts.connect.max(config.timeouts.write);
    serialport::new(path, baud)
        .timeout(timeout)
        .open()
        .map_err(|e| {
            let reason = e.to_string();
            let lowered = reason.to_lowercase();
            let busy = matches!(
                e.kind(),
                serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied)
            ) || lowered.contains("access denied")
                || lowered.contains("busy");
            if busy {
                PrintError::SerialPortBusy {
                    port: path.to_string(),
                    reason,
                }
            } else {
                PrintError::SerialOpenFailed {
                    port: path.to_string(),
                    reason,
                }
            }
        })
}

impl Printer for SerialPrinter {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError> {
        self.port
            .write_all(data)
            .map_err(PrintError::SerialWriteFailed)?;
        self.port.flush().map_err(PrintError::SerialWriteFailed)?;
        Ok(())
    }
}

impl Reconnectable for SerialPrinter {
    fn reconnect(&mut self) -> Result<(), PrintError> {
        self.port = open_port(&self.path, self.baud, &self.config)?;
        debug!(port = %self.path, "reopened serial printer");
        Ok(())
    }
}
