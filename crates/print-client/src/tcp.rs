//! Raw TCP transport (port 9100).

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tracing::debug;

use crate::addr::resolve_printer_addr;
use crate::{PrintError, Printer, PrinterConfig, Reconnectable};

/// Idle time before the first keepalive probe on a printer socket.
const KEEPALIVE: Duration = Duration::from_secs(60);

/// A TCP connection to a printer's raw port.
///
/// ZPL goes out as-is; the printer sends nothing back. The socket is shut
/// down on drop, which is what tells the printer the job is complete.
pub struct TcpPrinter {
    stream: TcpStream,
    addr: SocketAddr,
    config: PrinterConfig,
}

impl TcpPrinter {
    /// Connect to `host` (see [`resolve_printer_addr`] for how `host` and
    /// `port` combine).
    pub fn connect(host: &str, port: u16, config: PrinterConfig) -> Result<Self, PrintError> {
        let addr = resolve_printer_addr(host, port)?;
        let stream = open_stream(addr, &config)?;
        debug!(%addr, "connected to printer");
        Ok(Self {
            stream,
            addr,
            config,
        })
    }

    /// Drop the current socket and connect to the same address again.
    pub fn reconnect(&mut self) -> Result<(), PrintError> {
        let _ = self.stream.shutdown(Shutdown::Both);
        self.stream = open_stream(self.addr, &self.config)?;
        debug!(addr = %self.addr, "reconnected to printer");
        Ok(())
    }

    /// The printer's resolved address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Printer for TcpPrinter {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError> {
        self.stream
            .write_all(data)
            .and_then(|()| self.stream.flush())
            .map_err(PrintError::WriteFailed)
    }
}

impl Reconnectable for TcpPrinter {
    fn reconnect(&mut self) -> Result<(), PrintError> {
        TcpPrinter::reconnect(self)
    }
}

impl Drop for TcpPrinter {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

// ── Socket setup ────────────────────────────────────────────────────────

fn open_stream(addr: SocketAddr, config: &PrinterConfig) -> Result<TcpStream, PrintError> {
    let timeout = config.timeouts.connect;
    let stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| connect_error(addr, timeout, e))?;
    tune(&stream, config).map_err(|source| PrintError::ConnectionFailed {
        addr: addr.to_string(),
        source,
    })?;
    Ok(stream)
}

/// Map a failed connect onto the printer error codes.
fn connect_error(addr: SocketAddr, timeout: Duration, e: io::Error) -> PrintError {
    let addr = addr.to_string();
    match e.kind() {
        io::ErrorKind::ConnectionRefused => PrintError::ConnectionRefused { addr, source: e },
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => PrintError::ConnectionTimeout {
            addr,
            timeout,
            source: e,
        },
        _ => PrintError::ConnectionFailed { addr, source: e },
    }
}

/// No Nagle delay on the last segment of a batch, keepalive for long
/// writes, and the configured write timeout.
fn tune(stream: &TcpStream, config: &PrinterConfig) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let keepalive = TcpKeepalive::new().with_time(KEEPALIVE);
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    let keepalive = keepalive.with_interval(KEEPALIVE);
    SockRef::from(stream).set_tcp_keepalive(&keepalive)?;
    stream.set_write_timeout(Some(config.timeouts.write))
}
