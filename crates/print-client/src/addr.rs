//! Printer address resolution.
//!
//! Network printers are configured as a host (IP or name, optionally with
//! its own `:PORT`) plus a port; serial printers as a port name that is
//! matched against the ports present on the machine.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use crate::PrintError;

/// Default ZPL raw printing port (JetDirect / RAW).
pub const DEFAULT_PORT: u16 = 9100;

/// Resolve a configured printer host to a `SocketAddr`.
///
/// Accepts these formats for `host`:
/// - `192.168.1.55:9100` -- IP with explicit port (wins over `port`)
/// - `192.168.1.55` -- IP, uses `port`
/// - `printer01.local:9100` -- hostname with port
/// - `printer01.local` -- hostname, uses `port`
///
/// Returns the first resolved address. For hostnames that resolve to
/// multiple addresses (dual-stack), the first result is used.
pub fn resolve_printer_addr(host: &str, port: u16) -> Result<SocketAddr, PrintError> {
    let host = host.trim();

    // 1. Full socket address (e.g., "192.168.1.55:9100" or "[::1]:9100")
    if let Ok(addr) = host.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // 2. Bare IP (e.g., "192.168.1.55")
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    // 3. host:port (e.g., "printer01.local:9100")
    if let Ok(mut addrs) = host.to_socket_addrs()
        && let Some(addr) = addrs.next()
    {
        return Ok(addr);
    }

    // 4. Bare hostname (e.g., "printer01.local")
    if let Ok(mut addrs) = (host, port).to_socket_addrs()
        && let Some(addr) = addrs.next()
    {
        return Ok(addr);
    }

    Err(PrintError::NoAddressFound(host.to_string()))
}

/// Match a configured serial port name against the ports on the system.
///
/// Matching is case-insensitive: an exact name wins, otherwise the first
/// port whose name contains `requested` (so `ttyusb0` finds
/// `/dev/ttyUSB0`). Returns the system's spelling of the name.
pub fn resolve_serial_port(requested: &str, available: &[String]) -> Result<String, PrintError> {
    let wanted = requested.trim().to_lowercase();
    if wanted.is_empty() {
        return Err(PrintError::InvalidConfig("serial port name is empty".into()));
    }

    let exact = available.iter().find(|p| p.to_lowercase() == wanted);
    let found = exact.or_else(|| {
        available
            .iter()
            .find(|p| p.to_lowercase().contains(&wanted))
    });

    found.cloned().ok_or_else(|| PrintError::SerialPortNotFound {
        requested: requested.to_string(),
        available: available.to_vec(),
    })
}
