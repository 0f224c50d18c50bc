//! Station configuration for the ZPL labeler.
//!
//! A station is one label printer plus the data it works from: the
//! template directory, the counter database and the parts catalog. The
//! configuration lives in a single JSON file; every field has a default so
//! an empty object (or a missing file) yields a usable IP-printer setup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Default raw-print TCP port.
pub const DEFAULT_PRINTER_PORT: u16 = 9100;

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Environment variable selecting the config file.
pub const CONFIG_ENV_VAR: &str = "ZLABEL_CONFIG";

/// Config file used when neither a path nor [`CONFIG_ENV_VAR`] is given.
pub const DEFAULT_CONFIG_FILE: &str = "zlabel.json";

/// Errors that can occur when loading, validating or saving a station config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("config file {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("invalid config JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is missing or out of range for the selected connection.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Wire name of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, reason: &str) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

// ── Printer settings ────────────────────────────────────────────────────

/// How the station talks to its printer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Raw TCP (port 9100 style).
    #[default]
    #[serde(rename = "IP", alias = "ip")]
    Ip,
    /// Serial / COM port.
    #[serde(rename = "COM", alias = "com")]
    Com,
}

/// Printer connection settings.
///
/// Only the fields belonging to [`kind`](Self::kind) are validated; the
/// others are kept so switching back and forth does not lose them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrinterSettings {
    /// Connection type.
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    /// Printer host name or IP address.
    pub ip: String,
    /// Printer TCP port.
    pub port: u16,
    /// Serial port name (`COM3`, `/dev/ttyUSB0`, ...).
    pub com_port: String,
    /// Serial baud rate.
    pub baud_rate: u32,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            kind: ConnectionKind::Ip,
            ip: String::new(),
            port: DEFAULT_PRINTER_PORT,
            com_port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl PrinterSettings {
    /// IP printer at `host:port`.
    pub fn ip(host: impl Into<String>, port: u16) -> Self {
        Self {
            kind: ConnectionKind::Ip,
            ip: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Serial printer on `com_port` at `baud_rate`.
    pub fn com(com_port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            kind: ConnectionKind::Com,
            com_port: com_port.into(),
            baud_rate,
            ..Self::default()
        }
    }

    /// Check the fields required by the selected connection kind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.kind {
            ConnectionKind::Ip => {
                if self.ip.trim().is_empty() {
                    return Err(ConfigError::invalid("ip", "required for IP printers"));
                }
                if self.port == 0 {
                    return Err(ConfigError::invalid("port", "must be between 1 and 65535"));
                }
            }
            ConnectionKind::Com => {
                if self.com_port.trim().is_empty() {
                    return Err(ConfigError::invalid("comPort", "required for COM printers"));
                }
                if self.baud_rate == 0 {
                    return Err(ConfigError::invalid("baudRate", "must be greater than 0"));
                }
            }
        }
        Ok(())
    }
}

// ── Station config ──────────────────────────────────────────────────────

/// Everything a label station needs to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StationConfig {
    /// Printer connection.
    pub printer: PrinterSettings,
    /// Directory of `*.zpl` label templates.
    pub templates_dir: PathBuf,
    /// Counter database file.
    pub counter_db: PathBuf,
    /// Parts catalog JSON file.
    pub parts_catalog: PathBuf,
    /// Template used by the printer test.
    pub test_label_format: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            printer: PrinterSettings::default(),
            templates_dir: PathBuf::from("zpl_templates"),
            counter_db: PathBuf::from("counters.redb"),
            parts_catalog: PathBuf::from("parts.json"),
            test_label_format: "Test_Print_label".to_string(),
        }
    }
}

impl StationConfig {
    /// Resolve relative data paths against `base` (normally the directory
    /// holding the config file). Absolute paths are left alone.
    pub fn rebase(mut self, base: &Path) -> Self {
        for path in [
            &mut self.templates_dir,
            &mut self.counter_db,
            &mut self.parts_catalog,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// Pick the config file: an explicit path wins, then [`CONFIG_ENV_VAR`],
/// then [`DEFAULT_CONFIG_FILE`] in the working directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Parse a config from JSON. Printer settings are not validated here so a
/// half-configured station can still preview labels.
pub fn load_config_from_str(s: &str) -> Result<StationConfig, ConfigError> {
    Ok(serde_json::from_str(s)?)
}

/// Load the config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<StationConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(s) => {
            debug!(path = %path.display(), "loaded station config");
            load_config_from_str(&s)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(StationConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Validate and write `config` to `path`, creating parent directories.
pub fn save_config(path: &Path, config: &StationConfig) -> Result<(), ConfigError> {
    config.printer.validate()?;
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut json = serde_json::to_string_pretty(config)?;
    json.push('\n');
    fs::write(path, json).map_err(io_err)?;
    info!(path = %path.display(), kind = ?config.printer.kind, "saved station config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = load_config_from_str("{}").unwrap();
        assert_eq!(cfg, StationConfig::default());
        assert_eq!(cfg.printer.port, 9100);
        assert_eq!(cfg.printer.baud_rate, 9600);
        assert_eq!(cfg.printer.kind, ConnectionKind::Ip);
    }

    #[test]
    fn wire_names() {
        let cfg = load_config_from_str(
            r#"{
                "printer": { "type": "COM", "comPort": "COM3", "baudRate": 19200 },
                "templatesDir": "/srv/labels",
                "testLabelFormat": "TEST"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.printer.kind, ConnectionKind::Com);
        assert_eq!(cfg.printer.com_port, "COM3");
        assert_eq!(cfg.printer.baud_rate, 19200);
        assert_eq!(cfg.printer.port, 9100);
        assert_eq!(cfg.templates_dir, PathBuf::from("/srv/labels"));
        assert_eq!(cfg.test_label_format, "TEST");

        let v = serde_json::to_value(&cfg).unwrap();
        assert_eq!(v["printer"]["type"], "COM");
        assert_eq!(v["printer"]["comPort"], "COM3");
        assert!(v.get("counterDb").is_some());
    }

    #[test]
    fn ip_requires_host_and_port() {
        let err = PrinterSettings::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { ref field, .. } if field == "ip"));

        let err = PrinterSettings::ip("10.0.0.5", 0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { ref field, .. } if field == "port"));

        PrinterSettings::ip("10.0.0.5", 9100).validate().unwrap();
    }

    #[test]
    fn com_requires_port_name_and_baud() {
        let err = PrinterSettings::com("  ", 9600).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { ref field, .. } if field == "comPort"));

        let err = PrinterSettings::com("COM3", 0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { ref field, .. } if field == "baudRate"));

        PrinterSettings::com("COM3", 9600).validate().unwrap();
    }

    #[test]
    fn com_settings_ignore_missing_ip() {
        let mut s = PrinterSettings::com("/dev/ttyUSB0", 9600);
        s.ip.clear();
        s.port = 0;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = load_config_from_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson(_)));
        let err = load_config_from_str(r#"{"printer": {"type": "USB"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg, StationConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/station/zlabel.json");
        let cfg = StationConfig {
            printer: PrinterSettings::ip("printer-3.local", 6101),
            ..StationConfig::default()
        };
        save_config(&path, &cfg).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);
    }

    #[test]
    fn save_rejects_invalid_printer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zlabel.json");
        let err = save_config(&path, &StationConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn rebase_only_touches_relative_paths() {
        let cfg = StationConfig {
            counter_db: PathBuf::from("/var/lib/zlabel/counters.redb"),
            ..StationConfig::default()
        }
        .rebase(Path::new("/etc/zlabel"));
        assert_eq!(cfg.templates_dir, PathBuf::from("/etc/zlabel/zpl_templates"));
        assert_eq!(cfg.counter_db, PathBuf::from("/var/lib/zlabel/counters.redb"));
        assert_eq!(cfg.parts_catalog, PathBuf::from("/etc/zlabel/parts.json"));
    }

    #[test]
    fn explicit_config_path_wins() {
        let p = config_path(Some(Path::new("/tmp/station.json")));
        assert_eq!(p, PathBuf::from("/tmp/station.json"));
    }
}
