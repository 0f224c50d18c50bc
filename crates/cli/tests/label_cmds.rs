//! CLI tests for the label, counter and config subcommands.

use std::fs;
use std::io::Read;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use assert_cmd::cargo;
use serde_json::Value;

const TEMPLATE: &str = "^XA\n^FO20,20^FD*PARTNUM*^FS\n^FO20,60^FD*SERIALPREFIX**SERIALNUM1*^FS\n^FO20,100^FD*JDATE*^FS\n^FO20,140^FD*ID_LABEL*^FS\n^PQ*NUMCOPIES*\n^XZ\n";

const TEST_LABEL: &str = "^XA^FO50,50^A0N,40,40^FDPRINTER TEST^FS^XZ\n";

const PARTS: &str = r#"[
    {
        "Part_Number": "7730-115",
        "Serial_Prefix": "LP",
        "Label_Format": "SERIAL_SMALL",
        "Part_Description": "Valve body"
    },
    {
        "Part_Number": "9001-001",
        "Serial_Prefix": "",
        "Label_Format": "MISSING_FORMAT"
    }
]"#;

/// A station directory with a config, templates and a parts catalog.
struct StationDir {
    dir: tempfile::TempDir,
}

impl StationDir {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("zpl_templates");
        fs::create_dir(&templates).unwrap();
        fs::write(templates.join("SERIAL_SMALL.zpl"), TEMPLATE).unwrap();
        fs::write(templates.join("Test_Print_label.zpl"), TEST_LABEL).unwrap();
        fs::write(dir.path().join("parts.json"), PARTS).unwrap();
        fs::write(dir.path().join("zlabel.json"), "{}\n").unwrap();
        Self { dir }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("zlabel.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(cargo::cargo_bin!("zlabel"));
        cmd.arg("--config").arg(self.config());
        cmd.env_remove("ZLABEL_CONFIG");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn json(&self, args: &[&str]) -> (Output, Value) {
        let output = self
            .cmd()
            .args(args)
            .args(["--output", "json"])
            .output()
            .expect("run zlabel");
        let stdout = String::from_utf8_lossy(&output.stdout);
        let json = serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {stdout}"));
        (output, json)
    }

    fn provision(&self, part: &str, next: &str, max_id: &str, scheme: &str) {
        let (output, _) = self.json(&[
            "counter",
            "provision",
            part,
            "--next",
            next,
            "--max-id",
            max_id,
            "--scheme",
            scheme,
        ]);
        assert!(output.status.success(), "provision failed: {output:?}");
    }

    fn next_serial(&self, part: &str) -> String {
        let (_, json) = self.json(&["counter", "show", part]);
        json["next"].as_str().unwrap().to_string()
    }
}

fn serials(batch: &str, prefix: &str) -> Vec<String> {
    batch
        .lines()
        .filter_map(|l| l.strip_prefix(&format!("^FO20,60^FD{prefix}")))
        .map(|l| l.trim_end_matches("^FS").to_string())
        .collect()
}

// ── Templates and counters ──────────────────────────────────────────────

#[test]
fn templates_lists_formats() {
    let station = StationDir::new();
    let (output, json) = station.json(&["templates"]);
    assert!(output.status.success());
    assert_eq!(json, serde_json::json!(["SERIAL_SMALL", "Test_Print_label"]));
}

#[test]
fn counter_provision_and_show() {
    let station = StationDir::new();
    station.provision("7730-115", "000098", "100", "decimal");

    let (output, json) = station.json(&["counter", "show", "7730-115"]);
    assert!(output.status.success());
    assert_eq!(json["part"], "7730-115");
    assert_eq!(json["next"], "000098");
    assert_eq!(json["maxId"], 100);
    assert_eq!(json["scheme"], "decimal");
    assert_eq!(json["remaining"], 3);

    let (_, list) = station.json(&["counter", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[test]
fn counter_provision_rejects_bad_serial() {
    let station = StationDir::new();
    let (output, json) = station.json(&[
        "counter", "provision", "7730-115", "--next", "00AB", "--max-id", "100",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["status"], false);
    assert_eq!(json["message"], "backend.print.invalid_serial");
}

#[test]
fn counter_show_unknown_part() {
    let station = StationDir::new();
    let (output, json) = station.json(&["counter", "show", "nope"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["message"], "backend.db.part_not_found");
}

// ── Label commands ──────────────────────────────────────────────────────

#[test]
fn preview_shows_next_without_allocating() {
    let station = StationDir::new();
    station.provision("7730-115", "000100", "999999", "decimal");

    let (output, json) = station.json(&["preview", "--part", "7730-115"]);
    assert!(output.status.success());
    assert_eq!(json["status"], true);
    assert_eq!(json["message"], "backend.print.preview_success");
    let data = json["data"].as_str().unwrap();
    assert!(data.contains("^FD7730-115^FS"));
    assert!(data.contains("^FDLP000100^FS"));
    assert_eq!(station.next_serial("7730-115"), "000100");
}

#[test]
fn print_dry_run_allocates_consecutive_serials() {
    let station = StationDir::new();
    station.provision("7730-115", "00ZY", "100000", "base34");

    let (output, json) = station.json(&["print", "--part", "7730-115", "-n", "3", "--dry-run"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(json["message"], "backend.print.print_success");
    let data = json["data"].as_str().unwrap();
    assert_eq!(serials(data, "LP"), vec!["00ZY", "00ZZ", "0100"]);
    assert_eq!(data.matches("^PQ1").count(), 3);
    assert_eq!(station.next_serial("7730-115"), "0101");
}

#[test]
fn pretty_dry_run_writes_only_zpl_to_stdout() {
    let station = StationDir::new();
    station.provision("7730-115", "0001", "10", "decimal");

    let output = station
        .cmd()
        .args(["print", "--part", "7730-115", "--dry-run", "--output", "pretty"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("^XA"));
    assert!(stdout.trim_end().ends_with("^XZ"));
}

#[test]
fn print_past_max_id_reports_remaining() {
    let station = StationDir::new();
    station.provision("7730-115", "0098", "100", "decimal");

    let (output, json) = station.json(&["print", "--part", "7730-115", "-n", "5", "--dry-run"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["status"], false);
    assert_eq!(json["message"], "backend.print.serial_range_exceeded");
    assert_eq!(json["rawError"], "Remaining: 3");
    assert!(json.get("data").is_none());
    assert_eq!(station.next_serial("7730-115"), "0098");
}

#[test]
fn reprint_is_repeatable_and_does_not_allocate() {
    let station = StationDir::new();
    station.provision("7730-115", "0042", "9999", "decimal");

    let args = [
        "reprint", "--part", "7730-115", "--serial", "0010", "--date", "2026-01-02", "-n", "2",
        "--dry-run",
    ];
    let (first_out, first) = station.json(&args);
    let (_, second) = station.json(&args);
    assert!(first_out.status.success());
    assert_eq!(first["message"], "backend.print.reprint_success");
    assert_eq!(first, second);

    let data = first["data"].as_str().unwrap();
    assert_eq!(serials(data, "LP"), vec!["0010", "0011"]);
    assert!(data.contains("^FD26002^FS"));
    assert_eq!(station.next_serial("7730-115"), "0042");
}

#[test]
fn reprint_zero_serial_starts_at_next() {
    let station = StationDir::new();
    station.provision("7730-115", "0042", "9999", "decimal");

    let (_, json) = station.json(&["reprint", "--part", "7730-115", "--serial", "0", "--dry-run"]);
    assert_eq!(serials(json["data"].as_str().unwrap(), "LP"), vec!["0042"]);
}

#[test]
fn part_missing_from_catalog() {
    let station = StationDir::new();
    let (output, json) = station.json(&["preview", "--part", "0000-000"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["message"], "backend.parts.part_not_in_catalog");
    assert_eq!(json["rawError"], "0000-000");
}

#[test]
fn part_without_counter() {
    let station = StationDir::new();
    let (output, json) = station.json(&["print", "--part", "7730-115", "--dry-run"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["message"], "backend.db.part_not_found");
}

#[test]
fn part_with_missing_template() {
    let station = StationDir::new();
    station.provision("9001-001", "1", "9", "decimal");
    let (output, json) = station.json(&["preview", "--part", "9001-001"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["message"], "backend.print.template_not_found");
    assert_eq!(json["rawError"], "MISSING_FORMAT");
}

#[test]
fn quantity_is_bounded() {
    let station = StationDir::new();
    for n in ["0", "101"] {
        let output = station
            .cmd()
            .args(["print", "--part", "7730-115", "-n", n, "--dry-run"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(2), "quantity {n} should be rejected");
    }
}

// ── Printing to a printer ───────────────────────────────────────────────

/// Accept one connection and return everything received on it.
fn mock_printer() -> (u16, thread::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut received = Vec::new();
        let _ = stream.read_to_end(&mut received);
        received
    });
    (port, handle)
}

fn set_printer(station: &StationDir, port: u16) {
    let (output, _) = station.json(&[
        "config",
        "set-printer",
        "--ip",
        "127.0.0.1",
        "--port",
        &port.to_string(),
    ]);
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn print_sends_batch_to_printer() {
    let station = StationDir::new();
    station.provision("7730-115", "0001", "9999", "decimal");
    let (port, printer) = mock_printer();
    set_printer(&station, port);

    let (output, json) = station.json(&["print", "--part", "7730-115", "-n", "2"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(json["status"], true);

    let received = String::from_utf8(printer.join().unwrap()).unwrap();
    assert_eq!(received, json["data"].as_str().unwrap());
    assert_eq!(serials(&received, "LP"), vec!["0001", "0002"]);
    assert_eq!(station.next_serial("7730-115"), "0003");
}

#[test]
fn test_print_sends_raw_test_label() {
    let station = StationDir::new();
    let (port, printer) = mock_printer();
    set_printer(&station, port);

    let (output, json) = station.json(&["test-print"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(json["message"], "backend.printer.label_sent_successfully");
    assert_eq!(printer.join().unwrap(), TEST_LABEL.as_bytes());
}

#[test]
fn print_without_printer_config_keeps_serials() {
    let station = StationDir::new();
    station.provision("7730-115", "0001", "9999", "decimal");

    let (output, json) = station.json(&["print", "--part", "7730-115", "-n", "5"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["status"], false);
    assert_eq!(json["message"], "backend.config.invalid");
    assert!(json.get("data").is_none());
    assert_eq!(station.next_serial("7730-115"), "0001");

    // the same request in dry-run mode needs no printer
    let (output, _) = station.json(&["print", "--part", "7730-115", "-n", "5", "--dry-run"]);
    assert!(output.status.success());
    assert_eq!(station.next_serial("7730-115"), "0006");
}

#[test]
fn reprint_without_printer_config_fails_before_rendering() {
    let station = StationDir::new();
    station.provision("7730-115", "0001", "9999", "decimal");

    let (output, json) = station.json(&["reprint", "--part", "7730-115", "--serial", "0001"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["message"], "backend.config.invalid");
    assert_eq!(station.next_serial("7730-115"), "0001");
}

#[test]
fn print_to_unreachable_printer_reports_connection_error() {
    let station = StationDir::new();
    station.provision("7730-115", "0001", "9999", "decimal");
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    set_printer(&station, port);

    let (output, json) = station.json(&["print", "--part", "7730-115"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["message"], "backend.printer.connection_error");
    assert!(json["data"].as_str().unwrap().contains("^FDLP0001^FS"));
}

// ── Config ──────────────────────────────────────────────────────────────

fn read_config(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn set_printer_ip_and_com() {
    let station = StationDir::new();
    set_printer(&station, 6101);
    let saved = read_config(&station.config());
    assert_eq!(saved["printer"]["type"], "IP");
    assert_eq!(saved["printer"]["ip"], "127.0.0.1");
    assert_eq!(saved["printer"]["port"], 6101);

    let (output, json) = station.json(&["config", "set-printer", "--com", "COM3"]);
    assert!(output.status.success());
    assert_eq!(json["type"], "COM");
    assert_eq!(json["comPort"], "COM3");
    assert_eq!(json["baudRate"], 9600);
    // the IP settings survive a switch to COM
    assert_eq!(json["ip"], "127.0.0.1");
}

#[test]
fn set_printer_requires_a_connection() {
    let station = StationDir::new();
    let output = station.cmd().args(["config", "set-printer"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn set_printer_rejects_empty_ip() {
    let station = StationDir::new();
    let (output, json) = station.json(&["config", "set-printer", "--ip", " "]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["message"], "backend.config.invalid");
    assert_eq!(read_config(&station.config()), serde_json::json!({}));
}

#[test]
fn config_show_reports_defaults() {
    let station = StationDir::new();
    let (output, json) = station.json(&["config", "show"]);
    assert!(output.status.success());
    assert_eq!(json["printer"]["port"], 9100);
    assert_eq!(json["testLabelFormat"], "Test_Print_label");
}

#[test]
fn config_from_environment() {
    let station = StationDir::new();
    let output = Command::new(cargo::cargo_bin!("zlabel"))
        .env("ZLABEL_CONFIG", station.config())
        .args(["templates", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
}
