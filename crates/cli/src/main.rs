mod render;
mod station;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use zpl_labeler_config::{DEFAULT_BAUD_RATE, DEFAULT_PRINTER_PORT, PrinterSettings};
use zpl_labeler_core::serial::{self, NumberingScheme};
use zpl_labeler_core::{
    CounterRecord, CounterStore, GenerateResponse, LabelError, LabelRequest, Part, RenderMode,
};
use zpl_labeler_print_client::{
    Printer, PrinterConfig, PrinterTarget, ReconnectRetryPrinter, list_serial_ports,
};

use crate::render::Format;
use crate::station::Station;

/// Exit code when the batch rendered but the counter could not be advanced.
const EXIT_COMMIT_FAILED: i32 = 3;

/// Largest batch one command may print.
const MAX_QUANTITY: u32 = 100;

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "zlabel",
    version,
    about = "ZPL label station: allocate serial numbers, fill label templates, print"
)]
struct Cli {
    /// Output mode: "pretty" for terminal output, "json" for the
    /// machine-readable response envelope. Defaults to "pretty" when stdout
    /// is a TTY, "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Station config file. Falls back to $ZLABEL_CONFIG, then ./zlabel.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    // ── Labels ──────────────────────────────────────────────────────
    /// Show one label with the part's next serial. Nothing is allocated.
    Preview {
        /// Part number from the parts catalog.
        #[arg(long)]
        part: String,
    },

    /// Allocate serials for a batch, render it and send it to the printer.
    Print {
        /// Part number from the parts catalog.
        #[arg(long)]
        part: String,
        /// Number of labels (one serial each).
        #[arg(long, short = 'n', default_value_t = 1, value_parser = quantity_in_range)]
        quantity: u32,
        /// Write the batch to stdout instead of the printer. Serials are
        /// still allocated.
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-render labels for serials that were already printed.
    Reprint {
        /// Part number from the parts catalog.
        #[arg(long)]
        part: String,
        /// Date for the julian code (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
        /// First serial to reprint. Omitted or "0" means the part's next
        /// serial.
        #[arg(long)]
        serial: Option<String>,
        /// Number of labels.
        #[arg(long, short = 'n', default_value_t = 1, value_parser = quantity_in_range)]
        quantity: u32,
        /// Write the batch to stdout instead of the printer.
        #[arg(long)]
        dry_run: bool,
    },

    /// List the label formats found in the templates directory.
    Templates,

    // ── Station data ────────────────────────────────────────────────
    /// Inspect or provision per-part serial counters.
    Counter {
        #[command(subcommand)]
        cmd: CounterCmd,
    },

    /// Show or edit the station config.
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },

    // ── Printer ─────────────────────────────────────────────────────
    /// List serial ports on this machine.
    Ports,

    /// Check the configured printer accepts a connection.
    Status,

    /// Send the fixed test label to the configured printer.
    TestPrint {
        /// Write the test label to stdout instead of the printer.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CounterCmd {
    /// Show one part's counter.
    Show {
        /// Part number.
        part: String,
    },
    /// Show every counter.
    List,
    /// Create or replace a part's counter.
    Provision {
        /// Part number.
        part: String,
        /// Next serial to hand out; its length sets the serial width.
        #[arg(long)]
        next: String,
        /// Highest serial ordinal that may be allocated.
        #[arg(long)]
        max_id: u64,
        /// Numbering scheme: "decimal" or "base34".
        #[arg(long, default_value = "decimal")]
        scheme: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    /// Print the effective config.
    Show,
    /// Point the station at a network or serial printer.
    #[command(group(ArgGroup::new("connection").required(true).args(["ip", "com"])))]
    SetPrinter {
        /// Printer host name or IP address.
        #[arg(long)]
        ip: Option<String>,
        /// Printer TCP port [default: 9100].
        #[arg(long, requires = "ip")]
        port: Option<u16>,
        /// Serial port name (COM3, /dev/ttyUSB0, ...).
        #[arg(long)]
        com: Option<String>,
        /// Serial baud rate [default: 9600].
        #[arg(long, requires = "com")]
        baud: Option<u32>,
    },
}

fn quantity_in_range(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (1..=MAX_QUANTITY).contains(&n) {
        Ok(n)
    } else {
        Err(format!("quantity must be between 1 and {MAX_QUANTITY}"))
    }
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    if let Err(err) = run(cli, format) {
        render::error(&err, format);
        process::exit(1);
    }
}

/// Logs go to stderr so they never mix with ZPL or JSON on stdout.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, format: Format) -> Result<()> {
    let station = Station::load(cli.config.as_deref())?;

    match cli.cmd {
        Cmd::Preview { part } => {
            let req = label_request(part, RenderMode::Preview);
            cmd_label(&station, req, false, format)
        }
        Cmd::Print {
            part,
            quantity,
            dry_run,
        } => {
            let mut req = label_request(part, RenderMode::Print);
            req.quantity = quantity;
            cmd_label(&station, req, dry_run, format)
        }
        Cmd::Reprint {
            part,
            date,
            serial,
            quantity,
            dry_run,
        } => {
            let mut req = label_request(part, RenderMode::Reprint);
            req.quantity = quantity;
            req.date = date;
            req.serial_number = serial;
            cmd_label(&station, req, dry_run, format)
        }
        Cmd::Templates => cmd_templates(&station, format),
        Cmd::Counter { cmd } => cmd_counter(&station, cmd, format),
        Cmd::Config { cmd } => cmd_config(&station, cmd, format),
        Cmd::Ports => cmd_ports(format),
        Cmd::Status => cmd_status(&station, format),
        Cmd::TestPrint { dry_run } => cmd_test_print(&station, dry_run, format),
    }
}

// ── Label commands ──────────────────────────────────────────────────────

/// A request with the part number only; the part itself is filled in from
/// the catalog by [`cmd_label`].
fn label_request(part_number: String, mode: RenderMode) -> LabelRequest {
    LabelRequest {
        part: Part {
            part_number,
            serial_prefix: String::new(),
            label_format: String::new(),
            description: String::new(),
        },
        quantity: 1,
        mode: mode.as_str().to_string(),
        date: None,
        serial_number: None,
    }
}

fn cmd_label(station: &Station, mut req: LabelRequest, dry_run: bool, format: Format) -> Result<()> {
    req.part = match station.part(&req.part.part_number) {
        Ok(part) => part,
        Err(err) => match err.downcast::<LabelError>() {
            Ok(label_err) => fail(&GenerateResponse::failure(label_err), format, 1),
            Err(other) => return Err(other),
        },
    };

    // Resolve the printer before allocating, so a missing or invalid
    // printer config fails without consuming serials.
    let sends = req.mode != RenderMode::Preview.as_str() && !dry_run;
    let target = if sends { Some(station.printer()?) } else { None };

    let service = station.service()?;
    let resp = service.generate(&req);

    if !resp.status {
        if resp.is_commit_failure() {
            error!(part = %req.part.part_number, "counter commit failed, batch withheld from printer");
            fail(&resp, format, EXIT_COMMIT_FAILED);
        }
        fail(&resp, format, 1);
    }

    let Some(target) = target else {
        render::response(&resp, format, None);
        return Ok(());
    };

    let batch = resp.data.as_deref().unwrap_or_default();
    if let Err(err) = target.send(batch, &PrinterConfig::default()) {
        if req.mode == RenderMode::Print.as_str() {
            warn!(
                part = %req.part.part_number,
                quantity = req.quantity,
                "serials were allocated but the batch did not reach the printer; use reprint"
            );
        }
        let failed = GenerateResponse {
            status: false,
            message: err.code().to_string(),
            data: resp.data.clone(),
            raw_error: Some(err.to_string()),
        };
        fail(&failed, format, 1);
    }

    let note = format!(
        "{}: {} label(s) for {} sent to {target}",
        resp.message, req.quantity, req.part.part_number
    );
    render::response(&resp, format, Some(&note));
    Ok(())
}

/// Render a failed response and exit.
fn fail(resp: &GenerateResponse, format: Format, code: i32) -> ! {
    render::response(resp, format, None);
    process::exit(code)
}

fn cmd_templates(station: &Station, format: Format) -> Result<()> {
    let templates = station.templates()?;
    let formats: Vec<&str> = templates.formats().collect();
    render::list(&formats, format);
    Ok(())
}

// ── Counters ────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CounterView<'a> {
    part: &'a str,
    #[serde(flatten)]
    record: &'a CounterRecord,
    remaining: Option<u64>,
}

impl<'a> CounterView<'a> {
    fn new(part: &'a str, record: &'a CounterRecord) -> Self {
        Self {
            part,
            record,
            remaining: remaining(record),
        }
    }

    fn line(&self) -> String {
        let remaining = self
            .remaining
            .map_or_else(|| "?".to_string(), |r| r.to_string());
        format!(
            "{}  next={}  maxId={}  scheme={}  remaining={remaining}",
            self.part, self.record.next, self.record.max_id, self.record.scheme
        )
    }
}

/// Serials left from `next` through `max_id`, when the record is readable.
fn remaining(record: &CounterRecord) -> Option<u64> {
    let scheme: NumberingScheme = record.scheme.parse().ok()?;
    let next = serial::decode(&record.next, scheme).ok()?;
    Some(
        record
            .max_id
            .checked_sub(next)
            .map_or(0, |d| d.saturating_add(1)),
    )
}

fn cmd_counter(station: &Station, cmd: CounterCmd, format: Format) -> Result<()> {
    let store = station.store()?;
    match cmd {
        CounterCmd::Show { part } => {
            let record = store.read_cursor(&part)?;
            let view = CounterView::new(&part, &record);
            match format {
                Format::Json => render::json(&view),
                Format::Pretty => println!("{}", view.line()),
            }
        }
        CounterCmd::List => {
            let records = store.list()?;
            let views: Vec<CounterView<'_>> = records
                .iter()
                .map(|(part, record)| CounterView::new(part, record))
                .collect();
            match format {
                Format::Json => render::json(&views),
                Format::Pretty => {
                    for view in &views {
                        println!("{}", view.line());
                    }
                }
            }
        }
        CounterCmd::Provision {
            part,
            next,
            max_id,
            scheme,
        } => {
            let parsed: NumberingScheme = scheme.parse()?;
            let ordinal = serial::decode(&next, parsed)?;
            if ordinal > max_id {
                bail!("next serial {next} is already past max id {max_id}");
            }
            let record = CounterRecord::new(next, max_id, parsed.name());
            store.provision(&part, &record)?;
            let view = CounterView::new(&part, &record);
            match format {
                Format::Json => render::json(&view),
                Format::Pretty => eprintln!("provisioned {}", view.line()),
            }
        }
    }
    Ok(())
}

// ── Config ──────────────────────────────────────────────────────────────

fn cmd_config(station: &Station, cmd: ConfigCmd, format: Format) -> Result<()> {
    match cmd {
        ConfigCmd::Show => {
            if format == Format::Pretty {
                eprintln!("# {}", station.path().display());
            }
            render::json(station.config());
        }
        ConfigCmd::SetPrinter {
            ip,
            port,
            com,
            baud,
        } => {
            let mut config = station.stored_config()?;
            config.printer = match (ip, com) {
                (Some(ip), _) => PrinterSettings {
                    com_port: config.printer.com_port.clone(),
                    baud_rate: config.printer.baud_rate,
                    ..PrinterSettings::ip(ip, port.unwrap_or(DEFAULT_PRINTER_PORT))
                },
                (None, Some(com)) => PrinterSettings {
                    ip: config.printer.ip.clone(),
                    port: config.printer.port,
                    ..PrinterSettings::com(com, baud.unwrap_or(DEFAULT_BAUD_RATE))
                },
                (None, None) => bail!("either --ip or --com is required"),
            };
            station.save(&config)?;
            match format {
                Format::Json => render::json(&config.printer),
                Format::Pretty => eprintln!("printer saved to {}", station.path().display()),
            }
        }
    }
    Ok(())
}

// ── Printer ─────────────────────────────────────────────────────────────

fn cmd_ports(format: Format) -> Result<()> {
    let ports = list_serial_ports()?;
    render::list(&ports, format);
    Ok(())
}

#[derive(Serialize)]
struct StatusView<'a> {
    status: bool,
    message: &'static str,
    printer: &'a PrinterTarget,
}

fn cmd_status(station: &Station, format: Format) -> Result<()> {
    let target = station.printer()?;
    target
        .probe(&PrinterConfig::default())
        .with_context(|| format!("printer {target} is not reachable"))?;
    match format {
        Format::Json => render::json(&StatusView {
            status: true,
            message: "backend.printer.online",
            printer: &target,
        }),
        Format::Pretty => eprintln!("printer online: {target}"),
    }
    Ok(())
}

fn cmd_test_print(station: &Station, dry_run: bool, format: Format) -> Result<()> {
    let templates = station.templates()?;
    let label = templates.raw(&station.config().test_label_format)?;

    if dry_run {
        match format {
            Format::Json => render::json(&GenerateResponse {
                status: true,
                message: "backend.printer.test_label_ready".into(),
                data: Some(label.to_string()),
                raw_error: None,
            }),
            Format::Pretty => print!("{label}"),
        }
        return Ok(());
    }

    let target = station.printer()?;
    let config = PrinterConfig::default();
    // A repeated test label is harmless, so the send itself is retried too.
    let mut printer = ReconnectRetryPrinter::new(target.open(&config)?, config.retry.clone());
    printer.send_zpl(label)?;
    match format {
        Format::Json => render::json(&StatusView {
            status: true,
            message: "backend.printer.label_sent_successfully",
            printer: &target,
        }),
        Format::Pretty => eprintln!("test label sent to {target}"),
    }
    Ok(())
}
