//! Output rendering for label responses, listings and errors.
//!
//! Pretty mode keeps label data on stdout and status lines on stderr, so
//! `zlabel print --dry-run > batch.zpl` captures only ZPL. JSON mode prints
//! exactly one JSON document to stdout.

use std::io::{self, IsTerminal};

use serde::Serialize;
use zpl_labeler_config::ConfigError;
use zpl_labeler_core::{CatalogError, GenerateResponse, LabelError, StoreError};
use zpl_labeler_print_client::PrintError;

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human-readable output.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Resolve `Auto` to a concrete format based on whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            // Default: pretty for interactive terminals, JSON for pipes
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Label responses ─────────────────────────────────────────────────────

/// Render a label response.
///
/// `note` is a status line for pretty mode; when it is `None` the ZPL
/// itself is the output.
pub(crate) fn response(resp: &GenerateResponse, format: Format, note: Option<&str>) {
    match format {
        Format::Json => json(resp),
        Format::Pretty if resp.status => match note {
            Some(note) => eprintln!("{note}"),
            None => print!("{}", resp.data.as_deref().unwrap_or_default()),
        },
        Format::Pretty => {
            let detail = resp.raw_error.as_deref().unwrap_or_default();
            eprintln!("error[{}]: {detail}", resp.message);
            if resp.is_commit_failure() {
                eprintln!("  = note: the batch was not sent; serials were not consumed");
            }
        }
    }
}

// ── Generic output ──────────────────────────────────────────────────────

/// Print any serializable value as pretty JSON to stdout.
pub(crate) fn json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error: cannot serialize output: {e}"),
    }
}

/// Print a list: one item per line, or a JSON array.
pub(crate) fn list<T: AsRef<str> + Serialize>(items: &[T], format: Format) {
    match format {
        Format::Json => json(items),
        Format::Pretty => {
            for item in items {
                println!("{}", item.as_ref());
            }
        }
    }
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Symbolic code for a command failure, from the first typed error in the
/// chain.
pub(crate) fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<LabelError>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<PrintError>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<StoreError>() {
            return match e {
                StoreError::PartNotFound(_) => "backend.db.part_not_found",
                _ => "backend.db.error",
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "backend.config.invalid";
        }
        if cause.downcast_ref::<CatalogError>().is_some() {
            return "backend.parts.catalog_error";
        }
    }
    "backend.cli.command_failed"
}

/// Report a failed command in the selected format.
pub(crate) fn error(err: &anyhow::Error, format: Format) {
    match format {
        Format::Json => json(&GenerateResponse {
            status: false,
            message: error_code(err).to_string(),
            data: None,
            raw_error: Some(format!("{err:#}")),
        }),
        Format::Pretty => eprintln!("error[{}]: {err:#}", error_code(err)),
    }
}
