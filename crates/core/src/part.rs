//! Parts and label requests as they cross the caller boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::LabelError;

/// A manufacturable item, as listed in the parts catalog.
///
/// Accepts both the wire names (`partNumber`, ...) and the catalog export's
/// legacy names (`Part_Number`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Unique part identifier; also the counter key.
    #[serde(alias = "Part_Number")]
    pub part_number: String,
    /// Display/grouping prefix printed next to the serial.
    #[serde(alias = "Serial_Prefix", default)]
    pub serial_prefix: String,
    /// Format id of the label template.
    #[serde(alias = "Label_Format")]
    pub label_format: String,
    /// Free-text description.
    #[serde(alias = "Part_Description", default)]
    pub description: String,
}

/// What a label request does with the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Allocate `quantity` serials and advance the counter.
    Print,
    /// Render one label showing the next serial; no allocation.
    Preview,
    /// Re-render historical serials; no allocation.
    Reprint,
}

impl RenderMode {
    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::Print => "print",
            RenderMode::Preview => "preview",
            RenderMode::Reprint => "reprint",
        }
    }

    /// Message code reported on success.
    pub fn success_code(self) -> &'static str {
        match self {
            RenderMode::Print => "backend.print.print_success",
            RenderMode::Preview => "backend.print.preview_success",
            RenderMode::Reprint => "backend.print.reprint_success",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "print" => Ok(RenderMode::Print),
            "preview" => Ok(RenderMode::Preview),
            "reprint" => Ok(RenderMode::Reprint),
            other => Err(LabelError::UnknownMode(other.to_string())),
        }
    }
}

fn default_quantity() -> u32 {
    1
}

/// A label generation request in wire form.
///
/// `mode` stays a string here so an unknown mode becomes a structured
/// [`LabelError::UnknownMode`] response instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRequest {
    /// The part to label.
    pub part: Part,
    /// Number of labels; must be at least 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// `print`, `preview` or `reprint`.
    pub mode: String,
    /// Reprint only: production date (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Reprint only: first serial; `"0"` means the counter's `next`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}
