//! Serial number codec: string form ⇄ integer ordinal.
//!
//! Serials are fixed-width, left-zero-padded strings. Width is never stored
//! separately; [`advance`] takes it from the input serial so leading zeros
//! survive increments. A result wider than its input is returned as-is.
//!
//! The scheme stored as `base34` is encoded with the full base-36 alphabet
//! (`0-9A-Z`, uppercase on output, case-insensitive on input). Existing
//! counters were written with that alphabet, so a 34-symbol alphabet would
//! reinterpret stored serials.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::LabelError;

const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Numbering scheme of a part's serials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingScheme {
    /// Base-10 digits.
    Decimal,
    /// Uppercase base-36 (stored under the name `base34`).
    Base34,
}

impl NumberingScheme {
    /// The name this scheme is stored under.
    pub fn name(self) -> &'static str {
        match self {
            NumberingScheme::Decimal => "decimal",
            NumberingScheme::Base34 => "base34",
        }
    }

    fn radix(self) -> u32 {
        match self {
            NumberingScheme::Decimal => 10,
            NumberingScheme::Base34 => 36,
        }
    }

    fn accepts(self, b: u8) -> bool {
        match self {
            NumberingScheme::Decimal => b.is_ascii_digit(),
            NumberingScheme::Base34 => b.is_ascii_alphanumeric(),
        }
    }
}

impl fmt::Display for NumberingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumberingScheme {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decimal" => Ok(NumberingScheme::Decimal),
            "base34" => Ok(NumberingScheme::Base34),
            other => Err(LabelError::UnsupportedNumberingScheme(other.to_string())),
        }
    }
}

/// Decode a serial string to its ordinal.
pub fn decode(serial: &str, scheme: NumberingScheme) -> Result<u64, LabelError> {
    let invalid = || LabelError::InvalidSerialFormat {
        serial: serial.to_string(),
        scheme: scheme.name(),
    };

    if serial.is_empty() || !serial.bytes().all(|b| scheme.accepts(b)) {
        return Err(invalid());
    }
    u64::from_str_radix(serial, scheme.radix()).map_err(|_| invalid())
}

/// Encode an ordinal, left-padded with `0` to at least `width` characters.
pub fn encode(ordinal: u64, width: usize, scheme: NumberingScheme) -> String {
    let radix = u64::from(scheme.radix());
    let mut digits = Vec::new();
    let mut n = ordinal;
    loop {
        digits.push(DIGITS[(n % radix) as usize]);
        n /= radix;
        if n == 0 {
            break;
        }
    }
    while digits.len() < width {
        digits.push(b'0');
    }
    digits.reverse();
    // Only ASCII bytes from DIGITS were pushed.
    String::from_utf8(digits).unwrap_or_default()
}

/// Add `increment` to a serial, keeping the input's width.
pub fn advance(serial: &str, increment: u64, scheme: NumberingScheme) -> Result<String, LabelError> {
    let ordinal = decode(serial, scheme)?;
    let next = ordinal
        .checked_add(increment)
        .ok_or_else(|| LabelError::InvalidSerialFormat {
            serial: serial.to_string(),
            scheme: scheme.name(),
        })?;
    Ok(encode(next, serial.len(), scheme))
}

/// [`advance`] with the scheme given by its stored name.
pub fn advance_named(serial: &str, increment: u64, scheme: &str) -> Result<String, LabelError> {
    advance(serial, increment, scheme.parse()?)
}
