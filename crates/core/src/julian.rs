//! Julian date codes (`YY` + three-digit day of year) and the clock seam.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};

/// Source of "today" for date codes.
pub trait Clock: Send + Sync {
    /// The current local calendar date.
    fn today(&self) -> NaiveDate;
}

/// Reads the system's local date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Format a date as `YYDDD`.
pub fn julian_code(date: NaiveDate) -> String {
    format!("{:02}{:03}", date.year().rem_euclid(100), date.ordinal())
}

/// Julian code for an optional caller-supplied date, falling back to `today`.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and `YYYY-MM-DDTHH:MM:SS`.
/// Blank or unparseable input silently uses `today`.
pub fn julian_date(supplied: Option<&str>, today: NaiveDate) -> String {
    let date = supplied.and_then(parse_date).unwrap_or(today);
    julian_code(date)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}
