//! Placeholder substitution for ZPL templates.
//!
//! Tokens have the form `*NAME*`. The template is scanned once, left to
//! right; substituted text is never rescanned, so the result does not depend
//! on key order even when a value contains something that looks like a token.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Delimiter around placeholder names.
const DELIM: char = '*';

/// A value substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Inserted verbatim.
    Text(String),
    /// Inserted in plain decimal notation.
    Number(u64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Number(n)
    }
}

/// Key → value mapping for one filled label.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Replace every `*KEY*` whose `KEY` is in `values`; other tokens are kept.
pub fn fill(template: &str, values: &FieldMap) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(DELIM) {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find(DELIM) {
            Some(close) => {
                let name = &after_open[..close];
                if let Some(value) = values.get(name) {
                    out.push_str(&value.to_string());
                    rest = &after_open[close + 1..];
                } else {
                    // Not a known key: keep the opening delimiter and let the
                    // closing one start the next candidate token.
                    out.push(DELIM);
                    rest = after_open;
                }
            }
            None => {
                out.push(DELIM);
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Distinct placeholder names that appear in a template.
///
/// A name is a non-empty run of ASCII letters, digits and `_` between two
/// delimiters.
pub fn placeholders(template: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut rest = template;
    while let Some(open) = rest.find(DELIM) {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find(DELIM) else {
            break;
        };
        let name = &after_open[..close];
        if !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            found.insert(name.to_string());
            rest = &after_open[close + 1..];
        } else {
            rest = after_open;
        }
    }
    found
}
