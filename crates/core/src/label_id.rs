//! Short per-unit label identifiers (`ID_LABEL`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Length of a label identifier.
pub const LABEL_ID_LEN: usize = 5;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Produces the `ID_LABEL` of a freshly printed unit.
pub trait LabelIdSource: Send + Sync {
    /// Identifier for the unit with `serial` of `part_number`.
    fn label_id(&self, part_number: &str, serial: &str) -> String;
}

/// Unpredictable ids: SHA-256 over wall-clock nanoseconds, a process-wide
/// sequence number and the unit's identity.
#[derive(Debug, Default)]
pub struct EntropyLabelIds {
    seq: AtomicU64,
}

impl EntropyLabelIds {
    /// A fresh source.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LabelIdSource for EntropyLabelIds {
    fn label_id(&self, part_number: &str, serial: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let mut hasher = Sha256::new();
        hasher.update(nanos.to_le_bytes());
        hasher.update(seq.to_le_bytes());
        hasher.update(part_number.as_bytes());
        hasher.update([0]);
        hasher.update(serial.as_bytes());
        to_id(&hasher.finalize())
    }
}

/// Deterministic id for a reprinted unit, so identical reprints match byte
/// for byte.
pub fn stable_label_id(part_number: &str, serial: &str, julian: &str) -> String {
    let mut hasher = Sha256::new();
    for piece in [part_number, serial, julian] {
        hasher.update(piece.as_bytes());
        hasher.update([0]);
    }
    to_id(&hasher.finalize())
}

fn to_id(digest: &[u8]) -> String {
    digest
        .iter()
        .take(LABEL_ID_LEN)
        .map(|b| ALPHABET[usize::from(*b) % ALPHABET.len()] as char)
        .collect()
}
