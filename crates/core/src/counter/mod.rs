//! Per-part serial counters.
//!
//! A counter record holds the next unallocated serial and the highest
//! ordinal the part may use. Records are provisioned out of band; the label
//! service only reads them and overwrites `next` after a successful print.

mod memory;
#[cfg(feature = "redb")]
mod redb_store;

pub use memory::MemoryCounterStore;
#[cfg(feature = "redb")]
pub use redb_store::RedbCounterStore;

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Persisted allocation state of one part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterRecord {
    /// Next unallocated serial, at the scheme's display width.
    pub next: String,
    /// Highest ordinal that may be allocated.
    pub max_id: u64,
    /// Stored numbering scheme name (`decimal` or `base34`).
    pub scheme: String,
}

impl CounterRecord {
    /// Build a record.
    pub fn new(next: impl Into<String>, max_id: u64, scheme: impl Into<String>) -> Self {
        Self {
            next: next.into(),
            max_id,
            scheme: scheme.into(),
        }
    }
}

/// Durable counter storage keyed by part number.
pub trait CounterStore: Send + Sync {
    /// Read a part's record. Fails with [`StoreError::PartNotFound`].
    fn read_cursor(&self, part_number: &str) -> Result<CounterRecord, StoreError>;

    /// Overwrite a part's `next`. The caller computes the value.
    fn advance_cursor(&self, part_number: &str, new_next: &str) -> Result<(), StoreError>;

    /// Create or replace a part's record (administrative path).
    fn provision(&self, part_number: &str, record: &CounterRecord) -> Result<(), StoreError>;

    /// All records, ordered by part number.
    fn list(&self) -> Result<Vec<(String, CounterRecord)>, StoreError>;
}

impl<S: CounterStore + ?Sized> CounterStore for std::sync::Arc<S> {
    fn read_cursor(&self, part_number: &str) -> Result<CounterRecord, StoreError> {
        (**self).read_cursor(part_number)
    }

    fn advance_cursor(&self, part_number: &str, new_next: &str) -> Result<(), StoreError> {
        (**self).advance_cursor(part_number, new_next)
    }

    fn provision(&self, part_number: &str, record: &CounterRecord) -> Result<(), StoreError> {
        (**self).provision(part_number, record)
    }

    fn list(&self) -> Result<Vec<(String, CounterRecord)>, StoreError> {
        (**self).list()
    }
}
