use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::{CounterRecord, CounterStore};
use crate::StoreError;

/// In-process counter store.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    records: RwLock<BTreeMap<String, CounterRecord>>,
}

impl MemoryCounterStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `(part number, record)` pairs.
    pub fn with_records<I, K>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, CounterRecord)>,
        K: Into<String>,
    {
        Self {
            records: RwLock::new(records.into_iter().map(|(k, r)| (k.into(), r)).collect()),
        }
    }
}

impl CounterStore for MemoryCounterStore {
    fn read_cursor(&self, part_number: &str) -> Result<CounterRecord, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(part_number)
            .cloned()
            .ok_or_else(|| StoreError::PartNotFound(part_number.to_string()))
    }

    fn advance_cursor(&self, part_number: &str, new_next: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .get_mut(part_number)
            .ok_or_else(|| StoreError::PartNotFound(part_number.to_string()))?;
        record.next = new_next.to_string();
        Ok(())
    }

    fn provision(&self, part_number: &str, record: &CounterRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(part_number.to_string(), record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<(String, CounterRecord)>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .iter()
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect())
    }
}
