use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use super::{CounterRecord, CounterStore};
use crate::StoreError;

/// Part number → JSON-encoded [`CounterRecord`].
const COUNTERS: TableDefinition<&str, &str> = TableDefinition::new("counters");

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Counter store backed by an embedded redb database file.
///
/// Every call runs in its own transaction. redb admits one write
/// transaction at a time, so an `advance_cursor` never interleaves with
/// another write to the same file.
pub struct RedbCounterStore {
    db: Database,
}

impl RedbCounterStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(backend)?;

        // Make sure the table exists so first reads don't fail.
        let txn = db.begin_write().map_err(backend)?;
        {
            let _table = txn.open_table(COUNTERS).map_err(backend)?;
        }
        txn.commit().map_err(backend)?;

        debug!(path = %path.display(), "opened counter database");
        Ok(Self { db })
    }
}

fn decode_record(part_number: &str, raw: &str) -> Result<CounterRecord, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        part: part_number.to_string(),
        reason: e.to_string(),
    })
}

fn encode_record(record: &CounterRecord) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(backend)
}

impl CounterStore for RedbCounterStore {
    fn read_cursor(&self, part_number: &str) -> Result<CounterRecord, StoreError> {
        let txn = self.db.begin_read().map_err(backend)?;
        let table = txn.open_table(COUNTERS).map_err(backend)?;
        let raw = table
            .get(part_number)
            .map_err(backend)?
            .map(|v| v.value().to_string())
            .ok_or_else(|| StoreError::PartNotFound(part_number.to_string()))?;
        decode_record(part_number, &raw)
    }

    fn advance_cursor(&self, part_number: &str, new_next: &str) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = txn.open_table(COUNTERS).map_err(backend)?;
            let raw = table
                .get(part_number)
                .map_err(backend)?
                .map(|v| v.value().to_string())
                .ok_or_else(|| StoreError::PartNotFound(part_number.to_string()))?;
            let mut record = decode_record(part_number, &raw)?;
            record.next = new_next.to_string();
            let encoded = encode_record(&record)?;
            table
                .insert(part_number, encoded.as_str())
                .map_err(backend)?;
        }
        txn.commit().map_err(backend)?;
        debug!(part = part_number, next = new_next, "counter advanced");
        Ok(())
    }

    fn provision(&self, part_number: &str, record: &CounterRecord) -> Result<(), StoreError> {
        let encoded = encode_record(record)?;
        let txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = txn.open_table(COUNTERS).map_err(backend)?;
            table
                .insert(part_number, encoded.as_str())
                .map_err(backend)?;
        }
        txn.commit().map_err(backend)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<(String, CounterRecord)>, StoreError> {
        let txn = self.db.begin_read().map_err(backend)?;
        let table = txn.open_table(COUNTERS).map_err(backend)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(backend)? {
            let (key, value) = entry.map_err(backend)?;
            let part = key.value().to_string();
            let record = decode_record(&part, value.value())?;
            out.push((part, record));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, RedbCounterStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbCounterStore::open(&dir.path().join("counters.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn provision_read_advance() {
        let (_dir, store) = open_temp();
        store
            .provision("PN-7", &CounterRecord::new("00A0", 5000, "base34"))
            .unwrap();
        store.advance_cursor("PN-7", "00A3").unwrap();
        let rec = store.read_cursor("PN-7").unwrap();
        assert_eq!(rec, CounterRecord::new("00A3", 5000, "base34"));
    }

    #[test]
    fn missing_part_is_reported() {
        let (_dir, store) = open_temp();
        assert!(matches!(
            store.read_cursor("ghost"),
            Err(StoreError::PartNotFound(_))
        ));
        assert!(matches!(
            store.advance_cursor("ghost", "0001"),
            Err(StoreError::PartNotFound(_))
        ));
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.redb");
        {
            let store = RedbCounterStore::open(&path).unwrap();
            store
                .provision("PN-1", &CounterRecord::new("0001", 10, "decimal"))
                .unwrap();
            store.advance_cursor("PN-1", "0002").unwrap();
        }
        let store = RedbCounterStore::open(&path).unwrap();
        assert_eq!(store.read_cursor("PN-1").unwrap().next, "0002");
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
