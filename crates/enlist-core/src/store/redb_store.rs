//! redb-backed record store.
//!
//! One table, `recruits`: key is the record id, value is a one-byte format
//! version followed by the postcard encoding of the record. Every write is a
//! single transaction, so a failed batch leaves nothing behind.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition, TableError,
};
use std::path::Path;
use tracing::debug;

use super::{RecordStore, check_batch_ids};
use crate::error::{EnlistError, Result};
use crate::record::{Recruit, RecruitId, RecruitPatch};

const RECRUITS: TableDefinition<&str, &[u8]> = TableDefinition::new("recruits");

/// Current value encoding.
const FORMAT_VERSION: u8 = 1;

/// Encode a record as `[FORMAT_VERSION, postcard bytes...]`.
pub fn encode_record(record: &Recruit) -> Result<Vec<u8>> {
    let body = postcard::to_allocvec(record)?;
    let mut bytes = Vec::with_capacity(body.len().saturating_add(1));
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode a value written by [`encode_record`].
pub fn decode_record(bytes: &[u8]) -> Result<Recruit> {
    match bytes.split_first() {
        Some((&FORMAT_VERSION, body)) => Ok(postcard::from_bytes(body)?),
        Some((&version, _)) => Err(EnlistError::UnsupportedFormat(version)),
        None => Err(EnlistError::Serialization("empty record value".to_string())),
    }
}

/// Disk-backed store.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Create (or open) a database at `path` and make sure the table exists.
    pub fn create(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(EnlistError::storage)?;
        let txn = db.begin_write().map_err(EnlistError::storage)?;
        txn.open_table(RECRUITS).map_err(EnlistError::storage)?;
        txn.commit().map_err(EnlistError::storage)?;
        Ok(Self { db })
    }

    /// Open an existing database.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::open(path).map_err(EnlistError::storage)?;
        Ok(Self { db })
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize> {
        let txn = self.db.begin_read().map_err(EnlistError::storage)?;
        match txn.open_table(RECRUITS) {
            Ok(table) => Ok(table.len().map_err(EnlistError::storage)? as usize),
            Err(TableError::TableDoesNotExist(_)) => Ok(0),
            Err(err) => Err(EnlistError::storage(err)),
        }
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Look up one record.
    pub fn get(&self, id: &RecruitId) -> Result<Option<Recruit>> {
        let txn = self.db.begin_read().map_err(EnlistError::storage)?;
        let table = match txn.open_table(RECRUITS) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(EnlistError::storage(err)),
        };
        table
            .get(id.as_str())
            .map_err(EnlistError::storage)?
            .map(|guard| decode_record(guard.value()))
            .transpose()
    }
}

impl RecordStore for RedbStore {
    fn load_all(&self) -> Result<Vec<Recruit>> {
        let txn = self.db.begin_read().map_err(EnlistError::storage)?;
        let table = match txn.open_table(RECRUITS) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(err) => return Err(EnlistError::storage(err)),
        };

        let mut records = Vec::new();
        for entry in table.iter().map_err(EnlistError::storage)? {
            let (_id, value) = entry.map_err(EnlistError::storage)?;
            records.push(decode_record(value.value())?);
        }
        Ok(records)
    }

    fn bulk_create(&mut self, records: Vec<Recruit>) -> Result<()> {
        check_batch_ids(&records)?;

        let txn = self.db.begin_write().map_err(EnlistError::storage)?;
        {
            let mut table = txn.open_table(RECRUITS).map_err(EnlistError::storage)?;
            for record in &records {
                let key = record.id.as_str();
                if table.get(key).map_err(EnlistError::storage)?.is_some() {
                    // Dropping the uncommitted transaction aborts it.
                    return Err(EnlistError::DuplicateRecord(key.to_string()));
                }
                let value = encode_record(record)?;
                table
                    .insert(key, value.as_slice())
                    .map_err(EnlistError::storage)?;
            }
        }
        txn.commit().map_err(EnlistError::storage)?;

        debug!(records = records.len(), "bulk create committed");
        Ok(())
    }

    fn update_record(&mut self, id: &RecruitId, patch: &RecruitPatch) -> Result<()> {
        let txn = self.db.begin_write().map_err(EnlistError::storage)?;
        {
            let mut table = txn.open_table(RECRUITS).map_err(EnlistError::storage)?;
            let existing = table
                .get(id.as_str())
                .map_err(EnlistError::storage)?
                .map(|guard| decode_record(guard.value()))
                .transpose()?;
            let Some(mut record) = existing else {
                return Err(EnlistError::RecordNotFound(id.to_string()));
            };
            record.apply(patch);
            let value = encode_record(&record)?;
            table
                .insert(id.as_str(), value.as_slice())
                .map_err(EnlistError::storage)?;
        }
        txn.commit().map_err(EnlistError::storage)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::{EnlistmentType, Status};
    use crate::reference::ReferenceTables;
    use crate::scope::{Role, Scope};
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, RedbStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::create(&dir.path().join("roster.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn encode_decode_preserves_record() {
        let mut record = Recruit::new("r1", 2024, Status::Finalized)
            .with_dob("2003-04-05")
            .with_enlistment(EnlistmentType::Reserve)
            .with_address("Ha Noi", "Dong Anh", "Thon 1");
        record.physical.bmi = Some(21.4);
        record.details.education_period = Some("2021-2025".into());

        let bytes = encode_record(&record).unwrap();
        assert_eq!(bytes[0], FORMAT_VERSION);
        assert_eq!(decode_record(&bytes).unwrap(), record);
    }

    #[test]
    fn decode_rejects_unknown_version() {
        assert!(matches!(
            decode_record(&[99, 0, 0]),
            Err(EnlistError::UnsupportedFormat(99))
        ));
        assert!(decode_record(&[]).is_err());
    }

    #[test]
    fn create_load_and_update() {
        let (_dir, mut store) = temp_store();
        assert!(store.is_empty().unwrap());

        let records = vec![
            Recruit::new("a", 2024, Status::Source).with_dob("2002"),
            Recruit::new("b", 2024, Status::Deferred).with_dob("2001"),
        ];
        store.bulk_create(records).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        let tables = ReferenceTables::default();
        let count = store.count_cohort(2024, &Scope::Nation, Role::Officer, &tables);
        assert_eq!(count.unwrap(), 2);

        let id = RecruitId::new("a");
        store
            .update_record(&id, &RecruitPatch::status(Status::PreCheckPassed))
            .unwrap();
        let updated = store.get(&id).unwrap().unwrap();
        assert_eq!(updated.status, Status::PreCheckPassed);
        assert_eq!(updated.birth_year(), Some(2002));
    }

    #[test]
    fn update_missing_record_fails() {
        let (_dir, mut store) = temp_store();
        let result = store.update_record(&RecruitId::new("nope"), &RecruitPatch::default());
        assert!(matches!(result, Err(EnlistError::RecordNotFound(_))));
    }

    #[test]
    fn duplicate_batch_writes_nothing() {
        let (_dir, mut store) = temp_store();
        store
            .bulk_create(vec![Recruit::new("a", 2024, Status::Source)])
            .unwrap();

        let batch = vec![
            Recruit::new("b", 2025, Status::Source),
            Recruit::new("a", 2025, Status::Source),
        ];
        assert!(matches!(
            store.bulk_create(batch),
            Err(EnlistError::DuplicateRecord(_))
        ));
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get(&RecruitId::new("b")).unwrap(), None);
    }

    #[test]
    fn reopen_sees_committed_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.redb");
        {
            let mut store = RedbStore::create(&path).unwrap();
            store
                .bulk_create(vec![Recruit::new("a", 2024, Status::Source)])
                .unwrap();
        }
        let reopened = RedbStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
        assert_eq!(reopened.load_all().unwrap()[0].id, RecruitId::new("a"));
    }
}
