use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};

use super::{MetadataStore, MetadataStoreError};
use crate::record::{FileRecord, RecordQuery};

/// File records: uuid -> FileRecord (msgpack)
const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// Name index: file name -> uuid (at most one record per name)
const RECORD_NAMES: TableDefinition<&str, &str> = TableDefinition::new("record_names");

/// Creator index: created_by -> msgpack Vec of record UUIDs
const CREATOR_RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("creator_records");

/// redb-backed metadata store. The default backend: an embedded, crash-safe
/// key-value database holding one record table plus name and creator indexes.
pub struct RedbMetadataStore {
    db: Arc<Database>,
}

impl RedbMetadataStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, MetadataStoreError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("file-registry.redb");
        let db = Arc::new(Database::create(db_path)?);

        // Initialize tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS)?;
            let _ = write_txn.open_table(RECORD_NAMES)?;
            let _ = write_txn.open_table(CREATOR_RECORDS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn read_record(&self, id: &str) -> Result<Option<FileRecord>, MetadataStoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS)?;

        match table.get(id)? {
            Some(data) => {
                let record: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn query_by_name(&self, name: &str) -> Result<Vec<FileRecord>, MetadataStoreError> {
        let read_txn = self.db.begin_read()?;
        let name_table = read_txn.open_table(RECORD_NAMES)?;

        let id = match name_table.get(name)? {
            Some(data) => data.value().to_string(),
            None => return Ok(Vec::new()),
        };

        let records_table = read_txn.open_table(RECORDS)?;
        match records_table.get(id.as_str())? {
            Some(data) => {
                let record: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(vec![record])
            }
            None => Ok(Vec::new()),
        }
    }

    fn query_by_creator(&self, created_by: &str) -> Result<Vec<FileRecord>, MetadataStoreError> {
        let read_txn = self.db.begin_read()?;
        let creator_table = read_txn.open_table(CREATOR_RECORDS)?;
        let records_table = read_txn.open_table(RECORDS)?;

        let record_ids: Vec<String> = match creator_table.get(created_by)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut records = Vec::new();
        for record_id in record_ids {
            if let Some(data) = records_table.get(record_id.as_str())? {
                let record: FileRecord = rmp_serde::from_slice(data.value())?;
                records.push(record);
            }
        }

        // Newest first
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[async_trait]
impl MetadataStore for RedbMetadataStore {
    async fn get(&self, id: &str) -> Result<Option<FileRecord>, MetadataStoreError> {
        self.read_record(id)
    }

    /// Store a record and update the name and creator indexes.
    async fn put(&self, record: &FileRecord) -> Result<(), MetadataStoreError> {
        debug_assert!(!record.id.is_empty(), "record id must not be empty");
        debug_assert!(!record.name.is_empty(), "record name must not be empty");

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS)?;
            let data = rmp_serde::to_vec_named(record)?;
            table.insert(record.id.as_str(), data.as_slice())?;

            let mut name_table = write_txn.open_table(RECORD_NAMES)?;
            name_table.insert(record.name.as_str(), record.id.as_str())?;

            // Maintain creator index
            let mut creator_table = write_txn.open_table(CREATOR_RECORDS)?;
            let mut record_ids: Vec<String> = creator_table
                .get(record.created_by.as_str())?
                .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                .unwrap_or_default();

            if !record_ids.contains(&record.id) {
                record_ids.push(record.id.clone());
                let index_data = rmp_serde::to_vec_named(&record_ids)?;
                creator_table.insert(record.created_by.as_str(), index_data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Delete a record by id and clean up the name and creator indexes.
    async fn delete(&self, id: &str) -> Result<bool, MetadataStoreError> {
        let write_txn = self.db.begin_write()?;

        // Get the record for index cleanup
        let record_info: Option<(String, String)> = {
            let table = write_txn.open_table(RECORDS)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let record: FileRecord = rmp_serde::from_slice(data.value())?;
                    Some((record.name, record.created_by))
                }
                None => None,
            };
            result
        };

        let deleted = match record_info {
            Some((name, created_by)) => {
                {
                    let mut table = write_txn.open_table(RECORDS)?;
                    table.remove(id)?;
                }
                {
                    let mut name_table = write_txn.open_table(RECORD_NAMES)?;
                    name_table.remove(name.as_str())?;
                }
                // Remove from creator index
                let record_ids: Option<Vec<String>> = {
                    let creator_table = write_txn.open_table(CREATOR_RECORDS)?;
                    let result = creator_table.get(created_by.as_str())?;
                    match result {
                        Some(data) => Some(rmp_serde::from_slice(data.value())?),
                        None => None,
                    }
                };

                if let Some(mut ids) = record_ids {
                    ids.retain(|rid| rid != id);
                    let mut creator_table = write_txn.open_table(CREATOR_RECORDS)?;
                    if ids.is_empty() {
                        creator_table.remove(created_by.as_str())?;
                    } else {
                        let new_data = rmp_serde::to_vec_named(&ids)?;
                        creator_table.insert(created_by.as_str(), new_data.as_slice())?;
                    }
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<FileRecord>, MetadataStoreError> {
        match query {
            RecordQuery::NameEq(name) => self.query_by_name(name),
            RecordQuery::CreatedByEq(created_by) => self.query_by_creator(created_by),
        }
    }

    async fn list(&self) -> Result<Vec<FileRecord>, MetadataStoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS)?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let record: FileRecord = rmp_serde::from_slice(value.value())?;
            records.push(record);
        }

        Ok(records)
    }

    async fn purge(&self) -> Result<u64, MetadataStoreError> {
        let write_txn = self.db.begin_write()?;
        let mut purged = 0u64;

        {
            let table = write_txn.open_table(RECORDS)?;
            let keys: Vec<String> = table
                .iter()?
                .map(|r| r.map(|(k, _)| k.value().to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            drop(table);

            let mut table = write_txn.open_table(RECORDS)?;
            for key in keys {
                table.remove(key.as_str())?;
                purged += 1;
            }
        }

        {
            let table = write_txn.open_table(RECORD_NAMES)?;
            let keys: Vec<String> = table
                .iter()?
                .map(|r| r.map(|(k, _)| k.value().to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            drop(table);

            let mut table = write_txn.open_table(RECORD_NAMES)?;
            for key in keys {
                table.remove(key.as_str())?;
            }
        }

        {
            let table = write_txn.open_table(CREATOR_RECORDS)?;
            let keys: Vec<String> = table
                .iter()?
                .map(|r| r.map(|(k, _)| k.value().to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            drop(table);

            let mut table = write_txn.open_table(CREATOR_RECORDS)?;
            for key in keys {
                table.remove(key.as_str())?;
            }
        }

        write_txn.commit()?;
        Ok(purged)
    }
}
