mod redb;

pub use self::redb::RedbMetadataStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{FileRecord, RecordQuery};

#[derive(Debug, Error)]
pub enum MetadataStoreError {
    #[error("Commit error: {0}")]
    Commit(Box<::redb::CommitError>),
    #[error("Database error: {0}")]
    Database(Box<::redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<::redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<::redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<::redb::TransactionError>),
}

impl From<::redb::CommitError> for MetadataStoreError {
    fn from(e: ::redb::CommitError) -> Self {
        MetadataStoreError::Commit(Box::new(e))
    }
}

impl From<::redb::DatabaseError> for MetadataStoreError {
    fn from(e: ::redb::DatabaseError) -> Self {
        MetadataStoreError::Database(Box::new(e))
    }
}

impl From<::redb::StorageError> for MetadataStoreError {
    fn from(e: ::redb::StorageError) -> Self {
        MetadataStoreError::Storage(Box::new(e))
    }
}

impl From<::redb::TableError> for MetadataStoreError {
    fn from(e: ::redb::TableError) -> Self {
        MetadataStoreError::Table(Box::new(e))
    }
}

impl From<::redb::TransactionError> for MetadataStoreError {
    fn from(e: ::redb::TransactionError) -> Self {
        MetadataStoreError::Transaction(Box::new(e))
    }
}

/// Abstraction over the key-value store holding file metadata.
///
/// Records are keyed by id; `query` supports exact-match lookups over the
/// secondary fields.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<FileRecord>, MetadataStoreError>;
    async fn put(&self, record: &FileRecord) -> Result<(), MetadataStoreError>;
    /// Returns whether a record existed under `id`.
    async fn delete(&self, id: &str) -> Result<bool, MetadataStoreError>;
    /// Exact-match query. `CreatedByEq` results are ordered by `created_at`
    /// descending.
    async fn query(&self, query: &RecordQuery) -> Result<Vec<FileRecord>, MetadataStoreError>;
    async fn list(&self) -> Result<Vec<FileRecord>, MetadataStoreError>;
    /// Remove every record. For testing only; returns the number removed.
    async fn purge(&self) -> Result<u64, MetadataStoreError>;
}
