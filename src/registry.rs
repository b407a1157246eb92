//! The file registry: orchestrates the blob store, metadata store, and
//! publisher to implement the file lifecycle.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::blob_store::{BlobStore, BlobStoreError};
use crate::events::FileEvent;
use crate::metadata_store::{MetadataStore, MetadataStoreError};
use crate::publisher::Publisher;
use crate::record::{FileRecord, RecordQuery};

/// Creator recorded when the caller does not identify themselves.
pub const ANONYMOUS_CREATOR: &str = "Anonymous";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Blob(#[from] BlobStoreError),
    #[error(transparent)]
    Metadata(#[from] MetadataStoreError),
}

/// Stateless orchestrator over the three injected backends. Cheap to clone;
/// all clones share the same backends.
#[derive(Clone)]
pub struct FileRegistry {
    blob_store: Arc<dyn BlobStore>,
    metadata_store: Arc<dyn MetadataStore>,
    publisher: Arc<dyn Publisher>,
    topic: String,
}

impl FileRegistry {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        metadata_store: Arc<dyn MetadataStore>,
        publisher: Arc<dyn Publisher>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            blob_store,
            metadata_store,
            publisher,
            topic: topic.into(),
        }
    }

    /// Register a file: write its content to the blob store (keyed by name)
    /// and its metadata to the metadata store (keyed by a new uuid).
    ///
    /// Idempotent by name: when a record with `name` already exists, the
    /// existing id is returned and nothing is written -- content is neither
    /// compared nor merged. The two writes are not atomic; a crash between
    /// them leaves an orphan blob with no metadata pointing at it.
    pub async fn add_file(
        &self,
        name: &str,
        created_by: &str,
        content: Bytes,
    ) -> Result<String, RegistryError> {
        let existing = self
            .metadata_store
            .query(&RecordQuery::NameEq(name.to_string()))
            .await?;
        if let Some(record) = existing.into_iter().next() {
            tracing::info!(name, file_id = %record.id, "file already registered");
            return Ok(record.id);
        }

        self.blob_store.create(name, content).await?;
        tracing::info!(name, "wrote file content to blob store");

        let record = FileRecord::new(name, created_by);
        self.metadata_store.put(&record).await?;
        tracing::info!(file_id = %record.id, name, created_by, "registered new file");

        self.publish(FileEvent::created(&record)).await;
        Ok(record.id)
    }

    /// Direct lookup by id. Fails with `NotFound` when absent.
    pub async fn get_file(&self, id: &str) -> Result<FileRecord, RegistryError> {
        match self.metadata_store.get(id).await? {
            Some(record) => {
                self.publish(FileEvent::retrieved(&record)).await;
                Ok(record)
            }
            None => {
                self.publish(FileEvent::not_found(id)).await;
                Err(RegistryError::NotFound(id.to_string()))
            }
        }
    }

    /// Exact-match lookup by name. A miss is `None`, not an error.
    pub async fn get_file_by_name(&self, name: &str) -> Result<Option<FileRecord>, RegistryError> {
        let records = self
            .metadata_store
            .query(&RecordQuery::NameEq(name.to_string()))
            .await?;
        Ok(records.into_iter().next())
    }

    /// All records created by `created_by`, newest first.
    pub async fn get_files_by_creator(
        &self,
        created_by: &str,
    ) -> Result<Vec<FileRecord>, RegistryError> {
        let records = self
            .metadata_store
            .query(&RecordQuery::CreatedByEq(created_by.to_string()))
            .await?;
        Ok(records)
    }

    /// Every known record.
    pub async fn list_files(&self) -> Result<Vec<FileRecord>, RegistryError> {
        let records = self.metadata_store.list().await?;
        self.publish(FileEvent::list_retrieved(records.len())).await;
        Ok(records)
    }

    /// Remove the metadata record for `id`. Returns false when no record
    /// existed. The blob is removed best-effort afterwards; a failure there
    /// is logged but does not undo the deletion.
    pub async fn delete_file(&self, id: &str) -> Result<bool, RegistryError> {
        let record = match self.metadata_store.get(id).await? {
            Some(record) => record,
            None => return Ok(false),
        };

        self.metadata_store.delete(id).await?;

        if let Err(e) = self.blob_store.delete(&record.name).await {
            tracing::warn!(file_id = %id, name = %record.name, error = %e, "failed to delete blob");
        }

        tracing::info!(file_id = %id, name = %record.name, "deleted file");
        self.publish(FileEvent::deleted(id)).await;
        Ok(true)
    }

    /// Fire-and-forget publish. Failures are logged, never surfaced.
    async fn publish(&self, event: FileEvent) {
        if let Err(e) = self.publisher.publish(&self.topic, &event).await {
            tracing::warn!(topic = %self.topic, error = %e, "failed to publish file event");
        }
    }
}
