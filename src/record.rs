use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file metadata record. Content is not stored here -- the raw bytes live
/// in the blob store keyed by `name`.
///
/// Records are created and deleted, never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// Build a new record with a freshly generated id and the current time.
    pub fn new(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            created_by: created_by.into(),
            created_at: Utc::now(),
        }
    }
}

/// Exact-match filter over the queryable record fields.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordQuery {
    NameEq(String),
    CreatedByEq(String),
}
