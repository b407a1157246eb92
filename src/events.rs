//! Lifecycle event payloads published to the configured topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::FileRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Created,
    Retrieved,
    Deleted,
    NotFound,
}

/// A notification about a file lifecycle transition. Serialized as JSON on
/// the wire so external subscribers can consume it without this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEvent {
    pub action: EventAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl FileEvent {
    fn new(action: EventAction, message: String) -> Self {
        Self {
            action,
            file_id: None,
            name: None,
            message,
            occurred_at: Utc::now(),
        }
    }

    pub fn created(record: &FileRecord) -> Self {
        let mut event = Self::new(
            EventAction::Created,
            format!("Added file {}", record.id),
        );
        event.file_id = Some(record.id.clone());
        event.name = Some(record.name.clone());
        event
    }

    /// Created event for flows that track no metadata record.
    pub fn added(file_id: &str) -> Self {
        let mut event = Self::new(EventAction::Created, format!("Added file {file_id}"));
        event.file_id = Some(file_id.to_string());
        event
    }

    pub fn retrieved(record: &FileRecord) -> Self {
        let mut event = Self::new(
            EventAction::Retrieved,
            format!("Retrieved {}", record.id),
        );
        event.file_id = Some(record.id.clone());
        event.name = Some(record.name.clone());
        event
    }

    /// Retrieved event for flows that track no metadata record.
    pub fn retrieved_id(file_id: &str) -> Self {
        let mut event = Self::new(EventAction::Retrieved, format!("Retrieved {file_id}"));
        event.file_id = Some(file_id.to_string());
        event
    }

    pub fn list_retrieved(count: usize) -> Self {
        Self::new(
            EventAction::Retrieved,
            format!("Retrieved file list with {count} items"),
        )
    }

    pub fn deleted(file_id: &str) -> Self {
        let mut event = Self::new(EventAction::Deleted, format!("Deleted file {file_id}"));
        event.file_id = Some(file_id.to_string());
        event
    }

    pub fn not_found(file_id: &str) -> Self {
        let mut event = Self::new(
            EventAction::NotFound,
            format!("Could not locate file with id: {file_id}"),
        );
        event.file_id = Some(file_id.to_string());
        event
    }
}
