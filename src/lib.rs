//! file-registry - A file-metadata management service
//!
//! This crate provides file upload, metadata tracking, and lifecycle eventing with:
//! - Swappable blob storage backends behind a `BlobStore` trait
//! - redb embedded key-value store for metadata (ACID, MVCC, crash-safe)
//! - Fire-and-forget lifecycle events (created/retrieved/deleted) to a topic
//! - REST API with multipart upload support, plus a flat blob-backed variant

pub mod api;
pub mod blob_store;
pub mod config;
pub mod events;
pub mod metadata_store;
pub mod publisher;
pub mod record;
pub mod registry;

use std::sync::Arc;

use config::Config;
use registry::FileRegistry;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub registry: FileRegistry,
    pub blob_store: Arc<dyn blob_store::BlobStore>,
    pub metadata_store: Arc<dyn metadata_store::MetadataStore>,
    pub publisher: Arc<dyn publisher::Publisher>,
}
