//! The flat route set: the file lifecycle exposed directly over the blob
//! store and publisher, without metadata tracking. A simplified deployment
//! topology selected with `API_FLAVOR=flat`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery, JSend};
use crate::blob_store::BlobStoreError;
use crate::events::FileEvent;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FlatFileResponse {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct FlatDeleteResponse {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct FlatDeleteParams {
    /// Overrides the configured key mode: local file names vs remote blob names.
    #[serde(default)]
    pub is_local: Option<bool>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn flat_list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<String>>>, ApiError> {
    let keys = state
        .blob_store
        .list()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    publish(&state, FileEvent::list_retrieved(keys.len())).await;
    Ok(JSend::success(keys))
}

pub async fn flat_get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<FlatFileResponse>>, ApiError> {
    match state.blob_store.get(&id).await {
        Ok(data) => {
            publish(&state, FileEvent::retrieved_id(&id)).await;
            Ok(JSend::success(FlatFileResponse {
                content: String::from_utf8_lossy(&data).to_string(),
                id,
            }))
        }
        Err(BlobStoreError::NotFound(_)) => {
            publish(&state, FileEvent::not_found(&id)).await;
            Err(ApiError::not_found(format!(
                "Could not locate file with id: {id}"
            )))
        }
        Err(e) => Err(blob_error(e)),
    }
}

pub async fn flat_add_file(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<JSend<FlatFileResponse>>), ApiError> {
    let id = uuid::Uuid::new_v4().to_string();

    state
        .blob_store
        .create(&id, body.clone())
        .await
        .map_err(blob_error)?;

    publish(&state, FileEvent::added(&id)).await;

    Ok((
        StatusCode::CREATED,
        JSend::success(FlatFileResponse {
            content: String::from_utf8_lossy(&body).to_string(),
            id,
        }),
    ))
}

pub async fn flat_delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppQuery(params): AppQuery<FlatDeleteParams>,
) -> Result<Json<JSend<FlatDeleteResponse>>, ApiError> {
    // Local deployments key blobs by file name; remote ones by blob name.
    let is_local = params.is_local.unwrap_or(state.config.flat_local_names);
    let key_field = if is_local { "fileName" } else { "blobName" };

    state.blob_store.delete(&id).await.map_err(blob_error)?;

    tracing::debug!(file_id = %id, key_field, "Deleted blob");
    publish(&state, FileEvent::deleted(&id)).await;

    Ok(JSend::success(FlatDeleteResponse {
        message: format!("File {id} is deleted"),
        id,
    }))
}

fn blob_error(e: BlobStoreError) -> ApiError {
    match e {
        BlobStoreError::InvalidKey(key) => ApiError::bad_request(format!("Invalid blob key: {key}")),
        _ => ApiError::internal(e.to_string()),
    }
}

/// Fire-and-forget publish. Failures are logged, never surfaced.
async fn publish(state: &AppState, event: FileEvent) {
    let topic = &state.config.publisher.topic;
    if let Err(e) = state.publisher.publish(topic, &event).await {
        tracing::warn!(%topic, error = %e, "failed to publish file event");
    }
}
