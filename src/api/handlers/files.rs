use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::registry_error;
use crate::api::response::{ApiError, AppQuery, JSend, JSendPaginated, Pagination};
use crate::record::FileRecord;
use crate::registry::ANONYMOUS_CREATOR;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: String,
}

/// Aggregate result of a batch upload. `count` and `size` cover every
/// submitted file, including zero-length entries that were skipped.
#[derive(Debug, Serialize)]
pub struct BatchUploadResponse {
    pub count: usize,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    20
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JSend<UploadResponse>>), ApiError> {
    let upload = read_upload(multipart, state.config.max_upload_size).await?;

    let (name, content) = upload
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::bad_request("file field is required"))?;

    let id = state
        .registry
        .add_file(&name, &upload.created_by, content)
        .await
        .map_err(registry_error)?;

    tracing::debug!(file_id = %id, name = %name, "Uploaded file");
    Ok((StatusCode::CREATED, JSend::success(UploadResponse { id })))
}

pub async fn batch_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<JSend<BatchUploadResponse>>, ApiError> {
    let upload = read_upload(multipart, state.config.max_upload_size).await?;

    if upload.files.is_empty() {
        return Err(ApiError::bad_request("batch must contain at least one file"));
    }

    let count = upload.files.len();
    let size: u64 = upload.files.iter().map(|(_, data)| data.len() as u64).sum();

    for (name, content) in upload.files {
        // Zero-length entries count towards the totals but create no record
        if content.is_empty() {
            tracing::debug!(name = %name, "Skipping empty file in batch");
            continue;
        }
        let id = state
            .registry
            .add_file(&name, &upload.created_by, content)
            .await
            .map_err(registry_error)?;
        tracing::debug!(file_id = %id, name = %name, "Uploaded batch file");
    }

    Ok(JSend::success(BatchUploadResponse { count, size }))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let record = state.registry.get_file(&id).await.map_err(registry_error)?;
    Ok(JSend::success(file_to_response(&record)))
}

pub async fn get_file_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<JSend<Option<FileResponse>>>, ApiError> {
    let record = state
        .registry
        .get_file_by_name(&name)
        .await
        .map_err(registry_error)?;

    // A miss is a success with null data, not an error
    Ok(JSend::success(record.as_ref().map(file_to_response)))
}

pub async fn get_files_by_creator(
    State(state): State<Arc<AppState>>,
    Path(created_by): Path<String>,
) -> Result<Json<JSend<Vec<FileResponse>>>, ApiError> {
    let records = state
        .registry
        .get_files_by_creator(&created_by)
        .await
        .map_err(registry_error)?;

    Ok(JSend::success(
        records.iter().map(file_to_response).collect(),
    ))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSendPaginated<FileResponse>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let records = state.registry.list_files().await.map_err(registry_error)?;

    let total = records.len() as u64;
    let items: Vec<FileResponse> = records
        .iter()
        .skip(params.offset as usize)
        .take(params.limit as usize)
        .map(file_to_response)
        .collect();

    Ok(JSendPaginated::success(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
            total,
        },
    ))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    let deleted = state
        .registry
        .delete_file(&id)
        .await
        .map_err(registry_error)?;

    if !deleted {
        return Err(ApiError::not_found("File not found"));
    }

    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

struct Upload {
    /// (name, content) per submitted file part, in submission order.
    files: Vec<(String, Bytes)>,
    created_by: String,
}

/// Drain a multipart request: any number of `file` parts plus an optional
/// `created_by` text part. Unknown fields are ignored.
async fn read_upload(mut multipart: Multipart, max_upload_size: u64) -> Result<Upload, ApiError> {
    let mut files = Vec::new();
    let mut created_by: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::bad_request("file part must have a filename"))?;

                // The name becomes the blob key; keep it a single path component
                if name.is_empty()
                    || name == "."
                    || name == ".."
                    || name.contains('/')
                    || name.contains('\\')
                {
                    return Err(ApiError::bad_request(format!("Invalid file name: {name}")));
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                if data.len() as u64 > max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File exceeds maximum upload size of {max_upload_size} bytes"
                    )));
                }

                files.push((name, data));
            }
            "created_by" => {
                created_by = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid created_by: {e}")))?,
                );
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let created_by = created_by
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| ANONYMOUS_CREATOR.to_string());

    Ok(Upload { files, created_by })
}

fn file_to_response(record: &FileRecord) -> FileResponse {
    FileResponse {
        id: record.id.clone(),
        name: record.name.clone(),
        created_by: record.created_by.clone(),
        created_at: record.created_at.to_rfc3339(),
    }
}
