mod admin;
mod files;
mod flat;

use crate::api::response::ApiError;
use crate::blob_store::BlobStoreError;
use crate::registry::RegistryError;

pub use admin::{admin_purge, health};
pub use files::{
    batch_upload, create_file, delete_file, get_file, get_file_by_name, get_files_by_creator,
    list_files,
};
pub use flat::{flat_add_file, flat_delete_file, flat_get_file, flat_list_files};

/// Map a RegistryError to an ApiError
fn registry_error(e: RegistryError) -> ApiError {
    match e {
        RegistryError::NotFound(id) => ApiError::not_found(format!("File not found: {id}")),
        RegistryError::Blob(BlobStoreError::InvalidKey(key)) => {
            ApiError::bad_request(format!("Invalid file name: {key}"))
        }
        _ => ApiError::internal(e.to_string()),
    }
}
