use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::config::ApiFlavor;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let router = match state.config.api_flavor {
        ApiFlavor::Rest => rest_router(&state),
        ApiFlavor::Flat => flat_router(&state),
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn rest_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    // The per-file limit is enforced per multipart part; the body limit only
    // needs to leave room for framing and text fields on top of it.
    let body_limit = state.config.max_upload_size as usize + 64 * 1024;

    let mut router = Router::new()
        // Files
        .route("/files", get(handlers::list_files))
        .route(
            "/files",
            post(handlers::create_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/files/batch",
            post(handlers::batch_upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files/:id", get(handlers::get_file))
        .route("/files/:id", delete(handlers::delete_file))
        // Distinct paths keep by-name and by-creator lookups from colliding
        // with by-id on the same template
        .route("/files/by-name/:name", get(handlers::get_file_by_name))
        .route(
            "/files/by-creator/:created_by",
            get(handlers::get_files_by_creator),
        )
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled — purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router
}

fn flat_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let upload_limit = state.config.max_upload_size as usize;

    Router::new()
        .route("/listfiles", get(handlers::flat_list_files))
        .route("/files/:id", get(handlers::flat_get_file))
        .route("/files/:id", delete(handlers::flat_delete_file))
        .route(
            "/addfile",
            post(handlers::flat_add_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/_internal/health", get(handlers::health))
}
