//! Route definitions for the `/files` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// Room for multipart boundaries and part headers around the file bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/files`.
///
/// ```text
/// GET    /                -> list_files
/// POST   /                -> upload (multipart, field `file`)
/// PATCH  /{id}            -> rename_file
/// DELETE /{id}            -> delete_file
/// GET    /{id}/tree       -> get_tree
/// POST   /{id}/owners     -> share_file
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(files::list_files).post(files::upload).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/{id}", patch(files::rename_file).delete(files::delete_file))
        .route("/{id}/tree", get(files::get_tree))
        .route("/{id}/owners", post(files::share_file))
}
