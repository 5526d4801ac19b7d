pub mod activity;
pub mod files;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /files                      list, upload (multipart)
/// /files/{id}                 rename (PATCH), unlink (DELETE)
/// /files/{id}/tree            process tree + visualization
/// /files/{id}/owners          share with another user (POST)
///
/// /activity                   caller's recent activity
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/files", files::router(max_upload_bytes))
        .nest("/activity", activity::router())
}
