//! Handlers for the `/files` resource.
//!
//! Uploads are parsed off the async runtime and stored in one ingest
//! transaction. Every other operation first passes the ownership gate;
//! missing and not-owned files both answer 404.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use xesviz_core::error::{CoreError, SizeViolation};
use xesviz_core::process_tree::ProcessTreeView;
use xesviz_core::types::DbId;
use xesviz_core::upload::{validate_filename, validate_upload_size};
use xesviz_core::xes::parse_xes_bytes;
use xesviz_db::models::file::{File, OwnedFile, UnlinkOutcome};
use xesviz_db::models::upload::{IngestSummary, NewUpload};
use xesviz_db::repositories::{FileRepo, IngestRepo, ProcessTreeRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Filename used when the multipart part carries none.
const FALLBACK_FILENAME: &str = "upload.xes";

/// Request body for renaming a file.
#[derive(Debug, Deserialize)]
pub struct RenameFileRequest {
    pub filename: String,
}

/// Request body for sharing a file with another user.
#[derive(Debug, Deserialize)]
pub struct ShareFileRequest {
    pub user_id: DbId,
}

/// Response body of a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    #[serde(flatten)]
    pub summary: IngestSummary,
}

/// POST /api/v1/files
///
/// Accepts a multipart form with a required `file` field holding an XES
/// document. The document is size-checked, parsed, and stored for the caller.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<UploadResponse>>)> {
    let max_bytes = state.config.max_upload_bytes;
    let mut file_data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some("file") {
            continue; // ignore unknown fields
        }
        let filename = field.file_name().unwrap_or(FALLBACK_FILENAME).to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;
        file_data = Some((filename, data.to_vec()));
    }

    let (filename, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    let filename = validate_filename(&filename)?.to_string();
    validate_upload_size(data.len(), max_bytes)?;

    let traces = tokio::task::spawn_blocking(move || parse_xes_bytes(&data))
        .await
        .map_err(|e| AppError::InternalError(format!("Parser task failed: {e}")))??;

    let summary = IngestRepo::ingest(
        &state.pool,
        &NewUpload {
            owner_id: auth.user_id,
            filename: &filename,
            traces: &traces,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UploadResponse { filename, summary },
        }),
    ))
}

/// GET /api/v1/files
///
/// List the caller's files, most recently uploaded first.
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<OwnedFile>>>> {
    let files = FileRepo::list_owned(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: files }))
}

/// GET /api/v1/files/{id}/tree
///
/// Rebuild the process tree of a file the caller owns, together with its
/// visualization payload.
pub async fn get_tree(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProcessTreeView>>> {
    let view = ProcessTreeRepo::load_owned(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?
        .into_view()?;
    tracing::debug!(
        file_id = id,
        processes = view.tree.processes.len(),
        events = view.tree.event_count(),
        "Process tree built",
    );
    Ok(Json(DataResponse { data: view }))
}

/// PATCH /api/v1/files/{id}
///
/// Rename a file the caller owns.
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<RenameFileRequest>,
) -> AppResult<Json<DataResponse<File>>> {
    let filename = validate_filename(&input.filename)?;
    let file = FileRepo::rename(&state.pool, auth.user_id, id, filename)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: file }))
}

/// DELETE /api/v1/files/{id}
///
/// Remove the caller's ownership. The file and everything derived from it is
/// deleted once no owner remains.
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    match FileRepo::unlink(&state.pool, auth.user_id, id).await? {
        UnlinkOutcome::NotLinked => Err(not_found(id)),
        UnlinkOutcome::Unlinked { .. } => Ok(StatusCode::NO_CONTENT),
    }
}

/// POST /api/v1/files/{id}/owners
///
/// Share a file the caller owns with another existing user.
pub async fn share_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ShareFileRequest>,
) -> AppResult<StatusCode> {
    ensure_owner(&state, auth.user_id, id).await?;

    if UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::ForbiddenOrNotFound {
            entity: "User",
            id: input.user_id,
        }));
    }

    if !FileRepo::add_owner(&state.pool, auth.user_id, id, input.user_id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ── Private helpers ──────────────────────────────────────────────────────

/// Reject callers without a link to `file_id`.
async fn ensure_owner(state: &AppState, user_id: DbId, file_id: DbId) -> AppResult<()> {
    if FileRepo::is_owner(&state.pool, user_id, file_id).await? {
        Ok(())
    } else {
        Err(not_found(file_id))
    }
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::ForbiddenOrNotFound { entity: "File", id })
}

/// Map a multipart read failure, surfacing the body limit as an oversized upload.
fn multipart_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Core(CoreError::EmptyOrOversizedInput(SizeViolation::Oversized {
            max_bytes,
        }))
    } else {
        AppError::BadRequest(err.body_text())
    }
}
