//! Handlers for the `/activity` resource.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use xesviz_db::models::activity::UserActivity;
use xesviz_db::repositories::UserActivityRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the activity listing.
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    /// Page size, clamped to 1..=500 (default 50).
    pub limit: Option<i64>,
}

/// GET /api/v1/activity
///
/// The caller's most recent activity entries, newest first.
pub async fn list_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ActivityQuery>,
) -> AppResult<Json<DataResponse<Vec<UserActivity>>>> {
    let entries = UserActivityRepo::list_for_user(&state.pool, auth.user_id, params.limit).await?;
    Ok(Json(DataResponse { data: entries }))
}
