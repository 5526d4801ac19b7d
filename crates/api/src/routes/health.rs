//! Readiness of the ingestion service, served at the root (not under `/api/v1`).

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Health check response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Newest applied migration. `None` when the database is unreachable or
    /// has not been migrated, in which case uploads cannot be stored.
    pub schema_version: Option<i64>,
    /// Largest XES document accepted by `POST /api/v1/files`.
    pub max_upload_bytes: usize,
}

/// GET /health
///
/// 200 when the database is reachable and migrated, 503 otherwise.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db_healthy = xesviz_db::health_check(&state.pool).await.is_ok();
    let schema_version = if db_healthy {
        xesviz_db::schema_version(&state.pool).await.ok().flatten()
    } else {
        None
    };

    let (code, status) = match schema_version {
        Some(_) => (StatusCode::OK, HealthStatus::Ok),
        None => {
            tracing::warn!(db_healthy, "Health check degraded");
            (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Degraded)
        }
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        schema_version,
        max_upload_bytes: state.config.max_upload_bytes,
    };
    (code, Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
