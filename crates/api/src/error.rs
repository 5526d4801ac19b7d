use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use xesviz_core::error::{CoreError, SizeViolation};
use xesviz_db::PersistenceError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `xesviz_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A failed ingest transaction. Nothing was stored.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::MalformedLog(msg) => {
                    (StatusCode::BAD_REQUEST, "MALFORMED_LOG", msg.clone())
                }
                CoreError::EmptyOrOversizedInput(violation) => {
                    let status = match violation {
                        SizeViolation::Empty => StatusCode::BAD_REQUEST,
                        SizeViolation::Oversized { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                    };
                    (status, "EMPTY_OR_OVERSIZED_INPUT", violation.to_string())
                }
                CoreError::ForbiddenOrNotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal_error()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Persistence(err) => {
                tracing::error!(stage = %err.stage, error = %err.source, "Ingest rolled back");
                internal_error()
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal_error()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// The sanitized 500 triple; details only go to the log.
fn internal_error() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal_error()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use xesviz_db::IngestStage;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn malformed_log_is_bad_request() {
        let err = AppError::Core(CoreError::MalformedLog("unexpected EOF".into()));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_and_oversized_uploads_differ_in_status() {
        let empty = AppError::Core(CoreError::EmptyOrOversizedInput(SizeViolation::Empty));
        let big = AppError::Core(CoreError::EmptyOrOversizedInput(
            SizeViolation::Oversized { max_bytes: 10 },
        ));
        assert_eq!(status_of(empty), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(big), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn forbidden_or_not_found_is_404() {
        let err = AppError::Core(CoreError::ForbiddenOrNotFound {
            entity: "File",
            id: 3,
        });
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn persistence_error_is_sanitized_500() {
        let err = AppError::Persistence(PersistenceError {
            stage: IngestStage::InsertEvent,
            source: sqlx::Error::PoolTimedOut,
        });
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
