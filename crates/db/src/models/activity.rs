//! User activity entity (append-only audit trail).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use xesviz_core::types::{DbId, Timestamp};

/// A single activity entry. Immutable once created (no updated_at).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserActivity {
    pub id: DbId,
    pub user_id: DbId,
    pub action: String,
    /// Cleared when the file is deleted.
    pub file_id: Option<DbId>,
    pub details: Option<String>,
    pub timestamp: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for appending an activity entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserActivity {
    pub user_id: DbId,
    pub action: String,
    pub file_id: Option<DbId>,
    pub details: Option<String>,
}
