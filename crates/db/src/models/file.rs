//! Uploaded file entity and ownership DTOs.

use serde::Serialize;
use sqlx::FromRow;
use xesviz_core::types::{DbId, Timestamp};

/// A row from the `files` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct File {
    pub id: DbId,
    pub filename: String,
    pub upload_date: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A file as listed for one of its owners.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OwnedFile {
    pub id: DbId,
    pub filename: String,
    pub upload_date: Timestamp,
}

/// Result of removing a caller's ownership link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnlinkOutcome {
    /// The caller was not linked to the file, or the file does not exist.
    NotLinked,
    /// The link was removed. `file_deleted` is true when it was the last one
    /// and the file was deleted together with its processes.
    Unlinked { file_deleted: bool },
}
