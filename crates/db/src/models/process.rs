//! Process entity: one trace of an uploaded log.

use serde::Serialize;
use sqlx::FromRow;
use xesviz_core::types::{DbId, Timestamp};

/// A row from the `processes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Process {
    pub id: DbId,
    pub file_id: DbId,
    pub name: String,
    pub creation_date: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
