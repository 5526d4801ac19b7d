//! Event attribute entity.

use serde::Serialize;
use sqlx::FromRow;
use xesviz_core::types::{DbId, Timestamp};

/// A row from the `attributes` table. An event may have any number of these,
/// including several with the same name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attribute {
    pub id: DbId,
    pub event_id: DbId,
    pub attribute_name: String,
    pub attribute_value: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
