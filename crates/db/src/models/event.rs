//! Stored event entity.

use serde::Serialize;
use sqlx::FromRow;
use xesviz_core::process_tree::EventNode;
use xesviz_core::types::{DbId, Timestamp};

/// A row from the `events` table.
///
/// `timestamp` holds the Unix epoch when `has_timestamp` is false.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventRecord {
    pub id: DbId,
    pub process_id: DbId,
    pub event_name: String,
    pub timestamp: Timestamp,
    pub has_timestamp: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EventRecord {
    /// The timestamp from the source log, if it had one.
    pub fn source_timestamp(&self) -> Option<Timestamp> {
        self.has_timestamp.then_some(self.timestamp)
    }
}

impl From<EventRecord> for EventNode {
    fn from(record: EventRecord) -> Self {
        let timestamp = record.source_timestamp();
        EventNode {
            id: record.id,
            name: record.event_name,
            timestamp,
        }
    }
}
