//! Input and output of the ingest transaction.

use serde::Serialize;
use xesviz_core::types::DbId;
use xesviz_core::xes::Trace;

/// A parsed log ready to be stored for its uploader.
#[derive(Debug)]
pub struct NewUpload<'a> {
    pub owner_id: DbId,
    pub filename: &'a str,
    pub traces: &'a [Trace],
}

/// Row counts written by one ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub file_id: DbId,
    pub process_count: u64,
    pub event_count: u64,
    pub attribute_count: u64,
}
