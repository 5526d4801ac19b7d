use std::fmt;

/// The step of an ingest transaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Begin,
    InsertFile,
    LinkOwner,
    InsertProcess,
    InsertEvent,
    InsertAttributes,
    RecordActivity,
    Commit,
}

impl IngestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "beginning the transaction",
            Self::InsertFile => "inserting the file",
            Self::LinkOwner => "linking the owner",
            Self::InsertProcess => "inserting a process",
            Self::InsertEvent => "inserting an event",
            Self::InsertAttributes => "inserting event attributes",
            Self::RecordActivity => "recording user activity",
            Self::Commit => "committing",
        }
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A storage failure during ingest. The whole transaction has been rolled back.
#[derive(Debug, thiserror::Error)]
#[error("Failed to persist event log while {stage}: {source}")]
pub struct PersistenceError {
    pub stage: IngestStage,
    #[source]
    pub source: sqlx::Error,
}

impl PersistenceError {
    /// Build a `map_err` adapter tagging a sqlx error with the failing stage.
    pub fn at(stage: IngestStage) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self { stage, source }
    }
}
