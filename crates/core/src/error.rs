use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The uploaded document is not well-formed XML.
    #[error("Malformed event log: {0}")]
    MalformedLog(String),

    /// Upload rejected at the boundary, before any parsing happened.
    #[error("Empty or oversized input: {0}")]
    EmptyOrOversizedInput(SizeViolation),

    /// The entity does not exist or the caller does not own it.
    ///
    /// The two cases share one variant so that non-owners cannot discover
    /// which files other users have.
    #[error("Entity not found: {entity} with id {id}")]
    ForbiddenOrNotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why an upload was rejected by the size check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SizeViolation {
    #[error("uploaded file is empty")]
    Empty,
    #[error("uploaded file exceeds the limit of {max_bytes} bytes")]
    Oversized { max_bytes: usize },
}
