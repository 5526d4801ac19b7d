//! User activity constants.
//!
//! The `user_activity` table is an append-only audit trail. Action names are
//! plain strings so that new actions never need a schema change.

/// Known action types for user activity entries.
pub mod actions {
    pub const FILE_UPLOAD: &str = "file_upload";
    pub const FILE_RENAME: &str = "file_rename";
    pub const FILE_SHARE: &str = "file_share";
    pub const FILE_UNLINK: &str = "file_unlink";
    pub const FILE_DELETE: &str = "file_delete";
}
