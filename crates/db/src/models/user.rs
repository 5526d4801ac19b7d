//! User entity model and DTOs.
//!
//! Users are created by the external authentication service; this crate only
//! needs them as owners of files and subjects of activity entries.

use serde::Deserialize;
use sqlx::FromRow;
use xesviz_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub login: String,
    pub password_hash: String,
    pub registration_date: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user. The hash is produced by the auth service.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub login: String,
    pub password_hash: String,
}
