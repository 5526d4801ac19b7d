//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts where the entity is written directly

pub mod activity;
pub mod attribute;
pub mod event;
pub mod file;
pub mod process;
pub mod upload;
pub mod user;
