//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async operations that
//! accept `&PgPool` as the first argument. Multi-statement writes open their
//! own transaction.

pub mod activity_repo;
pub mod file_repo;
pub mod ingest_repo;
pub mod process_tree_repo;
pub mod user_repo;

pub use activity_repo::UserActivityRepo;
pub use file_repo::FileRepo;
pub use ingest_repo::IngestRepo;
pub use process_tree_repo::ProcessTreeRepo;
pub use user_repo::UserRepo;
