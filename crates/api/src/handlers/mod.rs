pub mod activity;
pub mod files;
