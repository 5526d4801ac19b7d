//! Domain logic for xesviz: XES parsing, process tree derivation and the
//! boundary checks around uploads. This crate performs no I/O.

pub mod activity;
pub mod error;
pub mod process_tree;
pub mod types;
pub mod upload;
pub mod xes;
