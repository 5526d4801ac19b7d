//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token validation (and generation, used by the
//!   external identity service and by tests).

pub mod jwt;
