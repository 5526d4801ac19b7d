use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and the config sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: xesviz_db::DbPool,
    /// Server configuration (upload ceiling, JWT secret).
    pub config: Arc<ServerConfig>,
}
