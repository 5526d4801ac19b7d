//! Repository for the append-only `user_activity` table.

use sqlx::{PgPool, Postgres};
use xesviz_core::types::DbId;

use crate::models::activity::{CreateUserActivity, UserActivity};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, action, file_id, details, timestamp, created_at";

/// Default page size for activity listings.
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 50;

/// Provides insert and query operations for user activity.
pub struct UserActivityRepo;

impl UserActivityRepo {
    /// Append an activity entry.
    ///
    /// Accepts any executor so that writers can record activity inside their
    /// own transaction (`&mut *tx`) as well as directly on the pool.
    pub async fn record<'e, E>(
        executor: E,
        input: &CreateUserActivity,
    ) -> Result<UserActivity, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO user_activity (user_id, action, file_id, details)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserActivity>(&query)
            .bind(input.user_id)
            .bind(&input.action)
            .bind(input.file_id)
            .bind(&input.details)
            .fetch_one(executor)
            .await
    }

    /// List a user's most recent activity, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<UserActivity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_activity
             WHERE user_id = $1
             ORDER BY timestamp DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, UserActivity>(&query)
            .bind(user_id)
            .bind(limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).clamp(1, 500))
            .fetch_all(pool)
            .await
    }
}
