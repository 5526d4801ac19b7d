//! Repository for uploaded files and their `user_files` ownership links.
//!
//! Every read or mutation of a file is gated on the caller's link. A missing
//! link and a missing file are indistinguishable to callers.

use sqlx::PgPool;
use xesviz_core::activity::actions;
use xesviz_core::types::DbId;

use crate::models::activity::CreateUserActivity;
use crate::models::file::{File, OwnedFile, UnlinkOutcome};
use crate::repositories::UserActivityRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, filename, upload_date, created_at, updated_at";

/// Provides ownership-gated operations on files.
pub struct FileRepo;

impl FileRepo {
    /// Find a file by ID, regardless of ownership.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<File>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM files WHERE id = $1");
        sqlx::query_as::<_, File>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether `user_id` holds an ownership link to `file_id`.
    pub async fn is_owner(pool: &PgPool, user_id: DbId, file_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_files WHERE user_id = $1 AND file_id = $2)",
        )
        .bind(user_id)
        .bind(file_id)
        .fetch_one(pool)
        .await
    }

    /// List the files `user_id` owns, most recently uploaded first.
    pub async fn list_owned(pool: &PgPool, user_id: DbId) -> Result<Vec<OwnedFile>, sqlx::Error> {
        sqlx::query_as::<_, OwnedFile>(
            "SELECT f.id, f.filename, f.upload_date
             FROM files f
             JOIN user_files uf ON uf.file_id = f.id
             WHERE uf.user_id = $1
             ORDER BY f.upload_date DESC, f.id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Number of users linked to `file_id`.
    pub async fn owner_count(pool: &PgPool, file_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_files WHERE file_id = $1")
            .bind(file_id)
            .fetch_one(pool)
            .await
    }

    /// Rename a file the caller owns.
    ///
    /// Returns `None` when the file does not exist or the caller holds no link.
    pub async fn rename(
        pool: &PgPool,
        user_id: DbId,
        file_id: DbId,
        new_name: &str,
    ) -> Result<Option<File>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE files SET filename = $3
             WHERE id = $2
               AND EXISTS(SELECT 1 FROM user_files WHERE user_id = $1 AND file_id = $2)
             RETURNING {COLUMNS}"
        );
        let file = sqlx::query_as::<_, File>(&query)
            .bind(user_id)
            .bind(file_id)
            .bind(new_name)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(file) = file else {
            tx.rollback().await?;
            return Ok(None);
        };

        UserActivityRepo::record(
            &mut *tx,
            &CreateUserActivity {
                user_id,
                action: actions::FILE_RENAME.to_string(),
                file_id: Some(file_id),
                details: Some(new_name.to_string()),
            },
        )
        .await?;

        tx.commit().await?;
        tracing::info!(file_id, user_id, "File renamed");
        Ok(Some(file))
    }

    /// Grant `new_owner_id` a link to a file `owner_id` already owns.
    ///
    /// Idempotent: sharing with an existing owner succeeds without change.
    /// Returns `false` when `owner_id` holds no link to the file.
    pub async fn add_owner(
        pool: &PgPool,
        owner_id: DbId,
        file_id: DbId,
        new_owner_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owns: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_files WHERE user_id = $1 AND file_id = $2)",
        )
        .bind(owner_id)
        .bind(file_id)
        .fetch_one(&mut *tx)
        .await?;

        if !owns {
            tx.rollback().await?;
            return Ok(false);
        }

        let inserted = sqlx::query(
            "INSERT INTO user_files (user_id, file_id) VALUES ($1, $2)
             ON CONFLICT (user_id, file_id) DO NOTHING",
        )
        .bind(new_owner_id)
        .bind(file_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted > 0 {
            UserActivityRepo::record(
                &mut *tx,
                &CreateUserActivity {
                    user_id: owner_id,
                    action: actions::FILE_SHARE.to_string(),
                    file_id: Some(file_id),
                    details: Some(format!("shared with user {new_owner_id}")),
                },
            )
            .await?;
        }

        tx.commit().await?;
        tracing::info!(file_id, owner_id, new_owner_id, "File shared");
        Ok(true)
    }

    /// Remove the caller's link to a file.
    ///
    /// When it was the last link the file row is deleted too, and its
    /// processes, events and attributes cascade with it. The file row is
    /// locked first so two owners unlinking at once cannot both leave it
    /// behind.
    pub async fn unlink(
        pool: &PgPool,
        user_id: DbId,
        file_id: DbId,
    ) -> Result<UnlinkOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let filename: Option<String> =
            sqlx::query_scalar("SELECT filename FROM files WHERE id = $1 FOR UPDATE")
                .bind(file_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(filename) = filename else {
            tx.rollback().await?;
            return Ok(UnlinkOutcome::NotLinked);
        };

        let removed = sqlx::query("DELETE FROM user_files WHERE user_id = $1 AND file_id = $2")
            .bind(user_id)
            .bind(file_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            tx.rollback().await?;
            return Ok(UnlinkOutcome::NotLinked);
        }

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_files WHERE file_id = $1")
            .bind(file_id)
            .fetch_one(&mut *tx)
            .await?;
        let file_deleted = remaining == 0;

        // Recorded before the delete; the FK is cleared by ON DELETE SET NULL.
        let action = if file_deleted {
            actions::FILE_DELETE
        } else {
            actions::FILE_UNLINK
        };
        UserActivityRepo::record(
            &mut *tx,
            &CreateUserActivity {
                user_id,
                action: action.to_string(),
                file_id: Some(file_id),
                details: Some(filename),
            },
        )
        .await?;

        if file_deleted {
            sqlx::query("DELETE FROM files WHERE id = $1")
                .bind(file_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(file_id, user_id, file_deleted, "File unlinked");
        Ok(UnlinkOutcome::Unlinked { file_deleted })
    }
}
