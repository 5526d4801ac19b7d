//! Tree reconstructor: reloads a stored file as a process/event hierarchy.

use sqlx::{PgPool, Postgres, Transaction};
use xesviz_core::process_tree::{ProcessNode, ProcessTree};
use xesviz_core::types::DbId;

use crate::models::attribute::Attribute;
use crate::models::event::EventRecord;
use crate::models::process::Process;

/// Column list for the `processes` table.
const PROCESS_COLUMNS: &str = "id, file_id, name, creation_date, created_at, updated_at";

/// Column list for the `attributes` table.
const ATTRIBUTE_COLUMNS: &str =
    "id, event_id, attribute_name, attribute_value, created_at, updated_at";

/// Column list for the `events` table.
const EVENT_COLUMNS: &str =
    "id, process_id, event_name, timestamp, has_timestamp, created_at, updated_at";

/// Read-only queries rebuilding the tree of one file.
pub struct ProcessTreeRepo;

impl ProcessTreeRepo {
    /// Load the typed tree of `file_id`.
    ///
    /// Processes are listed in id order; events within a process are ordered
    /// by timestamp ascending, ties broken by id. All reads run in one
    /// read-only repeatable-read transaction so a concurrent ingest is seen
    /// either completely or not at all.
    ///
    /// A missing file yields an empty tree rather than an error. Callers are
    /// expected to have passed the ownership check already.
    pub async fn load(pool: &PgPool, file_id: DbId) -> Result<ProcessTree, sqlx::Error> {
        let mut tx = Self::begin_snapshot(pool).await?;
        let tree = Self::load_in(&mut tx, file_id).await?;
        tx.commit().await?;
        Ok(tree)
    }

    /// Load the tree of `file_id` on behalf of `user_id`.
    ///
    /// The ownership check runs in the same snapshot as the reads. Returns
    /// `None` when the caller holds no link to the file, whether or not the
    /// file exists.
    pub async fn load_owned(
        pool: &PgPool,
        user_id: DbId,
        file_id: DbId,
    ) -> Result<Option<ProcessTree>, sqlx::Error> {
        let mut tx = Self::begin_snapshot(pool).await?;

        let owns: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_files WHERE user_id = $1 AND file_id = $2)",
        )
        .bind(user_id)
        .bind(file_id)
        .fetch_one(&mut *tx)
        .await?;
        if !owns {
            tx.rollback().await?;
            return Ok(None);
        }

        let tree = Self::load_in(&mut tx, file_id).await?;
        tx.commit().await?;
        Ok(Some(tree))
    }

    async fn begin_snapshot(pool: &PgPool) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn load_in(
        tx: &mut Transaction<'_, Postgres>,
        file_id: DbId,
    ) -> Result<ProcessTree, sqlx::Error> {
        let filename: Option<String> =
            sqlx::query_scalar("SELECT filename FROM files WHERE id = $1")
                .bind(file_id)
                .fetch_optional(&mut **tx)
                .await?;

        let Some(filename) = filename else {
            return Ok(ProcessTree::empty(file_id));
        };

        let process_query =
            format!("SELECT {PROCESS_COLUMNS} FROM processes WHERE file_id = $1 ORDER BY id");
        let processes = sqlx::query_as::<_, Process>(&process_query)
            .bind(file_id)
            .fetch_all(&mut **tx)
            .await?;

        let event_query = format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE process_id = $1
             ORDER BY has_timestamp ASC, timestamp ASC, id ASC"
        );
        let mut nodes = Vec::with_capacity(processes.len());
        for process in processes {
            let events = sqlx::query_as::<_, EventRecord>(&event_query)
                .bind(process.id)
                .fetch_all(&mut **tx)
                .await?;
            nodes.push(ProcessNode {
                id: process.id,
                name: process.name,
                events: events.into_iter().map(Into::into).collect(),
            });
        }

        tracing::debug!(file_id, processes = nodes.len(), "Process tree loaded");
        Ok(ProcessTree {
            file_id,
            filename: Some(filename),
            processes: nodes,
        })
    }

    /// List the events of one process in timestamp order.
    pub async fn list_events(
        pool: &PgPool,
        process_id: DbId,
    ) -> Result<Vec<EventRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE process_id = $1
             ORDER BY has_timestamp ASC, timestamp ASC, id ASC"
        );
        sqlx::query_as::<_, EventRecord>(&query)
            .bind(process_id)
            .fetch_all(pool)
            .await
    }

    /// List the attributes of one event in insertion (document) order.
    pub async fn list_attributes(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<Attribute>, sqlx::Error> {
        let query = format!(
            "SELECT {ATTRIBUTE_COLUMNS} FROM attributes WHERE event_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, Attribute>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }
}
