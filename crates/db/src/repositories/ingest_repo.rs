//! Ingestion writer: stores a parsed event log as one atomic unit.
//!
//! Writes the `files` row, the uploader's `user_files` link, then every
//! process, event and attribute row in input order. Children are inserted
//! only once the parent's generated id is known, and everything happens in
//! a single transaction: on any error the transaction is dropped, which
//! rolls it back, so no partial file is ever visible.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use sqlx::{PgPool, Postgres, Transaction};
use xesviz_core::activity::actions;
use xesviz_core::types::DbId;
use xesviz_core::xes::Event;

use crate::error::{IngestStage, PersistenceError};
use crate::models::activity::CreateUserActivity;
use crate::models::upload::{IngestSummary, NewUpload};
use crate::repositories::UserActivityRepo;

/// Provides the ingest transaction.
pub struct IngestRepo;

impl IngestRepo {
    /// Store `upload` for its owner and return the new file id with row counts.
    pub async fn ingest(
        pool: &PgPool,
        upload: &NewUpload<'_>,
    ) -> Result<IngestSummary, PersistenceError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(PersistenceError::at(IngestStage::Begin))?;

        let file_id: DbId =
            sqlx::query_scalar("INSERT INTO files (filename) VALUES ($1) RETURNING id")
                .bind(upload.filename)
                .fetch_one(&mut *tx)
                .await
                .map_err(PersistenceError::at(IngestStage::InsertFile))?;

        sqlx::query("INSERT INTO user_files (user_id, file_id) VALUES ($1, $2)")
            .bind(upload.owner_id)
            .bind(file_id)
            .execute(&mut *tx)
            .await
            .map_err(PersistenceError::at(IngestStage::LinkOwner))?;

        let mut summary = IngestSummary {
            file_id,
            process_count: 0,
            event_count: 0,
            attribute_count: 0,
        };

        for trace in upload.traces {
            let process_id: DbId = sqlx::query_scalar(
                "INSERT INTO processes (file_id, name) VALUES ($1, $2) RETURNING id",
            )
            .bind(file_id)
            .bind(&trace.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(PersistenceError::at(IngestStage::InsertProcess))?;
            summary.process_count += 1;

            for event in &trace.events {
                let event_id = Self::insert_event(&mut tx, process_id, event).await?;
                summary.event_count += 1;
                summary.attribute_count +=
                    Self::insert_attributes(&mut tx, event_id, &event.attributes).await?;
            }
        }

        UserActivityRepo::record(
            &mut *tx,
            &CreateUserActivity {
                user_id: upload.owner_id,
                action: actions::FILE_UPLOAD.to_string(),
                file_id: Some(file_id),
                details: Some(upload.filename.to_string()),
            },
        )
        .await
        .map_err(PersistenceError::at(IngestStage::RecordActivity))?;

        tx.commit()
            .await
            .map_err(PersistenceError::at(IngestStage::Commit))?;

        tracing::info!(
            file_id,
            owner_id = upload.owner_id,
            processes = summary.process_count,
            events = summary.event_count,
            attributes = summary.attribute_count,
            "Event log ingested",
        );
        Ok(summary)
    }

    /// Insert one event row. A missing timestamp is stored as the Unix epoch
    /// with `has_timestamp = false`.
    async fn insert_event(
        tx: &mut Transaction<'_, Postgres>,
        process_id: DbId,
        event: &Event,
    ) -> Result<DbId, PersistenceError> {
        let (timestamp, has_timestamp) = match event.timestamp {
            Some(ts) => (ts, true),
            None => (DateTime::<Utc>::UNIX_EPOCH, false),
        };

        sqlx::query_scalar(
            "INSERT INTO events (process_id, event_name, timestamp, has_timestamp)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(process_id)
        .bind(&event.name)
        .bind(timestamp)
        .bind(has_timestamp)
        .fetch_one(&mut **tx)
        .await
        .map_err(PersistenceError::at(IngestStage::InsertEvent))
    }

    /// Insert all attributes of one event with a single statement.
    ///
    /// Returns the number of rows written.
    async fn insert_attributes(
        tx: &mut Transaction<'_, Postgres>,
        event_id: DbId,
        attributes: &IndexMap<String, String>,
    ) -> Result<u64, PersistenceError> {
        if attributes.is_empty() {
            return Ok(0);
        }

        let (names, values): (Vec<&str>, Vec<&str>) = attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .unzip();

        let result = sqlx::query(
            "INSERT INTO attributes (event_id, attribute_name, attribute_value)
             SELECT $1, name, value FROM UNNEST($2::text[], $3::text[]) AS a(name, value)",
        )
        .bind(event_id)
        .bind(names)
        .bind(values)
        .execute(&mut **tx)
        .await
        .map_err(PersistenceError::at(IngestStage::InsertAttributes))?;

        Ok(result.rows_affected())
    }
}
