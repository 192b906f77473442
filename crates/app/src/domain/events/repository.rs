//! Outbox Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::domain::events::models::{NewOutboxEvent, OutboxEvent};

const INSERT_OUTBOX_EVENT_SQL: &str = include_str!("sql/insert_outbox_event.sql");
const CLAIM_NEXT_OUTBOX_EVENT_SQL: &str = include_str!("sql/claim_next_outbox_event.sql");
const MARK_OUTBOX_EVENT_PUBLISHED_SQL: &str = include_str!("sql/mark_outbox_event_published.sql");
const RECORD_OUTBOX_EVENT_FAILURE_SQL: &str = include_str!("sql/record_outbox_event_failure.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOutboxRepository;

impl PgOutboxRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: &NewOutboxEvent,
    ) -> Result<i64, sqlx::Error> {
        query_scalar(INSERT_OUTBOX_EVENT_SQL)
            .bind(&event.message_key)
            .bind(event.event_type)
            .bind(&event.payload)
            .fetch_one(&mut **tx)
            .await
    }

    /// Locks up to `batch_size` unpublished events, skipping rows another relay
    /// already holds.
    /// Lock the oldest unpublished event after `after_id` that other relays
    /// have not claimed.
    pub(crate) async fn claim_next(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        max_attempts: i32,
        after_id: i64,
    ) -> Result<Option<OutboxEvent>, sqlx::Error> {
        query_as::<Postgres, OutboxEvent>(CLAIM_NEXT_OUTBOX_EVENT_SQL)
            .bind(max_attempts)
            .bind(after_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn mark_published(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<(), sqlx::Error> {
        query(MARK_OUTBOX_EVENT_PUBLISHED_SQL)
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Returns the attempt count after recording the failure.
    pub(crate) async fn record_failure(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        error: &str,
    ) -> Result<i32, sqlx::Error> {
        query_scalar(RECORD_OUTBOX_EVENT_FAILURE_SQL)
            .bind(id)
            .bind(error)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OutboxEvent {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            message_key: row.try_get("message_key")?,
            event_type: row.try_get("event_type")?,
            payload: row.try_get("payload")?,
            attempts: row.try_get("attempts")?,
        })
    }
}
