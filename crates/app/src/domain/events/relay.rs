//! Outbox Relay

use std::{sync::Arc, time::Duration};

use sqlx::{Postgres, Transaction};
use tokio::{sync::watch, time::interval};
use tracing::{debug, error, info, warn};

use crate::{
    database::Db,
    domain::events::{
        EventPublisher, PgOutboxRepository, errors::OutboxError, models::OutboxEvent,
    },
};

#[derive(Debug, Clone, Copy)]
pub struct RelayConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
    /// Events that failed this many times stay in the table for inspection.
    pub max_attempts: i32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 100,
            max_attempts: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub published: usize,
    pub failed: usize,
}

/// Drains committed outbox rows to the broker, at least once and in id order.
#[derive(Clone)]
pub struct OutboxRelay {
    db: Db,
    repository: PgOutboxRepository,
    publisher: Arc<dyn EventPublisher>,
    config: RelayConfig,
}

impl OutboxRelay {
    #[must_use]
    pub fn new(db: Db, publisher: Arc<dyn EventPublisher>, config: RelayConfig) -> Self {
        Self {
            db,
            repository: PgOutboxRepository::new(),
            publisher,
            config,
        }
    }

    /// Publish up to `batch_size` pending events.
    ///
    /// Each event is claimed, published and settled in its own transaction,
    /// so a slow broker holds at most one row lock at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbox can't be read or updated. Broker failures
    /// are recorded against the event instead.
    pub async fn relay_batch(&self) -> Result<RelayReport, OutboxError> {
        let mut report = RelayReport::default();
        let mut cursor = 0;

        for _ in 0..self.config.batch_size {
            let mut tx = self.db.begin_transaction().await?;

            let Some(event) = self
                .repository
                .claim_next(&mut tx, self.config.max_attempts, cursor)
                .await?
            else {
                break;
            };

            cursor = event.id;

            if self.relay_event(&mut tx, &event).await? {
                report.published += 1;
            } else {
                report.failed += 1;
            }

            tx.commit().await?;
        }

        Ok(report)
    }

    /// Returns whether the broker accepted the event.
    async fn relay_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: &OutboxEvent,
    ) -> Result<bool, OutboxError> {
        let payload = serde_json::to_vec(&event.payload)?;

        let Err(publish_error) = self.publisher.publish(&event.message_key, &payload).await else {
            self.repository.mark_published(tx, event.id).await?;

            return Ok(true);
        };

        let attempts = self
            .repository
            .record_failure(tx, event.id, &publish_error.to_string())
            .await?;

        if attempts >= self.config.max_attempts {
            error!(
                event_id = event.id,
                event_type = %event.event_type,
                attempts,
                error = %publish_error,
                "giving up on outbox event"
            );
        } else {
            warn!(
                event_id = event.id,
                attempts,
                error = %publish_error,
                "failed to publish outbox event"
            );
        }

        Ok(false)
    }

    /// Poll until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.poll_interval);

        info!(
            poll_interval_ms = self.config.poll_interval.as_millis(),
            batch_size = self.config.batch_size,
            "outbox relay started"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.relay_batch().await {
                        Ok(report) if report.published > 0 || report.failed > 0 => {
                            debug!(
                                published = report.published,
                                failed = report.failed,
                                "relayed outbox batch"
                            );
                        }
                        Ok(_) => {}
                        Err(relay_error) => error!(error = %relay_error, "outbox relay failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("outbox relay stopped");
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{query_as, query_scalar};
    use testresult::TestResult;
    use tokio::{runtime::Handle, task::block_in_place};

    use crate::{
        database::BOOKINGS_MIGRATOR,
        domain::events::{MockEventPublisher, PublishError, models::NewOutboxEvent},
        test::TestDb,
    };

    use super::*;

    async fn insert(db: &TestDb, key: &str) -> Result<i64, sqlx::Error> {
        let mut tx = db.pool().begin().await?;

        let id = PgOutboxRepository::new()
            .insert_event(
                &mut tx,
                &NewOutboxEvent {
                    message_key: key.to_owned(),
                    event_type: "BOOKING_CREATED",
                    payload: serde_json::json!({ "user_id": 1 }),
                },
            )
            .await?;

        tx.commit().await?;

        Ok(id)
    }

    #[tokio::test]
    async fn publishes_pending_events_once() -> TestResult {
        let test_db = TestDb::new(&BOOKINGS_MIGRATOR).await;

        insert(&test_db, "1").await?;
        insert(&test_db, "2").await?;

        let mut publisher = MockEventPublisher::new();

        publisher
            .expect_publish()
            .times(2)
            .returning(|_, _| Ok(()));

        let relay = OutboxRelay::new(
            Db::new(test_db.pool().clone()),
            Arc::new(publisher),
            RelayConfig::default(),
        );

        assert_eq!(
            relay.relay_batch().await?,
            RelayReport {
                published: 2,
                failed: 0
            }
        );

        assert_eq!(relay.relay_batch().await?, RelayReport::default());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn each_event_is_committed_before_the_next_publish() -> TestResult {
        let test_db = TestDb::new(&BOOKINGS_MIGRATOR).await;

        insert(&test_db, "1").await?;
        insert(&test_db, "2").await?;

        let pool = test_db.pool().clone();
        let mut publisher = MockEventPublisher::new();

        publisher
            .expect_publish()
            .withf(|key, _| key == "1")
            .once()
            .returning(|_, _| Ok(()));

        publisher
            .expect_publish()
            .withf(|key, _| key == "2")
            .once()
            .returning(move |_, _| {
                let published: Result<i64, sqlx::Error> = block_in_place(|| {
                    Handle::current().block_on(
                        query_scalar(
                            "SELECT count(*) FROM outbox_events WHERE published_at IS NOT NULL",
                        )
                        .fetch_one(&pool),
                    )
                });

                match published {
                    Ok(1) => Ok(()),
                    _ => Err(PublishError::Kafka(rdkafka::error::KafkaError::Canceled)),
                }
            });

        let relay = OutboxRelay::new(
            Db::new(test_db.pool().clone()),
            Arc::new(publisher),
            RelayConfig::default(),
        );

        assert_eq!(
            relay.relay_batch().await?,
            RelayReport {
                published: 2,
                failed: 0
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn batch_size_bounds_one_tick() -> TestResult {
        let test_db = TestDb::new(&BOOKINGS_MIGRATOR).await;

        insert(&test_db, "1").await?;
        insert(&test_db, "2").await?;

        let mut publisher = MockEventPublisher::new();

        publisher.expect_publish().times(2).returning(|_, _| Ok(()));

        let relay = OutboxRelay::new(
            Db::new(test_db.pool().clone()),
            Arc::new(publisher),
            RelayConfig {
                batch_size: 1,
                ..RelayConfig::default()
            },
        );

        assert_eq!(relay.relay_batch().await?.published, 1);
        assert_eq!(relay.relay_batch().await?.published, 1);
        assert_eq!(relay.relay_batch().await?, RelayReport::default());

        Ok(())
    }

    #[tokio::test]
    async fn failed_events_are_retried_until_the_attempt_limit() -> TestResult {
        let test_db = TestDb::new(&BOOKINGS_MIGRATOR).await;

        let id = insert(&test_db, "1").await?;

        let mut publisher = MockEventPublisher::new();

        publisher.expect_publish().times(2).returning(|_, _| {
            Err(PublishError::Kafka(
                rdkafka::error::KafkaError::Canceled,
            ))
        });

        let relay = OutboxRelay::new(
            Db::new(test_db.pool().clone()),
            Arc::new(publisher),
            RelayConfig {
                max_attempts: 2,
                ..RelayConfig::default()
            },
        );

        assert_eq!(relay.relay_batch().await?.failed, 1);
        assert_eq!(relay.relay_batch().await?.failed, 1);
        assert_eq!(relay.relay_batch().await?, RelayReport::default());

        let (attempts, published): (i32, bool) =
            query_as("SELECT attempts, published_at IS NOT NULL FROM outbox_events WHERE id = $1")
                .bind(id)
                .fetch_one(test_db.pool())
                .await?;

        assert_eq!(attempts, 2);
        assert!(!published);

        Ok(())
    }
}
