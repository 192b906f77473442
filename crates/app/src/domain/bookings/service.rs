//! Bookings service.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        bookings::{
            errors::BookingsServiceError,
            models::{Booking, BookingId, BookingStatus, NewBooking, TimeRange, total_price},
            repository::PgBookingsRepository,
        },
        events::{OutboxError, PgOutboxRepository, models::BookingEvent},
        resources::{ResourceCatalog, models::ResourceId},
    },
    ids::UserId,
};

#[derive(Clone)]
pub struct PgBookingsService {
    db: Db,
    repository: PgBookingsRepository,
    outbox: PgOutboxRepository,
    catalog: Arc<dyn ResourceCatalog>,
}

impl PgBookingsService {
    #[must_use]
    pub fn new(db: Db, catalog: Arc<dyn ResourceCatalog>) -> Self {
        Self {
            db,
            repository: PgBookingsRepository::new(),
            outbox: PgOutboxRepository::new(),
            catalog,
        }
    }
}

impl Debug for PgBookingsService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgBookingsService")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BookingsService for PgBookingsService {
    #[tracing::instrument(
        name = "bookings.service.book_resource",
        skip(self, booking),
        fields(
            user_id = %booking.user_id,
            resource_id = %booking.resource_id,
            booking_id = tracing::field::Empty
        ),
        err
    )]
    async fn book_resource(&self, booking: NewBooking) -> Result<Booking, BookingsServiceError> {
        let range = TimeRange::new(booking.start_time, booking.end_time)?;

        let resource = self.catalog.get_resource(booking.resource_id).await?;

        let price = total_price(&range, resource.unit_price);

        let mut tx = self.db.begin_transaction().await?;

        let created = self
            .repository
            .create_booking(&mut tx, &booking, price)
            .await?;

        let event = BookingEvent::created(&created, &resource.name)
            .to_outbox()
            .map_err(OutboxError::from)?;

        self.outbox.insert_event(&mut tx, &event).await?;

        tx.commit().await?;

        tracing::Span::current().record("booking_id", tracing::field::display(created.id));

        info!(total_price = %created.total_price, "booking created");

        Ok(created)
    }

    #[tracing::instrument(
        name = "bookings.service.update_status",
        skip(self),
        err
    )]
    async fn update_status(
        &self,
        booking: BookingId,
        status: &str,
    ) -> Result<Booking, BookingsServiceError> {
        let next: BookingStatus = status.parse()?;

        let mut tx = self.db.begin_transaction().await?;

        let current = self.repository.lock_booking(&mut tx, booking).await?;

        if current.status == next {
            tx.commit().await?;

            return Ok(current);
        }

        if !current.status.can_transition_to(next) {
            return Err(BookingsServiceError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }

        let updated = self.repository.update_status(&mut tx, booking, next).await?;

        let event = BookingEvent::status_updated(&updated)
            .to_outbox()
            .map_err(OutboxError::from)?;

        self.outbox.insert_event(&mut tx, &event).await?;

        tx.commit().await?;

        info!(from = %current.status, to = %next, "booking status changed");

        Ok(updated)
    }

    async fn get_booking(&self, booking: BookingId) -> Result<Booking, BookingsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let booking = self.repository.get_booking(&mut tx, booking).await?;

        tx.commit().await?;

        Ok(booking)
    }

    async fn list_user_bookings(&self, user: UserId) -> Result<Vec<Booking>, BookingsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let bookings = self.repository.list_user_bookings(&mut tx, user).await?;

        tx.commit().await?;

        Ok(bookings)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let bookings = self.repository.list_bookings(&mut tx).await?;

        tx.commit().await?;

        Ok(bookings)
    }

    async fn check_availability(
        &self,
        resources: &[ResourceId],
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ResourceId>, BookingsServiceError> {
        let range = TimeRange::new(start, end)?;

        if resources.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.db.begin_transaction().await?;

        let unavailable = self
            .repository
            .find_unavailable_resources(&mut tx, resources, range.start(), range.end())
            .await?;

        tx.commit().await?;

        Ok(unavailable)
    }
}

#[automock]
#[async_trait]
pub trait BookingsService: Send + Sync {
    /// Create a PENDING booking priced from the resource's hourly rate.
    async fn book_resource(&self, booking: NewBooking) -> Result<Booking, BookingsServiceError>;

    /// Move a booking to `status`. Re-applying the current status is a no-op.
    async fn update_status(
        &self,
        booking: BookingId,
        status: &str,
    ) -> Result<Booking, BookingsServiceError>;

    async fn get_booking(&self, booking: BookingId) -> Result<Booking, BookingsServiceError>;

    /// A user's bookings, newest first.
    async fn list_user_bookings(&self, user: UserId) -> Result<Vec<Booking>, BookingsServiceError>;

    /// Every booking, newest first.
    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingsServiceError>;

    /// The subset of `resources` holding a CONFIRMED booking that overlaps
    /// `[start, end)`, ascending.
    async fn check_availability(
        &self,
        resources: &[ResourceId],
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ResourceId>, BookingsServiceError>;
}
