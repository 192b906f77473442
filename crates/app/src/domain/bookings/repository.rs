//! Bookings Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::{
    domain::{
        bookings::models::{Booking, BookingId, BookingStatus, NewBooking},
        resources::models::ResourceId,
    },
    ids::UserId,
};

const CREATE_BOOKING_SQL: &str = include_str!("sql/create_booking.sql");
const GET_BOOKING_SQL: &str = include_str!("sql/get_booking.sql");
const LOCK_BOOKING_SQL: &str = include_str!("sql/lock_booking.sql");
const UPDATE_BOOKING_STATUS_SQL: &str = include_str!("sql/update_booking_status.sql");
const LIST_BOOKINGS_SQL: &str = include_str!("sql/list_bookings.sql");
const LIST_USER_BOOKINGS_SQL: &str = include_str!("sql/list_user_bookings.sql");
const FIND_UNAVAILABLE_RESOURCES_SQL: &str = include_str!("sql/find_unavailable_resources.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgBookingsRepository;

impl PgBookingsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &NewBooking,
        total_price: Decimal,
    ) -> Result<Booking, sqlx::Error> {
        query_as::<Postgres, Booking>(CREATE_BOOKING_SQL)
            .bind(booking.user_id.into_inner())
            .bind(booking.resource_id.into_inner())
            .bind(SqlxTimestamp::from(booking.start_time))
            .bind(SqlxTimestamp::from(booking.end_time))
            .bind(total_price)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingId,
    ) -> Result<Booking, sqlx::Error> {
        query_as::<Postgres, Booking>(GET_BOOKING_SQL)
            .bind(booking.into_inner())
            .fetch_one(&mut **tx)
            .await
    }

    /// Like [`Self::get_booking`], holding a row lock until `tx` ends.
    pub(crate) async fn lock_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingId,
    ) -> Result<Booking, sqlx::Error> {
        query_as::<Postgres, Booking>(LOCK_BOOKING_SQL)
            .bind(booking.into_inner())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingId,
        status: BookingStatus,
    ) -> Result<Booking, sqlx::Error> {
        query_as::<Postgres, Booking>(UPDATE_BOOKING_STATUS_SQL)
            .bind(booking.into_inner())
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_bookings(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        query_as::<Postgres, Booking>(LIST_BOOKINGS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_user_bookings(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserId,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        query_as::<Postgres, Booking>(LIST_USER_BOOKINGS_SQL)
            .bind(user.into_inner())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn find_unavailable_resources(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        resources: &[ResourceId],
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ResourceId>, sqlx::Error> {
        let ids: Vec<i64> = resources.iter().map(|id| id.into_inner()).collect();

        let unavailable: Vec<i64> = query_scalar(FIND_UNAVAILABLE_RESOURCES_SQL)
            .bind(ids)
            .bind(SqlxTimestamp::from(start))
            .bind(SqlxTimestamp::from(end))
            .fetch_all(&mut **tx)
            .await?;

        Ok(unavailable.into_iter().map(ResourceId::new).collect())
    }
}

impl<'r> FromRow<'r, PgRow> for Booking {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status
            .parse::<BookingStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: BookingId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            resource_id: ResourceId::new(row.try_get("resource_id")?),
            start_time: row.try_get::<SqlxTimestamp, _>("start_time")?.to_jiff(),
            end_time: row.try_get::<SqlxTimestamp, _>("end_time")?.to_jiff(),
            status,
            total_price: row.try_get("total_price")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
