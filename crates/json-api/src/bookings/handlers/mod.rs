//! Booking Handlers

use rust_decimal::Decimal;
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};

use cowork_app::domain::bookings::models::Booking;

pub(crate) mod check_availability;
pub(crate) mod create;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod mine;
pub(crate) mod update_status;

/// Booking as served to clients and to the payment service.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BookingResponse {
    /// Booking id
    pub id: i64,

    /// Owner of the booking
    pub user_id: i64,

    /// Booked resource
    pub resource_id: i64,

    /// Start of the booked interval (RFC 3339, inclusive)
    pub start_time: String,

    /// End of the booked interval (RFC 3339, exclusive)
    pub end_time: String,

    /// PENDING, CONFIRMED or CANCELLED
    pub status: String,

    /// Price for the whole interval
    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub total_price: Decimal,

    pub created_at: String,

    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        BookingResponse {
            id: booking.id.into(),
            user_id: booking.user_id.into(),
            resource_id: booking.resource_id.into(),
            start_time: booking.start_time.to_string(),
            end_time: booking.end_time.to_string(),
            status: booking.status.to_string(),
            total_price: booking.total_price,
            created_at: booking.created_at.to_string(),
            updated_at: booking.updated_at.to_string(),
        }
    }
}
