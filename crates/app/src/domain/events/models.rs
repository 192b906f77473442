//! Event Models

use serde::Serialize;
use serde_json::Value;

use crate::{domain::bookings::models::Booking, ids::UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEventType {
    BookingCreated,
    BookingStatusUpdated,
}

impl BookingEventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BookingCreated => "BOOKING_CREATED",
            Self::BookingStatusUpdated => "BOOKING_STATUS_UPDATED",
        }
    }
}

/// Notification event as consumed by the notification service.
#[derive(Debug, Serialize)]
pub struct BookingEvent<'a> {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub event_type: BookingEventType,
    pub content: String,
    pub booking: &'a Booking,
}

impl<'a> BookingEvent<'a> {
    #[must_use]
    pub fn created(booking: &'a Booking, resource_name: &str) -> Self {
        Self {
            user_id: booking.user_id,
            event_type: BookingEventType::BookingCreated,
            content: format!(
                "You booked {resource_name} from {} to {}",
                booking.start_time, booking.end_time
            ),
            booking,
        }
    }

    #[must_use]
    pub fn status_updated(booking: &'a Booking) -> Self {
        Self {
            user_id: booking.user_id,
            event_type: BookingEventType::BookingStatusUpdated,
            content: format!(
                "Your booking {} status changed to {}",
                booking.id, booking.status
            ),
            booking,
        }
    }

    /// Partition key: creations are keyed by user, status changes by booking.
    #[must_use]
    pub fn message_key(&self) -> String {
        match self.event_type {
            BookingEventType::BookingCreated => self.user_id.to_string(),
            BookingEventType::BookingStatusUpdated => self.booking.id.to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the payload can't be serialized.
    pub fn to_outbox(&self) -> Result<NewOutboxEvent, serde_json::Error> {
        Ok(NewOutboxEvent {
            message_key: self.message_key(),
            event_type: self.event_type.as_str(),
            payload: serde_json::to_value(self)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOutboxEvent {
    pub message_key: String,
    pub event_type: &'static str,
    pub payload: Value,
}

/// Unpublished outbox row claimed by the relay.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEvent {
    pub id: i64,
    pub message_key: String,
    pub event_type: String,
    pub payload: Value,
    pub attempts: i32,
}
