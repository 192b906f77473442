//! Bookings service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    bookings::models::{BookingStatus, InvalidTimeRange, UnknownBookingStatus},
    events::OutboxError,
    resources::ResourceCatalogError,
};

/// SQLSTATE raised when the no-overlapping-confirmed-bookings constraint fires.
const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(Debug, Error)]
pub enum BookingsServiceError {
    #[error("invalid booking time range")]
    InvalidBookingTime,

    #[error("invalid booking status {0:?}")]
    InvalidStatus(String),

    #[error("booking cannot move from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking not found")]
    NotFound,

    #[error("resource not found")]
    ResourceNotFound,

    #[error("resource already booked for an overlapping time range")]
    SlotUnavailable,

    #[error("invalid data")]
    InvalidData,

    #[error("resource catalog unavailable")]
    Upstream(#[source] ResourceCatalogError),

    #[error("failed to record booking event")]
    Event(#[from] OutboxError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for BookingsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        if error
            .as_database_error()
            .and_then(DatabaseError::code)
            .is_some_and(|code| code == EXCLUSION_VIOLATION)
        {
            return Self::SlotUnavailable;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<InvalidTimeRange> for BookingsServiceError {
    fn from(_: InvalidTimeRange) -> Self {
        Self::InvalidBookingTime
    }
}

impl From<UnknownBookingStatus> for BookingsServiceError {
    fn from(error: UnknownBookingStatus) -> Self {
        Self::InvalidStatus(error.0)
    }
}

impl From<ResourceCatalogError> for BookingsServiceError {
    fn from(error: ResourceCatalogError) -> Self {
        match error {
            ResourceCatalogError::NotFound => Self::ResourceNotFound,
            other => Self::Upstream(other),
        }
    }
}
