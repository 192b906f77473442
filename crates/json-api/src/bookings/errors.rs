//! Booking Errors

use salvo::http::StatusError;
use tracing::error;

use cowork_app::domain::bookings::BookingsServiceError;

pub(crate) fn into_status_error(error: BookingsServiceError) -> StatusError {
    match error {
        BookingsServiceError::InvalidBookingTime => {
            StatusError::bad_request().brief("end_time must be after start_time")
        }
        BookingsServiceError::InvalidStatus(status) => {
            StatusError::bad_request().brief(format!("invalid booking status {status:?}"))
        }
        BookingsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid booking payload")
        }
        error @ BookingsServiceError::InvalidTransition { .. } => {
            StatusError::conflict().brief(error.to_string())
        }
        BookingsServiceError::SlotUnavailable => StatusError::conflict()
            .brief("Resource already booked for an overlapping time range"),
        BookingsServiceError::NotFound => StatusError::not_found().brief("Booking not found"),
        BookingsServiceError::ResourceNotFound => {
            StatusError::not_found().brief("Resource not found")
        }
        BookingsServiceError::Upstream(source) => {
            error!("resource catalog call failed: {source}");

            StatusError::internal_server_error().brief("Resource catalog unavailable")
        }
        BookingsServiceError::Event(source) => {
            error!("failed to record booking event: {source}");

            StatusError::internal_server_error()
        }
        BookingsServiceError::Sql(source) => {
            error!("booking storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use cowork_app::domain::{bookings::models::BookingStatus, resources::ResourceCatalogError};
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn conflicts_map_to_409() {
        let transition = into_status_error(BookingsServiceError::InvalidTransition {
            from: BookingStatus::Confirmed,
            to: BookingStatus::Cancelled,
        });

        assert_eq!(transition.code, StatusCode::CONFLICT);
        assert_eq!(
            into_status_error(BookingsServiceError::SlotUnavailable).code,
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn missing_booking_and_resource_map_to_404() {
        assert_eq!(
            into_status_error(BookingsServiceError::NotFound).code,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            into_status_error(BookingsServiceError::ResourceNotFound).code,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn catalog_outage_maps_to_500() {
        let status = into_status_error(BookingsServiceError::Upstream(
            ResourceCatalogError::CircuitOpen,
        ));

        assert_eq!(status.code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
