//! Get Booking Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    bookings::{errors::into_status_error, handlers::BookingResponse},
    extensions::*,
    state::BookingState,
};

/// Get Booking Handler
///
/// Internal lookup used by the payment service.
#[endpoint(
    tags("bookings"),
    summary = "Get Booking",
    responses(
        (status_code = StatusCode::OK, description = "Booking"),
        (status_code = StatusCode::NOT_FOUND, description = "Booking not found"),
    ),
)]
pub(crate) async fn handler(
    id: PathParam<i64>,
    depot: &mut Depot,
) -> Result<Json<BookingResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<BookingState>>()?;

    let booking = state
        .bookings
        .get_booking(id.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(booking.into()))
}

#[cfg(test)]
mod tests {
    use cowork_app::domain::bookings::{
        BookingsServiceError, MockBookingsService, models::BookingId,
    };
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::test_helpers::{booking_service, make_booking};

    use super::*;

    fn make_service(bookings: MockBookingsService) -> Service {
        booking_service(bookings, Router::with_path("bookings/{id:num}").get(handler))
    }

    #[tokio::test]
    async fn test_get_returns_booking() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings
            .expect_get_booking()
            .once()
            .withf(|id| *id == BookingId::new(7))
            .return_once(|_| Ok(make_booking(7)));

        let booking: BookingResponse = TestClient::get("http://example.com/bookings/7")
            .send(&make_service(bookings))
            .await
            .take_json()
            .await?;

        assert_eq!(booking.id, 7);
        assert_eq!(booking.resource_id, 10);
        assert_eq!(booking.start_time, "2025-01-01T10:00:00Z");

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_booking_returns_404() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings
            .expect_get_booking()
            .once()
            .return_once(|_| Err(BookingsServiceError::NotFound));

        let res = TestClient::get("http://example.com/bookings/99")
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
