//! Update Booking Status Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    bookings::{errors::into_status_error, handlers::BookingResponse},
    extensions::*,
    state::BookingState,
};

/// Update Booking Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateStatusRequest {
    /// PENDING, CONFIRMED or CANCELLED
    pub status: String,
}

/// Update Booking Status Handler
///
/// Called by the payment service once a booking is paid.
#[endpoint(
    tags("bookings"),
    summary = "Update Booking Status",
    responses(
        (status_code = StatusCode::OK, description = "Booking updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status"),
        (status_code = StatusCode::NOT_FOUND, description = "Booking not found"),
        (status_code = StatusCode::CONFLICT, description = "Transition not allowed or slot taken"),
    ),
)]
#[tracing::instrument(
    name = "bookings.update_status",
    skip(id, json, depot),
    fields(booking_id = tracing::field::Empty, status = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    id: PathParam<i64>,
    json: JsonBody<UpdateStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<BookingResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<BookingState>>()?;
    let id = id.into_inner();
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("booking_id", id);
    span.record("status", tracing::field::display(&request.status));

    let booking = state
        .bookings
        .update_status(id.into(), &request.status)
        .await
        .map_err(into_status_error)?;

    Ok(Json(booking.into()))
}

#[cfg(test)]
mod tests {
    use cowork_app::domain::bookings::{
        BookingsServiceError, MockBookingsService,
        models::{BookingId, BookingStatus},
    };
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::test_helpers::{booking_service, make_booking};

    use super::*;

    fn make_service(bookings: MockBookingsService) -> Service {
        booking_service(
            bookings,
            Router::with_path("bookings/{id:num}/status").put(handler),
        )
    }

    #[tokio::test]
    async fn test_confirm_returns_updated_booking() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings
            .expect_update_status()
            .once()
            .withf(|id, status| *id == BookingId::new(7) && status == "CONFIRMED")
            .return_once(|_, _| {
                let mut booking = make_booking(7);

                booking.status = BookingStatus::Confirmed;

                Ok(booking)
            });

        let booking: BookingResponse = TestClient::put("http://example.com/bookings/7/status")
            .json(&json!({ "status": "CONFIRMED" }))
            .send(&make_service(bookings))
            .await
            .take_json()
            .await?;

        assert_eq!(booking.status, "CONFIRMED");

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_returns_400() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings
            .expect_update_status()
            .once()
            .return_once(|_, status| Err(BookingsServiceError::InvalidStatus(status.to_owned())));

        let res = TestClient::put("http://example.com/bookings/7/status")
            .json(&json!({ "status": "PAID" }))
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_terminal_booking_returns_409() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings.expect_update_status().once().return_once(|_, _| {
            Err(BookingsServiceError::InvalidTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed,
            })
        });

        let res = TestClient::put("http://example.com/bookings/7/status")
            .json(&json!({ "status": "CONFIRMED" }))
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
