//! Create Booking Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use cowork_app::domain::bookings::models::NewBooking;

use crate::{
    bookings::{errors::into_status_error, handlers::BookingResponse},
    extensions::*,
    state::BookingState,
};

/// Create Booking Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateBookingRequest {
    /// Resource to book
    #[serde(alias = "space_id")]
    pub resource_id: i64,

    /// RFC 3339 start of the interval
    pub start_time: String,

    /// RFC 3339 end of the interval, exclusive
    pub end_time: String,
}

/// Create Booking Handler
///
/// Books a resource for the caller. The booking stays PENDING until paid.
#[endpoint(
    tags("bookings"),
    summary = "Create Booking",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Booking created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::NOT_FOUND, description = "Resource not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "bookings.create",
    skip(json, depot, res),
    fields(user_id = tracing::field::Empty, resource_id = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateBookingRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<BookingResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<BookingState>>()?;
    let user_id = depot.principal_or_401()?.user_id;
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("user_id", tracing::field::display(user_id));
    span.record("resource_id", tracing::field::display(request.resource_id));

    let start_time = request
        .start_time
        .parse::<Timestamp>()
        .or_400("start_time must be an RFC 3339 timestamp")?;

    let end_time = request
        .end_time
        .parse::<Timestamp>()
        .or_400("end_time must be an RFC 3339 timestamp")?;

    let booking = state
        .bookings
        .book_resource(NewBooking {
            user_id,
            resource_id: request.resource_id.into(),
            start_time,
            end_time,
        })
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/api/v1/bookings/{}", booking.id), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    tracing::info!(booking_id = %booking.id, total_price = %booking.total_price, "created booking");

    Ok(Json(booking.into()))
}

#[cfg(test)]
mod tests {
    use cowork_app::domain::{
        bookings::{BookingsServiceError, MockBookingsService},
        resources::models::ResourceId,
    };
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::test_helpers::{TEST_USER_ID, booking_service, make_booking};

    use super::*;

    fn make_service(bookings: MockBookingsService) -> Service {
        booking_service(bookings, Router::with_path("bookings").post(handler))
    }

    fn body() -> serde_json::Value {
        json!({
            "space_id": 10,
            "start_time": "2025-01-01T10:00:00Z",
            "end_time": "2025-01-01T12:00:00Z",
        })
    }

    #[tokio::test]
    async fn test_create_booking_returns_201_with_location() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings
            .expect_book_resource()
            .once()
            .withf(|booking| {
                booking.user_id == TEST_USER_ID
                    && booking.resource_id == ResourceId::new(10)
                    && booking.start_time.to_string() == "2025-01-01T10:00:00Z"
            })
            .return_once(|_| Ok(make_booking(7)));

        let mut res = TestClient::post("http://example.com/bookings")
            .json(&body())
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(location, Some("/api/v1/bookings/7"));

        let booking: BookingResponse = res.take_json().await?;

        assert_eq!(booking.id, 7);
        assert_eq!(booking.status, "PENDING");

        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_time_returns_400_without_calling_the_service() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings.expect_book_resource().never();

        let res = TestClient::post("http://example.com/bookings")
            .json(&json!({
                "resource_id": 10,
                "start_time": "tomorrow",
                "end_time": "2025-01-01T12:00:00Z",
            }))
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_inverted_range_returns_400() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings
            .expect_book_resource()
            .once()
            .return_once(|_| Err(BookingsServiceError::InvalidBookingTime));

        let res = TestClient::post("http://example.com/bookings")
            .json(&body())
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_resource_returns_404() -> TestResult {
        let mut bookings = MockBookingsService::new();

        bookings
            .expect_book_resource()
            .once()
            .return_once(|_| Err(BookingsServiceError::ResourceNotFound));

        let res = TestClient::post("http://example.com/bookings")
            .json(&body())
            .send(&make_service(bookings))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
