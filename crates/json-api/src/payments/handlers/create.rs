//! Create Payment Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, payments::errors::into_status_error, state::PaymentState};

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT_IP: &str = "127.0.0.1";

/// Create Payment Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaymentUrlResponse {
    /// Signed gateway URL to redirect the payer to
    pub payment_url: String,
}

/// Create Payment Handler
///
/// Opens a payment transaction for a PENDING booking.
#[endpoint(
    tags("payments"),
    summary = "Create Payment URL",
    responses(
        (status_code = StatusCode::OK, description = "Payment URL"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing or malformed booking_id"),
        (status_code = StatusCode::NOT_FOUND, description = "Booking not found"),
        (status_code = StatusCode::CONFLICT, description = "Booking already processed or payment in progress"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "payments.create",
    skip(booking_id, req, depot),
    fields(booking_id = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    booking_id: QueryParam<String, false>,
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<PaymentUrlResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<PaymentState>>()?;

    let booking_id = booking_id
        .into_inner()
        .ok_or_else(|| StatusError::bad_request().brief("booking_id is required"))?
        .parse::<i64>()
        .or_400("booking_id must be an integer")?;

    tracing::Span::current().record("booking_id", booking_id);

    let payment_url = state
        .payments
        .create_payment_url(booking_id.into(), &client_ip(req))
        .await
        .map_err(into_status_error)?;

    Ok(Json(PaymentUrlResponse { payment_url }))
}

/// First hop of `X-Forwarded-For`, falling back to the peer address.
fn client_ip(req: &Request) -> String {
    let forwarded = req
        .header::<String>(FORWARDED_FOR)
        .and_then(|value| {
            value
                .split(',')
                .next()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_owned)
        });

    if let Some(ip) = forwarded {
        return ip;
    }

    let remote = req.remote_addr();

    remote
        .as_ipv4()
        .map(|addr| addr.ip().to_string())
        .or_else(|| remote.as_ipv6().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT_IP.to_owned())
}

#[cfg(test)]
mod tests {
    use cowork_app::domain::{
        bookings::models::BookingId,
        payments::{MockPaymentsService, PaymentsServiceError},
    };
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::test_helpers::payment_service;

    use super::*;

    fn make_service(payments: MockPaymentsService) -> Service {
        payment_service(payments, Router::with_path("payments/create").get(handler))
    }

    #[tokio::test]
    async fn test_returns_payment_url_for_forwarded_client() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_create_payment_url()
            .once()
            .withf(|booking, ip| *booking == BookingId::new(7) && ip == "203.0.113.9")
            .return_once(|_, _| Ok("https://pay.example/?vnp_TxnRef=1".to_owned()));

        let response: PaymentUrlResponse =
            TestClient::get("http://example.com/payments/create?booking_id=7")
                .add_header(FORWARDED_FOR, "203.0.113.9, 10.0.0.1", true)
                .send(&make_service(payments))
                .await
                .take_json()
                .await?;

        assert_eq!(response.payment_url, "https://pay.example/?vnp_TxnRef=1");

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_or_malformed_booking_id_returns_400() -> TestResult {
        for uri in [
            "http://example.com/payments/create",
            "http://example.com/payments/create?booking_id=seven",
        ] {
            let mut payments = MockPaymentsService::new();

            payments.expect_create_payment_url().never();

            let res = TestClient::get(uri).send(&make_service(payments)).await;

            assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST), "{uri}");
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_processed_booking_returns_409() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_create_payment_url()
            .once()
            .return_once(|_, _| Err(PaymentsServiceError::AlreadyProcessed));

        let res = TestClient::get("http://example.com/payments/create?booking_id=7")
            .send(&make_service(payments))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
