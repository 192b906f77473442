//! Payment Errors

use salvo::http::StatusError;
use tracing::{error, warn};

use cowork_app::domain::payments::PaymentsServiceError;

pub(crate) fn into_status_error(error: PaymentsServiceError) -> StatusError {
    match error {
        PaymentsServiceError::BookingNotFound => {
            StatusError::not_found().brief("Booking not found")
        }
        PaymentsServiceError::TransactionNotFound => {
            StatusError::not_found().brief("Payment transaction not found")
        }
        PaymentsServiceError::AlreadyProcessed => {
            StatusError::conflict().brief("Booking already processed")
        }
        PaymentsServiceError::PaymentInProgress => {
            StatusError::conflict().brief("A payment for this booking is already in progress")
        }
        PaymentsServiceError::AlreadyPaid => {
            StatusError::conflict().brief("Booking already paid by another transaction")
        }
        PaymentsServiceError::MissingParameter(name) => {
            StatusError::bad_request().brief(format!("missing {name}"))
        }
        PaymentsServiceError::PaymentFailed { response_code } => {
            warn!(response_code = %response_code, "payment declined by gateway");

            StatusError::bad_request().brief(format!(
                "Payment failed with gateway response code {response_code}"
            ))
        }
        PaymentsServiceError::InvalidAmount => {
            StatusError::bad_request().brief("Booking total can't be charged")
        }
        PaymentsServiceError::Upstream(source) => {
            error!("booking service call failed: {source}");

            StatusError::internal_server_error().brief("Booking service unavailable")
        }
        PaymentsServiceError::Expiry(source) => {
            error!("failed to compute payment expiry: {source}");

            StatusError::internal_server_error()
        }
        PaymentsServiceError::Sql(source) => {
            error!("payment storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use cowork_app::domain::payments::BookingsClientError;
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn already_processed_is_a_conflict() {
        let status = into_status_error(PaymentsServiceError::AlreadyProcessed);

        assert_eq!(status.code, StatusCode::CONFLICT);
        assert_eq!(status.brief, "Booking already processed");
    }

    #[test]
    fn late_duplicate_payment_is_a_conflict() {
        let status = into_status_error(PaymentsServiceError::AlreadyPaid);

        assert_eq!(status.code, StatusCode::CONFLICT);
    }

    #[test]
    fn declined_payment_is_a_bad_request() {
        let status = into_status_error(PaymentsServiceError::PaymentFailed {
            response_code: "24".to_owned(),
        });

        assert_eq!(status.code, StatusCode::BAD_REQUEST);
        assert!(status.brief.contains("24"), "brief names the response code");
    }

    #[test]
    fn booking_service_outage_is_a_server_error() {
        let status =
            into_status_error(PaymentsServiceError::Upstream(BookingsClientError::CircuitOpen));

        assert_eq!(status.code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
