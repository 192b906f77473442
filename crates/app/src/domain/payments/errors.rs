//! Payments errors.

use sqlx::{Error, error::DatabaseError};
use thiserror::Error;

use crate::resilience::{CircuitOpen, Transient};

/// Partial unique index allowing one live transaction per booking.
const LIVE_TRANSACTION_INDEX: &str = "payment_transactions_live_booking_idx";

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    #[error("booking not found")]
    BookingNotFound,

    #[error("booking already processed")]
    AlreadyProcessed,

    #[error("a payment for this booking is already in progress")]
    PaymentInProgress,

    #[error("booking already paid by another transaction")]
    AlreadyPaid,

    #[error("payment transaction not found")]
    TransactionNotFound,

    #[error("missing parameter {0}")]
    MissingParameter(&'static str),

    #[error("payment failed with gateway response code {response_code}")]
    PaymentFailed { response_code: String },

    #[error("booking total can't be charged")]
    InvalidAmount,

    #[error("booking service unavailable")]
    Upstream(#[source] BookingsClientError),

    #[error("payment expiry out of range")]
    Expiry(#[from] jiff::Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for PaymentsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::TransactionNotFound;
        }

        if error
            .as_database_error()
            .and_then(DatabaseError::constraint)
            .is_some_and(|constraint| constraint == LIVE_TRANSACTION_INDEX)
        {
            return Self::PaymentInProgress;
        }

        Self::Sql(error)
    }
}

impl From<BookingsClientError> for PaymentsServiceError {
    fn from(error: BookingsClientError) -> Self {
        match error {
            BookingsClientError::NotFound => Self::BookingNotFound,
            other => Self::Upstream(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum BookingsClientError {
    #[error("booking not found")]
    NotFound,

    #[error("booking service request failed")]
    Http(#[from] reqwest::Error),

    #[error("booking service responded with status {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("booking service unavailable")]
    CircuitOpen,
}

impl From<CircuitOpen> for BookingsClientError {
    fn from(_: CircuitOpen) -> Self {
        Self::CircuitOpen
    }
}

impl Transient for BookingsClientError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Http(source) => source.is_timeout() || source.is_connect() || source.is_request(),
            Self::UnexpectedResponse { status, .. } => *status >= 500,
            Self::NotFound | Self::CircuitOpen => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing vnp_SecureHash")]
    Missing,

    #[error("invalid signature")]
    Mismatch,
}

/// The HMAC secret was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid VNPAY hash secret")]
pub struct InvalidSecret;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_lookup_404_is_booking_not_found() {
        assert!(matches!(
            PaymentsServiceError::from(BookingsClientError::NotFound),
            PaymentsServiceError::BookingNotFound
        ));

        assert!(matches!(
            PaymentsServiceError::from(BookingsClientError::CircuitOpen),
            PaymentsServiceError::Upstream(BookingsClientError::CircuitOpen)
        ));
    }

    #[test]
    fn only_server_errors_are_transient() {
        let server_error = BookingsClientError::UnexpectedResponse {
            status: 503,
            body: String::new(),
        };

        let conflict = BookingsClientError::UnexpectedResponse {
            status: 409,
            body: String::new(),
        };

        assert!(server_error.is_transient());
        assert!(!conflict.is_transient());
        assert!(!BookingsClientError::NotFound.is_transient());
    }
}
