//! Booking service client.

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::{
    domain::{
        bookings::models::{BookingId, BookingStatus},
        payments::{errors::BookingsClientError, models::BookingSnapshot},
    },
    resilience::{ResilienceConfig, Resilient},
};

#[derive(Debug)]
pub struct HttpBookingsClient {
    http: Client,
    base_url: String,
    resilient: Resilient,
}

impl HttpBookingsClient {
    /// Create a client for the booking service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be built.
    pub fn new(
        base_url: impl Into<String>,
        config: &ResilienceConfig,
    ) -> Result<Self, BookingsClientError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            resilient: Resilient::new("booking-service", config),
        })
    }

    fn booking_url(&self, booking: BookingId) -> String {
        format!("{}/api/v1/bookings/{booking}", self.base_url)
    }

    async fn fetch_booking(
        &self,
        booking: BookingId,
    ) -> Result<BookingSnapshot, BookingsClientError> {
        let url = self.booking_url(booking);

        debug!(%url, "fetching booking");

        let response = check_status(self.http.get(&url).send().await?).await?;

        Ok(response.json().await?)
    }

    async fn put_confirmed(&self, booking: BookingId) -> Result<(), BookingsClientError> {
        let url = format!("{}/status", self.booking_url(booking));

        debug!(%url, "confirming booking");

        check_status(
            self.http
                .put(&url)
                .json(&json!({ "status": BookingStatus::Confirmed }))
                .send()
                .await?,
        )
        .await?;

        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, BookingsClientError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(BookingsClientError::NotFound);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        return Err(BookingsClientError::UnexpectedResponse {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

#[async_trait]
impl BookingsClient for HttpBookingsClient {
    async fn get_booking(
        &self,
        booking: BookingId,
    ) -> Result<BookingSnapshot, BookingsClientError> {
        self.resilient.call(|| self.fetch_booking(booking)).await
    }

    async fn confirm_booking(&self, booking: BookingId) -> Result<(), BookingsClientError> {
        self.resilient.call(|| self.put_confirmed(booking)).await
    }
}

#[automock]
#[async_trait]
pub trait BookingsClient: Send + Sync {
    async fn get_booking(&self, booking: BookingId) -> Result<BookingSnapshot, BookingsClientError>;

    /// Move the booking to CONFIRMED. Confirming twice succeeds.
    async fn confirm_booking(&self, booking: BookingId) -> Result<(), BookingsClientError>;
}
