//! Server configuration module

use std::net::SocketAddr;

use clap::{Parser, Subcommand};

use crate::config::{
    booking::BookingServiceConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    payment::PaymentServiceConfig,
};

pub(crate) mod booking;
pub(crate) mod observability;
pub(crate) mod payment;
pub(crate) mod runtime;
pub(crate) mod upstream;

/// Cowork JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "cowork-json", about = "Cowork booking and payment JSON API", long_about = None)]
pub struct ServerConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Which service this process runs.
    #[command(subcommand)]
    pub service: ServiceCommand,
}

/// Services served by the binary.
#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    /// Booking lifecycle, availability and the outbox relay.
    Booking(BookingServiceConfig),

    /// VNPAY payment URLs and gateway callbacks.
    Payment(PaymentServiceConfig),
}

impl ServiceCommand {
    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        match self {
            Self::Booking(config) => config.runtime.socket_addr(),
            Self::Payment(config) => config.runtime.socket_addr(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;

    use super::*;

    #[test]
    fn booking_subcommand_builds_settings() -> TestResult {
        let config = ServerConfig::try_parse_from([
            "cowork-json",
            "booking",
            "--port",
            "9000",
            "--database-url",
            "postgres://localhost/bookings",
            "--secret-key",
            "jwt-secret",
            "--jwt-issuer",
            "cowork-auth",
            "--venue-service-url",
            "http://venue:8080",
            "--kafka-brokers",
            "kafka:9092",
        ])?;

        let ServiceCommand::Booking(booking) = &config.service else {
            return Err("expected the booking subcommand".into());
        };

        assert_eq!(config.service.socket_addr().to_string(), "0.0.0.0:9000");

        let settings = booking.settings();

        assert_eq!(settings.venue_service_url, "http://venue:8080");
        assert_eq!(settings.jwt.issuer, "cowork-auth");
        assert_eq!(settings.kafka.topic, "notification-events");
        assert_eq!(settings.catalog.timeout, Duration::from_secs(5));
        assert_eq!(settings.relay.batch_size, 100);

        Ok(())
    }

    #[test]
    fn payment_subcommand_requires_gateway_credentials() {
        let result = ServerConfig::try_parse_from([
            "cowork-json",
            "payment",
            "--database-url",
            "postgres://localhost/payments",
            "--booking-service-url",
            "http://booking:8080",
        ]);

        assert!(result.is_err(), "VNPAY settings are mandatory");
    }

    #[test]
    fn payment_subcommand_defaults_expiry_to_fifteen_minutes() -> TestResult {
        let config = ServerConfig::try_parse_from([
            "cowork-json",
            "payment",
            "--database-url",
            "postgres://localhost/payments",
            "--booking-service-url",
            "http://booking:8080",
            "--vnp-tmncode",
            "TMN",
            "--vnp-hashsecret",
            "secret",
            "--vnp-url",
            "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html",
            "--vnp-return-url",
            "https://cowork.example/payments/done",
        ])?;

        let ServiceCommand::Payment(payment) = &config.service else {
            return Err("expected the payment subcommand".into());
        };

        let settings = payment.settings();

        assert_eq!(settings.vnpay.expiry, jiff::SignedDuration::from_mins(15));
        assert_eq!(settings.vnpay.tmn_code, "TMN");
        assert_eq!(settings.booking_service_url, "http://booking:8080");

        Ok(())
    }
}
