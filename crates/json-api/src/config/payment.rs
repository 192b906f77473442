//! Payment Service Config

use clap::Args;
use jiff::SignedDuration;

use cowork_app::{context::PaymentSettings, domain::payments::vnpay::VnpayConfig};

use crate::config::{runtime::ServiceRuntimeConfig, upstream::UpstreamPolicyConfig};

/// `payment` subcommand settings.
#[derive(Debug, Args)]
pub struct PaymentServiceConfig {
    /// Listener and payments database settings.
    #[command(flatten)]
    pub runtime: ServiceRuntimeConfig,

    /// VNPAY merchant settings.
    #[command(flatten)]
    pub vnpay: VnpayArgs,

    /// Booking service settings.
    #[command(flatten)]
    pub bookings: BookingServiceClientConfig,
}

/// VNPAY merchant settings.
#[derive(Debug, Args)]
pub struct VnpayArgs {
    /// Merchant terminal code
    #[arg(long = "vnp-tmncode", env = "VNP_TMNCODE")]
    pub tmn_code: String,

    /// HMAC-SHA512 secret shared with the gateway
    #[arg(long = "vnp-hashsecret", env = "VNP_HASHSECRET", hide_env_values = true)]
    pub hash_secret: String,

    /// Gateway payment page
    #[arg(long = "vnp-url", env = "VNP_URL")]
    pub pay_url: String,

    /// Page the gateway sends the payer back to
    #[arg(long = "vnp-return-url", env = "VNP_RETURN_URL")]
    pub return_url: String,

    /// Minutes a payment URL stays valid
    #[arg(long = "vnp-expiry-minutes", env = "VNP_EXPIRY_MINUTES", default_value_t = 15_i64)]
    pub expiry_minutes: i64,
}

/// Booking service settings.
#[derive(Debug, Args)]
pub struct BookingServiceClientConfig {
    /// Booking service base URL
    #[arg(long, env = "BOOKING_SERVICE_URL")]
    pub booking_service_url: String,

    /// Per-request deadline for booking service calls
    #[arg(long, env = "BOOKING_SERVICE_TIMEOUT_MS", default_value_t = 5_000_u64)]
    pub booking_service_timeout_ms: u64,

    #[command(flatten)]
    pub policy: UpstreamPolicyConfig,
}

impl PaymentServiceConfig {
    #[must_use]
    pub fn settings(&self) -> PaymentSettings {
        PaymentSettings {
            database: self.runtime.database(),
            booking_service_url: self.bookings.booking_service_url.clone(),
            bookings: self
                .bookings
                .policy
                .resilience(self.bookings.booking_service_timeout_ms),
            vnpay: VnpayConfig {
                tmn_code: self.vnpay.tmn_code.clone(),
                hash_secret: self.vnpay.hash_secret.clone(),
                pay_url: self.vnpay.pay_url.clone(),
                return_url: self.vnpay.return_url.clone(),
                expiry: SignedDuration::from_mins(self.vnpay.expiry_minutes),
            },
        }
    }
}
