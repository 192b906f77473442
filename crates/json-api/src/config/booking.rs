//! Booking Service Config

use std::time::Duration;

use clap::Args;

use cowork_app::{
    auth::JwtConfig,
    context::BookingSettings,
    domain::events::{KafkaConfig, RelayConfig},
};

use crate::config::{runtime::ServiceRuntimeConfig, upstream::UpstreamPolicyConfig};

/// `booking` subcommand settings.
#[derive(Debug, Args)]
pub struct BookingServiceConfig {
    /// Listener and bookings database settings.
    #[command(flatten)]
    pub runtime: ServiceRuntimeConfig,

    /// Access token verification settings.
    #[command(flatten)]
    pub jwt: JwtArgs,

    /// Venue service (resource catalog) settings.
    #[command(flatten)]
    pub catalog: ResourceCatalogConfig,

    /// Event channel settings.
    #[command(flatten)]
    pub events: EventsConfig,
}

/// Access token verification settings.
#[derive(Debug, Args)]
pub struct JwtArgs {
    /// HS256 secret shared with the auth service
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Expected `iss` claim
    #[arg(long, env = "JWT_ISSUER")]
    pub jwt_issuer: String,
}

/// Venue service (resource catalog) settings.
#[derive(Debug, Args)]
pub struct ResourceCatalogConfig {
    /// Venue service base URL
    #[arg(long, env = "VENUE_SERVICE_URL")]
    pub venue_service_url: String,

    /// Per-request deadline for venue service calls
    #[arg(long, env = "VENUE_SERVICE_TIMEOUT_MS", default_value_t = 5_000_u64)]
    pub venue_service_timeout_ms: u64,

    #[command(flatten)]
    pub policy: UpstreamPolicyConfig,
}

/// Kafka and outbox relay settings.
#[derive(Debug, Args)]
pub struct EventsConfig {
    /// Comma separated Kafka bootstrap servers
    #[arg(long, env = "KAFKA_BROKERS")]
    pub kafka_brokers: String,

    /// Topic booking notifications are published to
    #[arg(
        long,
        env = "KAFKA_TOPIC_NOTIFICATION_EVENTS",
        default_value = "notification-events"
    )]
    pub kafka_topic: String,

    /// Delivery timeout for a single Kafka message
    #[arg(long, env = "KAFKA_MESSAGE_TIMEOUT_MS", default_value_t = 5_000_u64)]
    pub kafka_message_timeout_ms: u64,

    /// How often the relay polls the outbox
    #[arg(long, env = "OUTBOX_POLL_INTERVAL_MS", default_value_t = 1_000_u64)]
    pub outbox_poll_interval_ms: u64,

    /// Events claimed per poll
    #[arg(long, env = "OUTBOX_BATCH_SIZE", default_value_t = 100_i64)]
    pub outbox_batch_size: i64,

    /// Publish attempts before an event is left for inspection
    #[arg(long, env = "OUTBOX_MAX_ATTEMPTS", default_value_t = 10_i32)]
    pub outbox_max_attempts: i32,
}

impl BookingServiceConfig {
    #[must_use]
    pub fn settings(&self) -> BookingSettings {
        BookingSettings {
            database: self.runtime.database(),
            jwt: JwtConfig {
                secret: self.jwt.secret_key.clone(),
                issuer: self.jwt.jwt_issuer.clone(),
            },
            venue_service_url: self.catalog.venue_service_url.clone(),
            catalog: self
                .catalog
                .policy
                .resilience(self.catalog.venue_service_timeout_ms),
            kafka: KafkaConfig {
                brokers: self.events.kafka_brokers.clone(),
                topic: self.events.kafka_topic.clone(),
                timeout: Duration::from_millis(self.events.kafka_message_timeout_ms),
            },
            relay: RelayConfig {
                poll_interval: Duration::from_millis(self.events.outbox_poll_interval_ms),
                batch_size: self.events.outbox_batch_size,
                max_attempts: self.events.outbox_max_attempts,
            },
        }
    }
}
