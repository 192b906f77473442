//! App Context

use std::sync::Arc;

use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::{
    auth::{AuthService, JwtAuthService, JwtConfig},
    database::{self, BOOKINGS_MIGRATOR, DatabaseSettings, Db, PAYMENTS_MIGRATOR},
    domain::{
        bookings::{BookingsService, PgBookingsService},
        events::{KafkaConfig, KafkaEventPublisher, OutboxRelay, PublishError, RelayConfig},
        payments::{
            BookingsClientError, HttpBookingsClient, PaymentsService, PgPaymentsService,
            errors::InvalidSecret,
            vnpay::{VnpayConfig, VnpayGateway},
        },
        resources::{HttpResourceCatalog, ResourceCatalogError},
    },
    resilience::ResilienceConfig,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrate(#[source] MigrateError),

    #[error("failed to build resource catalog client")]
    ResourceCatalog(#[source] ResourceCatalogError),

    #[error("failed to build booking service client")]
    BookingsClient(#[source] BookingsClientError),

    #[error("failed to create Kafka producer")]
    Publisher(#[source] PublishError),

    #[error("invalid VNPAY configuration")]
    Gateway(#[source] InvalidSecret),
}

/// Everything the booking service needs to start.
#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub database: DatabaseSettings,
    pub jwt: JwtConfig,
    pub venue_service_url: String,
    pub catalog: ResilienceConfig,
    pub kafka: KafkaConfig,
    pub relay: RelayConfig,
}

#[derive(Clone)]
pub struct BookingAppContext {
    pub bookings: Arc<dyn BookingsService>,
    pub auth: Arc<dyn AuthService>,
    pub relay: OutboxRelay,
}

impl BookingAppContext {
    /// Connect, migrate the bookings schema and build the collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error when the database, the HTTP client or the Kafka
    /// producer can't be set up.
    pub async fn from_settings(settings: &BookingSettings) -> Result<Self, AppInitError> {
        let db = connect_and_migrate(&settings.database, &BOOKINGS_MIGRATOR).await?;

        let catalog = HttpResourceCatalog::new(&settings.venue_service_url, &settings.catalog)
            .map_err(AppInitError::ResourceCatalog)?;

        let publisher =
            KafkaEventPublisher::new(&settings.kafka).map_err(AppInitError::Publisher)?;

        Ok(Self {
            bookings: Arc::new(PgBookingsService::new(db.clone(), Arc::new(catalog))),
            auth: Arc::new(JwtAuthService::new(&settings.jwt)),
            relay: OutboxRelay::new(db, Arc::new(publisher), settings.relay),
        })
    }
}

/// Everything the payment service needs to start.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub database: DatabaseSettings,
    pub booking_service_url: String,
    pub bookings: ResilienceConfig,
    pub vnpay: VnpayConfig,
}

#[derive(Clone)]
pub struct PaymentAppContext {
    pub payments: Arc<dyn PaymentsService>,
    pub gateway: Arc<VnpayGateway>,
}

impl PaymentAppContext {
    /// Connect, migrate the payments schema and build the collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error when the database, the HTTP client or the gateway
    /// signer can't be set up.
    pub async fn from_settings(settings: &PaymentSettings) -> Result<Self, AppInitError> {
        let db = connect_and_migrate(&settings.database, &PAYMENTS_MIGRATOR).await?;

        let bookings = HttpBookingsClient::new(&settings.booking_service_url, &settings.bookings)
            .map_err(AppInitError::BookingsClient)?;

        let gateway =
            Arc::new(VnpayGateway::new(settings.vnpay.clone()).map_err(AppInitError::Gateway)?);

        Ok(Self {
            payments: Arc::new(PgPaymentsService::new(
                db,
                Arc::new(bookings),
                Arc::clone(&gateway),
            )),
            gateway,
        })
    }
}

async fn connect_and_migrate(
    settings: &DatabaseSettings,
    migrator: &sqlx::migrate::Migrator,
) -> Result<Db, AppInitError> {
    let pool = database::connect(settings)
        .await
        .map_err(AppInitError::Database)?;

    database::migrate(&pool, migrator)
        .await
        .map_err(AppInitError::Migrate)?;

    Ok(Db::new(pool))
}
