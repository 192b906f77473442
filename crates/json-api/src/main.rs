//! Cowork JSON API Server

use std::process;

use salvo::{
    affix_state::inject,
    oapi::{
        OpenApi,
        security::{Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::*,
    trailing_slash::remove_slash,
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info};

use cowork_app::context::{BookingAppContext, PaymentAppContext};

use crate::{
    config::{ServerConfig, ServiceCommand},
    healthcheck::ServiceIdentity,
    observability::{Observability, metrics_handler, request_logging},
    state::{BookingState, PaymentState},
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod auth;
mod bookings;
mod config;
mod extensions;
mod healthcheck;
mod observability;
mod payments;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;

/// Cowork JSON API Server entry point
#[tokio::main]
pub async fn main() {
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        exit_with_failure()
    });

    let service = match &config.service {
        ServiceCommand::Booking(_) => "booking",
        ServiceCommand::Payment(_) => "payment",
    };

    let observability = Observability::init(&config, service).unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "subscriber failed to install, stderr is the only sink left"
        )]
        {
            eprintln!("Observability error: {e}");
        }

        exit_with_failure()
    });

    let addr = config.service.socket_addr();

    let (stop_background, background_stopped) = watch::channel(false);

    let (api, relay) = match &config.service {
        ServiceCommand::Booking(booking) => {
            let app = match BookingAppContext::from_settings(&booking.settings()).await {
                Ok(app) => app,
                Err(init_error) => {
                    error!(error = ?init_error, "failed to initialize booking service");

                    exit_with_failure()
                }
            };

            let relay = tokio::spawn(app.relay.clone().run(background_stopped));

            (
                Router::new()
                    .hoop(inject(BookingState::from_app_context(&app)))
                    .push(router::booking_router()),
                Some(relay),
            )
        }
        ServiceCommand::Payment(payment) => {
            let app = match PaymentAppContext::from_settings(&payment.settings()).await {
                Ok(app) => app,
                Err(init_error) => {
                    error!(error = ?init_error, "failed to initialize payment service");

                    exit_with_failure()
                }
            };

            (
                Router::new()
                    .hoop(inject(PaymentState::from_app_context(app)))
                    .push(router::payment_router()),
                None,
            )
        }
    };

    info!(service, "Starting server on {addr}");

    let listener = TcpListener::new(addr).bind().await;

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(request_logging)
        .hoop(inject(ServiceIdentity { service }))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(metrics_handler))
        .push(api);

    let doc = OpenApi::new("Cowork API", env!("CARGO_PKG_VERSION"))
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
        .merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, stop_background).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    server.serve(router).await;

    wait_for_relay(relay).await;

    observability.shutdown();
}

async fn wait_for_relay(relay: Option<JoinHandle<()>>) {
    let Some(relay) = relay else {
        return;
    };

    if let Err(join_error) = relay.await {
        error!(error = %join_error, "outbox relay task failed");
    }
}

#[expect(clippy::exit, reason = "startup failures end the process")]
fn exit_with_failure() -> ! {
    process::exit(1)
}
