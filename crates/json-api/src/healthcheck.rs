//! Healthcheck Handler

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

/// Which service answered, injected once the subcommand is known.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ServiceIdentity {
    /// Subcommand name, `booking` or `payment`.
    pub(crate) service: &'static str,
}

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service that answered, absent before the subcommand is injected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Build version
    pub version: String,
}

/// Healthcheck handler
///
/// Liveness only; the database and gateways are not contacted.
#[endpoint(tags("health"), summary = "Health check endpoint")]
pub(crate) async fn handler(depot: &mut Depot) -> Json<HealthResponse> {
    let service = depot
        .obtain::<ServiceIdentity>()
        .ok()
        .map(|identity| identity.service.to_owned());

    Json(HealthResponse {
        status: "ok".to_owned(),
        service,
        version: env!("CARGO_PKG_VERSION").to_owned(),
    })
}
