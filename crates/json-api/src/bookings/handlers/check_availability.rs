//! Check Availability Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use cowork_app::domain::resources::models::ResourceId;

use crate::{bookings::errors::into_status_error, extensions::*, state::BookingState};

/// Check Availability Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckAvailabilityRequest {
    /// Candidate resources
    #[serde(alias = "space_ids")]
    pub resource_ids: Vec<i64>,

    pub start_time: String,

    pub end_time: String,
}

/// Check Availability Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckAvailabilityResponse {
    /// Requested resources holding a confirmed overlapping booking, ascending
    pub unavailable_resource_ids: Vec<i64>,

    /// Same ids, under the name the venue service reads
    pub unavailable_space_ids: Vec<i64>,
}

/// Check Availability Handler
///
/// Internal endpoint used by the venue service to filter its search results.
#[endpoint(
    tags("internal"),
    summary = "Check Availability",
    responses(
        (status_code = StatusCode::OK, description = "Unavailable resources"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CheckAvailabilityRequest>,
    depot: &mut Depot,
) -> Result<Json<CheckAvailabilityResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<BookingState>>()?;
    let request = json.into_inner();

    let start_time = request
        .start_time
        .parse::<Timestamp>()
        .or_400("start_time must be an RFC 3339 timestamp")?;

    let end_time = request
        .end_time
        .parse::<Timestamp>()
        .or_400("end_time must be an RFC 3339 timestamp")?;

    let resources: Vec<ResourceId> = request
        .resource_ids
        .into_iter()
        .map(ResourceId::new)
        .collect();

    let unavailable: Vec<i64> = state
        .bookings
        .check_availability(&resources, start_time, end_time)
        .await
        .map_err(into_status_error)?
        .into_iter()
        .map(i64::from)
        .collect();

    Ok(Json(CheckAvailabilityResponse {
        unavailable_space_ids: unavailable.clone(),
        unavailable_resource_ids: unavailable,
    }))
}
