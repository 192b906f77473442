//! Booking Index Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    bookings::{errors::into_status_error, handlers::BookingResponse},
    extensions::*,
    state::BookingState,
};

/// Booking Index Handler
///
/// Returns every booking, newest first. Staff only.
#[endpoint(
    tags("bookings"),
    summary = "List Bookings",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<Vec<BookingResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<BookingState>>()?;

    let bookings = state
        .bookings
        .list_bookings()
        .await
        .map_err(into_status_error)?;

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}
