//! My Bookings Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    bookings::{errors::into_status_error, handlers::BookingResponse},
    extensions::*,
    state::BookingState,
};

/// My Bookings Handler
///
/// Returns the caller's bookings, newest first.
#[endpoint(
    tags("bookings"),
    summary = "List My Bookings",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<Vec<BookingResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<BookingState>>()?;
    let user_id = depot.principal_or_401()?.user_id;

    let bookings = state
        .bookings
        .list_user_bookings(user_id)
        .await
        .map_err(into_status_error)?;

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}
