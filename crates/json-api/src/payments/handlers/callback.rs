//! Gateway Callback Handler

use std::{collections::BTreeMap, sync::Arc};

use salvo::{http::header::LOCATION, prelude::*};
use tracing::warn;

use crate::{extensions::*, payments::errors::into_status_error, state::PaymentState};

/// Gateway Callback Handler
///
/// The payer's browser lands here after paying. The query string is signed by
/// the gateway and checked before anything is recorded.
#[endpoint(
    tags("payments"),
    summary = "VNPAY Return",
    responses(
        (status_code = StatusCode::FOUND, description = "Redirect to the merchant landing page"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid signature or payment failed"),
        (status_code = StatusCode::NOT_FOUND, description = "Payment transaction not found"),
        (status_code = StatusCode::CONFLICT, description = "Booking already paid by another transaction"),
    ),
)]
#[tracing::instrument(name = "payments.callback", skip(req, depot, res), err)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), StatusError> {
    let state = depot.obtain_or_500::<Arc<PaymentState>>()?;

    let params: BTreeMap<String, String> = req
        .queries()
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if let Err(error) = state.gateway.verify(&params) {
        warn!("rejected gateway callback: {error}");

        return Err(StatusError::bad_request().brief("invalid signature"));
    }

    let redirect = state
        .payments
        .handle_return(&params)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, redirect, true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::FOUND);

    Ok(())
}
