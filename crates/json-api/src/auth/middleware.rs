//! Auth middleware.

use std::sync::Arc;

use cowork_app::auth::AuthServiceError;
use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::{debug, warn};

use crate::{extensions::*, state::BookingState};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(token) = extract_bearer_token(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid Authorization header"));

        return;
    };

    let state = match depot.obtain::<Arc<BookingState>>() {
        Ok(state) => state,
        Err(_error) => {
            res.render(StatusError::internal_server_error());

            return;
        }
    };

    let principal = match state.auth.authenticate_bearer(token).await {
        Ok(principal) => principal,
        Err(AuthServiceError::InvalidToken(source)) => {
            debug!("rejected access token: {source}");

            res.render(StatusError::unauthorized().brief("Invalid or expired token"));

            return;
        }
        Err(error @ (AuthServiceError::Inactive | AuthServiceError::NotVerified)) => {
            warn!("refused authenticated caller: {error}");

            res.render(StatusError::forbidden().brief(error.to_string()));

            return;
        }
    };

    depot.insert_principal(principal);

    ctrl.call_next(req, depot, res).await;
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}
