//! Correlation headers carried across the booking and payment services.

use opentelemetry::{Context, global, propagation::Extractor, trace::TraceContextExt as _};
use salvo::{
    http::{HeaderMap, HeaderName, header::HeaderValue},
    prelude::Response,
};
use tracing::debug;
use uuid::Uuid;

pub(super) const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request id that is trusted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuse the caller's request id when it is safe to log and echo, otherwise
/// mint a UUID v7.
pub(super) fn request_id(headers: &HeaderMap) -> String {
    let inbound = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim);

    match inbound {
        Some(id) if is_loggable(id) => id.to_owned(),
        Some(rejected) => {
            debug!(len = rejected.len(), "replacing unusable inbound request id");

            Uuid::now_v7().to_string()
        }
        None => Uuid::now_v7().to_string(),
    }
}

fn is_loggable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|byte| byte.is_ascii_graphic())
}

pub(super) fn echo_request_id(res: &mut Response, request_id: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
}

/// W3C trace context sent by an upstream service, if it carries a valid span.
pub(super) fn parent_context(headers: &HeaderMap) -> Option<Context> {
    global::get_text_map_propagator(|propagator| {
        // A fresh base keeps requests without trace headers off the current span chain.
        let context = propagator.extract_with_context(&Context::new(), &Headers(headers));

        context
            .span()
            .span_context()
            .is_valid()
            .then_some(context)
    })
}

struct Headers<'a>(&'a HeaderMap);

impl Extractor for Headers<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}
