//! Request telemetry knobs resolved once at startup.

use std::{sync::OnceLock, time::Duration};

use tracing::debug;

use crate::config::observability::ObservabilityConfig;

static REQUEST_TELEMETRY: OnceLock<RequestTelemetry> = OnceLock::new();

/// How the request middleware reports on each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct RequestTelemetry {
    /// Requests slower than this are logged at `warn`.
    pub(super) slow_request_threshold: Duration,

    /// Continue the caller's trace from an incoming `traceparent` header.
    pub(super) trust_parent_context: bool,
}

impl Default for RequestTelemetry {
    fn default() -> Self {
        Self {
            slow_request_threshold: Duration::from_secs(1),
            trust_parent_context: false,
        }
    }
}

impl RequestTelemetry {
    fn from_config(config: &ObservabilityConfig) -> Self {
        Self {
            slow_request_threshold: Duration::from_millis(config.slow_request_threshold_ms),
            // A parent context only means something when spans are exported.
            trust_parent_context: config.otel_enabled && config.otel_parent_propagation_enabled,
        }
    }
}

pub(super) fn install(config: &ObservabilityConfig) {
    if REQUEST_TELEMETRY
        .set(RequestTelemetry::from_config(config))
        .is_err()
    {
        debug!("request telemetry already installed, keeping the first settings");
    }
}

pub(super) fn current() -> RequestTelemetry {
    REQUEST_TELEMETRY.get().copied().unwrap_or_default()
}
