//! Tracing subscriber and telemetry lifecycle management.

use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::SdkTracerProvider};
use tracing::error;
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{
    ServerConfig,
    observability::{LogFormat, LoggingConfig},
};

use super::{ObservabilityError, otel, settings};

/// Runtime observability state.
#[derive(Debug)]
pub(crate) struct Observability {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Observability {
    /// Initialize structured logging and optional OpenTelemetry export for
    /// the named service.
    pub(crate) fn init(config: &ServerConfig, service: &str) -> Result<Self, ObservabilityError> {
        let observability = &config.observability;

        settings::install(observability);

        let tracer_provider = if observability.otel_enabled {
            global::set_text_map_propagator(TraceContextPropagator::new());
            Some(otel::build_tracer_provider(observability, service)?)
        } else {
            None
        };

        let tracer_name = observability.service_name(service);

        match config.logging.log_format {
            LogFormat::Compact => init_subscriber(
                &config.logging,
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
                tracer_provider.as_ref().map(|provider| (provider, tracer_name)),
            )?,
            LogFormat::Json => init_subscriber(
                &config.logging,
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
                tracer_provider.as_ref().map(|provider| (provider, tracer_name)),
            )?,
        }

        Ok(Self { tracer_provider })
    }

    /// Flush and shutdown telemetry pipelines.
    pub(crate) fn shutdown(self) {
        let Some(provider) = self.tracer_provider else {
            return;
        };

        if let Err(source) = provider.shutdown() {
            error!("failed to shutdown tracer provider: {source}");
        }
    }
}

fn build_env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},h2=warn,hyper=warn,tower=warn,tonic=warn,rdkafka=warn,sqlx=warn,opentelemetry=warn",
            logging.log_level
        ))
    })
}

fn init_subscriber<L>(
    logging: &LoggingConfig,
    fmt_layer: L,
    tracer: Option<(&SdkTracerProvider, String)>,
) -> Result<(), ObservabilityError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(build_env_filter(logging));

    if let Some((provider, name)) = tracer {
        subscriber
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer(name)))
            .try_init()?;
    } else {
        subscriber.try_init()?;
    }

    Ok(())
}
