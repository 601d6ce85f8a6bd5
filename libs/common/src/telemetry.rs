//! Logging and tracing bootstrap shared by every binary in the workspace.
//!
//! Copied down from the reference operator's `telemetry` module so the
//! scheduler, dispatcher and worker binaries initialise `tracing` and the
//! optional OpenTelemetry OTLP pipeline exactly the same way the operator
//! does, instead of each growing its own variant.

use std::time::Duration;

use opentelemetry::trace::{TraceError, TraceId, TracerProvider};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{self, RandomIdGenerator, Sampler};
use opentelemetry_sdk::Resource;
use serde::Serialize;
use thiserror::Error;
use tracing::dispatcher::SetGlobalDefaultError;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

#[derive(Error, Debug)]
pub enum Error {
    #[error("TraceError: {0}")]
    TraceError(#[source] TraceError),
    #[error("SetGlobalDefaultError: {0}")]
    SetGlobalDefaultError(#[source] SetGlobalDefaultError),
}

/// Fetches the current `opentelemetry::trace::TraceId` as a hexadecimal string,
/// by traversing the tracing stack from the current span to its OpenTelemetry context.
pub fn get_trace_id() -> TraceId {
    use opentelemetry::trace::TraceContextExt as _;
    use tracing_opentelemetry::OpenTelemetrySpanExt as _;

    tracing::Span::current()
        .context()
        .span()
        .span_context()
        .trace_id()
}

#[derive(clap::ValueEnum, Clone, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

/// Initializes logging and tracing for the calling process. `service_name` is
/// attached as the `service.name` OpenTelemetry resource attribute so traces
/// from the scheduler, dispatcher and worker are distinguishable in one backend.
pub async fn init(
    service_name: &'static str,
    log_filter: &str,
    log_format: LogFormat,
    tracing_url: Option<&str>,
    trace_ratio: f64,
) -> Result<(), Error> {
    let logger = match log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().compact().boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    let filter = EnvFilter::new(log_filter);

    let collector = Registry::default().with(logger).with(filter);

    if let Some(url) = tracing_url {
        let provider = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(url)
                    .with_timeout(Duration::from_secs(3)),
            )
            .with_trace_config(
                trace::Config::default()
                    .with_sampler(Sampler::TraceIdRatioBased(trace_ratio))
                    .with_id_generator(RandomIdGenerator::default())
                    .with_max_events_per_span(64)
                    .with_max_attributes_per_span(16)
                    .with_resource(Resource::new(vec![KeyValue::new(
                        "service.name",
                        service_name,
                    )])),
            )
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .map_err(Error::TraceError)?;
        let tracer = provider
            .tracer_builder("opentelemetry-otlp")
            .with_version(env!("CARGO_PKG_VERSION"))
            .build();

        let telemetry = OpenTelemetryLayer::new(tracer);
        tracing::subscriber::set_global_default(collector.with(telemetry))
            .map_err(Error::SetGlobalDefaultError)
    } else {
        tracing::subscriber::set_global_default(collector).map_err(Error::SetGlobalDefaultError)
    }
}
