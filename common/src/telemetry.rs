// Telemetry module for structured logging, metrics, and tracing

use crate::errors::DatabaseError;
use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SERVICE_NAME: &str = "lightbnb";

/// Initialize structured logging with JSON formatting and trace context
///
/// `RUST_LOG` overrides `log_level` when set. When `tracing_endpoint` is
/// given, spans are also exported over OTLP.
#[tracing::instrument(skip_all)]
pub fn init_logging(log_level: &str, tracing_endpoint: Option<&str>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    let registry = tracing_subscriber::registry().with(json_layer);

    if let Some(endpoint) = tracing_endpoint {
        let tracer = init_tracer(endpoint)?;
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        registry
            .with(telemetry_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    } else {
        registry
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    }

    tracing::info!(
        log_level = log_level,
        tracing_endpoint = tracing_endpoint,
        "Structured logging initialized"
    );

    Ok(())
}

/// Initialize OpenTelemetry tracer with OTLP exporter
#[tracing::instrument(skip_all)]
fn init_tracer(endpoint: &str) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry_sdk::runtime::Tokio;

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("Failed to build span exporter: {}", e))?;

    let tracer_provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", SERVICE_NAME),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .build();

    global::set_tracer_provider(tracer_provider.clone());
    let tracer = tracer_provider.tracer(SERVICE_NAME);

    tracing::info!(endpoint = endpoint, "OpenTelemetry tracer initialized");

    Ok(tracer)
}

/// Flush remaining spans; call on shutdown
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}

/// Install the Prometheus exporter and describe the query metrics
#[tracing::instrument(skip_all)]
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!(
        "db_queries_total",
        "Total number of data-access queries by operation and outcome"
    );
    describe_histogram!(
        "db_query_duration_seconds",
        "Round-trip duration of data-access queries in seconds"
    );

    tracing::info!(metrics_port = metrics_port, "Prometheus metrics exporter initialized");

    Ok(())
}

/// Metric label for a query result: `ok` or the error kind
pub fn outcome_label<T>(result: &Result<T, DatabaseError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}

/// Record one query round trip
#[inline]
pub fn record_query(operation: &'static str, elapsed: Duration, outcome: &'static str) {
    counter!("db_queries_total", "operation" => operation, "outcome" => outcome).increment(1);
    histogram!("db_query_duration_seconds", "operation" => operation).record(elapsed.as_secs_f64());
}
