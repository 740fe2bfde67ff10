use std::collections::HashMap;

use opentelemetry::trace::TracerProvider as TracerProviderTrait;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the OTLP pipeline alive; flushes and shuts it down on drop.
#[derive(Default)]
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    pub fn otlp_enabled(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("failed to shut down OTLP exporter: {err}");
            }
        }
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn fmt_layer<S>() -> tracing_subscriber::fmt::Layer<S> {
    tracing_subscriber::fmt::layer().with_target(false)
}

/// Console logging only. A subscriber installed earlier wins.
fn init_console() -> TelemetryGuard {
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt_layer())
        .try_init();
    TelemetryGuard::default()
}

/// Bearer auth header for the collector; blank tokens send nothing.
fn otlp_headers(token: Option<&str>) -> HashMap<String, String> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| HashMap::from([("Authorization".to_string(), format!("Bearer {t}"))]))
        .unwrap_or_default()
}

fn resource(service_name: &str) -> Resource {
    Resource::new([
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        KeyValue::new("hub.sdk", "rust"),
    ])
}

/// Install the global tracing subscriber.
///
/// Filtering comes from `RUST_LOG` (default `info`). When `otlp_endpoint` is
/// set, spans are also exported over OTLP/HTTP with `otlp_token` as a bearer
/// token. Must be called from inside a Tokio runtime when exporting.
pub fn init_tracing(
    service_name: &str,
    otlp_endpoint: Option<&str>,
    otlp_token: Option<&str>,
) -> TelemetryGuard {
    let Some(endpoint) = otlp_endpoint.filter(|e| !e.is_empty()) else {
        return init_console();
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .with_headers(otlp_headers(otlp_token))
        .build();
    let exporter = match exporter {
        Ok(exporter) => exporter,
        Err(err) => {
            eprintln!("OTLP export to {endpoint} disabled: {err}");
            return init_console();
        }
    };

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(resource(service_name))
        .build();
    let otel_layer =
        tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_string()));

    if tracing_subscriber::registry()
        .with(filter())
        .with(fmt_layer())
        .with(otel_layer)
        .try_init()
        .is_err()
    {
        eprintln!("tracing already initialized, OTLP export to {endpoint} not installed");
        return TelemetryGuard::default();
    }

    tracing::info!(endpoint, service_name, "OTLP tracing enabled");
    TelemetryGuard {
        provider: Some(provider),
    }
}
