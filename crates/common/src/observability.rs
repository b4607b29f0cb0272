use std::borrow::Cow;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{General, LogFormat};

/// Flushes the global tracer provider on drop.
pub struct OtelGuard {
    _private: (),
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

struct ErrorCounterLayer;

impl<S> Layer<S> for ErrorCounterLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level == tracing::Level::ERROR {
            metrics::counter!("tracing_error_events").increment(1);
        } else if level == tracing::Level::WARN {
            metrics::counter!("tracing_warn_events").increment(1);
        }
    }
}

/// Log output layer. Always stderr: stdout belongs to CLI reports.
fn fmt_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    match format {
        LogFormat::Json => base
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .json()
            .boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
    }
}

/// Build a `tracing` dispatcher configured for:
/// - JSON or pretty logs to stderr, per `general.log_format`
/// - EnvFilter that respects `RUST_LOG` (takes precedence) and falls back to `general.log_level`
/// - `tracing_error_events` / `tracing_warn_events` counters
/// - Optional OpenTelemetry OTLP trace export when `OTEL_EXPORTER_OTLP_ENDPOINT` is set
pub fn build_dispatch(
    service_name: impl Into<Cow<'static, str>>,
    general: &General,
) -> (tracing::Dispatch, Option<OtelGuard>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&general.log_level));

    let service_name = service_name.into();

    let otel_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

    let Some(endpoint) = otel_endpoint else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer(general.log_format))
            .with(ErrorCounterLayer);
        return (tracing::Dispatch::new(subscriber), None);
    };

    use opentelemetry_otlp::WithExportConfig;

    let Ok(exporter) = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
    else {
        // Exporter misconfigured: keep logs and metrics.
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer(general.log_format))
            .with(ErrorCounterLayer);
        return (tracing::Dispatch::new(subscriber), None);
    };

    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        service_name.to_string(),
    )]);

    // Batch export needs a Tokio runtime; the binary is `#[tokio::main]`.
    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(resource)
        .build();

    let tracer = provider.tracer("rank_checker");
    let _ = opentelemetry::global::set_tracer_provider(provider);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer(general.log_format))
        .with(ErrorCounterLayer)
        .with(tracing_opentelemetry::layer().with_tracer(tracer));

    (
        tracing::Dispatch::new(subscriber),
        Some(OtelGuard { _private: () }),
    )
}
