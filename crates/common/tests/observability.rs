use metrics_exporter_prometheus::PrometheusBuilder;

use common::config::{General, LogFormat};

// Integration test so it exercises the public API surface
// (`common::observability`) instead of private internals.

#[test]
fn tracing_error_and_warn_counters_increment() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    let general = General {
        log_level: "info".to_string(),
        log_format: LogFormat::Json,
    };

    metrics::with_local_recorder(&recorder, || {
        let (dispatch, _otel_guard) =
            common::observability::build_dispatch("test-service", &general);

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::error!(address = "0xabc", "boom");
            tracing::warn!(endpoint = "balance", "degraded");
        });
    });

    let rendered = handle.render();
    assert!(
        rendered.contains("tracing_error_events"),
        "expected tracing_error_events in rendered metrics, got:\n{rendered}"
    );
    assert!(
        rendered.contains("tracing_warn_events"),
        "expected tracing_warn_events in rendered metrics, got:\n{rendered}"
    );
}

#[test]
fn pretty_format_builds() {
    let general = General {
        log_level: "debug".to_string(),
        log_format: LogFormat::Pretty,
    };
    let (dispatch, _guard) = common::observability::build_dispatch("test-service", &general);
    tracing::dispatcher::with_default(&dispatch, || {
        tracing::info!("hello");
    });
}
