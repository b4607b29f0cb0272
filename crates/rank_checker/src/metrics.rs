use anyhow::Result;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

pub fn describe() {
    describe_counter!(
        "rank_checker_api_requests_total",
        "Explorer API requests by endpoint, transport and outcome."
    );
    describe_histogram!(
        "rank_checker_api_latency_ms",
        "Explorer API request latency in milliseconds."
    );
    describe_counter!(
        "rank_checker_api_errors_total",
        "Explorer API failures by endpoint and error kind."
    );
    describe_counter!(
        "rank_checker_fallback_attempts_total",
        "Fetch attempts per endpoint and transport, including retries."
    );
    describe_counter!(
        "rank_checker_fallback_source_total",
        "Which source finally supplied each account field."
    );
    describe_counter!(
        "rank_checker_cache_hits_total",
        "Rank checks answered from the record cache."
    );
    describe_counter!(
        "rank_checker_checks_total",
        "Completed rank checks by resulting tier."
    );
}

/// Installs the global recorder and spawns the scrape listener. Needs a
/// running tokio runtime.
pub fn install_prometheus(port: u16) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prometheus_handle_renders_metric_names() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe();
            metrics::counter!("rank_checker_checks_total", "tier" => "Veteran").increment(1);
            metrics::counter!("rank_checker_cache_hits_total").increment(2);
        });

        let rendered = handle.render();
        assert!(rendered.contains("rank_checker_checks_total"));
        assert!(rendered.contains("tier=\"Veteran\""));
        assert!(rendered.contains("rank_checker_cache_hits_total 2"));
    }
}
