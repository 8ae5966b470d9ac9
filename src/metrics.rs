use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(handle)
}

/// Pre-register counters so they appear even before the first increment.
pub fn register_metrics() {
    counter!("registrations_total").absolute(0);
    counter!("classifications_total").absolute(0);
    counter!("tokens_spent_total").absolute(0);
    counter!("refills_total").absolute(0);
    counter!("auth_failures_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("classify_latency_seconds").record(0.0);
}
