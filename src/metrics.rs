use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("ticks_total").absolute(0);
    counter!("events_fired_total").absolute(0);
    counter!("positions_opened_total").absolute(0);
    counter!("positions_closed_total").absolute(0);
    counter!("liquidations_total").absolute(0);
    counter!("snapshot_errors_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("balance").set(0.0);
    gauge!("open_positions").set(0.0);
    gauge!("total_pnl").set(0.0);

    handle
}
