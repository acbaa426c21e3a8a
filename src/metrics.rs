use lazy_static::lazy_static;
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::time::Duration;

/// Metric name prefix for all worker loop metrics
const PREFIX: &str = "worker";

lazy_static! {
    // Registry for the worker metrics; hosts expose it on their own
    // metrics endpoint
    pub static ref REGISTRY: Registry = Registry::new();

    // Iteration Metrics
    pub static ref ITERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_iterations_total"), "Total iterations by outcome"),
        &["worker", "kind", "status"]
    ).expect("Failed to create iterations_total metric");

    pub static ref ITERATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_iteration_duration_seconds"),
            "Iteration run duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0]),
        &["worker", "kind"]
    ).expect("Failed to create iteration_duration_seconds metric");

    // Worker Lifecycle Metrics
    pub static ref WORKER_RUNNING: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_running"), "Whether a worker loop is currently running"),
        &["worker", "kind"]
    ).expect("Failed to create running metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(ITERATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ITERATION_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(WORKER_RUNNING.clone()));

    tracing::info!("Worker metrics initialized");
}

/// Record one finished iteration with its outcome status
pub fn record_iteration(worker: &str, kind: &str, status: &str, duration: Duration) {
    ITERATIONS_TOTAL
        .with_label_values(&[worker, kind, status])
        .inc();

    ITERATION_DURATION_SECONDS
        .with_label_values(&[worker, kind])
        .observe(duration.as_secs_f64());
}

/// Flag a worker loop as running or stopped
pub fn set_worker_running(worker: &str, kind: &str, running: bool) {
    WORKER_RUNNING
        .with_label_values(&[worker, kind])
        .set(if running { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        // This test ensures metrics can be initialized without panic
        init_metrics();

        // Verify we can gather metrics
        let metric_families = REGISTRY.gather();
        assert!(!metric_families.is_empty(), "Metrics should be registered");
    }

    #[test]
    fn test_record_iteration() {
        // Ensure metrics are initialized
        init_metrics();

        record_iteration("pruner", "periodic", "success", Duration::from_millis(50));
        record_iteration("pruner", "periodic", "failed", Duration::from_millis(5));

        // Verify the counter was incremented
        let metrics = REGISTRY.gather();
        let iteration_metrics = metrics
            .iter()
            .find(|m| m.get_name() == "worker_iterations_total");

        assert!(iteration_metrics.is_some(), "Iteration metrics should exist");
    }

    #[test]
    fn test_set_worker_running() {
        // Ensure metrics are initialized
        init_metrics();

        set_worker_running("gauge-probe", "continuous", true);
        assert_eq!(
            WORKER_RUNNING
                .with_label_values(&["gauge-probe", "continuous"])
                .get(),
            1.0
        );

        set_worker_running("gauge-probe", "continuous", false);
        assert_eq!(
            WORKER_RUNNING
                .with_label_values(&["gauge-probe", "continuous"])
                .get(),
            0.0
        );
    }
}
