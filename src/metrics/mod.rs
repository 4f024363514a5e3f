mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

pub use server::{health_handler, metrics_handler};

// ============================================================================
// Metrics Module - Prometheus metrics for hydration requests
// ============================================================================
//
// Every series is labelled by strategy name, so the cost of the strategies
// can be compared side by side:
// - requests, failures (by reason) and hydrated orders
// - store round trips
// - wall-clock duration
//
// All metrics are registered with one Registry and scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub hydration_requests: IntCounterVec,
    pub hydration_failures: IntCounterVec,
    pub hydration_round_trips: IntCounterVec,
    pub hydration_duration: HistogramVec,
    pub hydrated_orders: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let hydration_requests = IntCounterVec::new(
            Opts::new("hydration_requests_total", "Total order hydration requests"),
            &["strategy"],
        )?;
        registry.register(Box::new(hydration_requests.clone()))?;

        let hydration_failures = IntCounterVec::new(
            Opts::new("hydration_failures_total", "Order hydration requests that failed"),
            &["strategy", "reason"],
        )?;
        registry.register(Box::new(hydration_failures.clone()))?;

        let hydration_round_trips = IntCounterVec::new(
            Opts::new("hydration_round_trips_total", "Store round trips issued while hydrating"),
            &["strategy"],
        )?;
        registry.register(Box::new(hydration_round_trips.clone()))?;

        let hydration_duration = HistogramVec::new(
            HistogramOpts::new("hydration_duration_seconds", "Order hydration duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["strategy"],
        )?;
        registry.register(Box::new(hydration_duration.clone()))?;

        let hydrated_orders = IntCounterVec::new(
            Opts::new("hydrated_orders_total", "Order summaries returned"),
            &["strategy"],
        )?;
        registry.register(Box::new(hydrated_orders.clone()))?;

        Ok(Self {
            registry,
            hydration_requests,
            hydration_failures,
            hydration_round_trips,
            hydration_duration,
            hydrated_orders,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_success(&self, strategy: &str, round_trips: usize, orders: usize, duration_secs: f64) {
        self.hydration_requests.with_label_values(&[strategy]).inc();
        self.hydration_round_trips
            .with_label_values(&[strategy])
            .inc_by(round_trips as u64);
        self.hydrated_orders.with_label_values(&[strategy]).inc_by(orders as u64);
        self.hydration_duration.with_label_values(&[strategy]).observe(duration_secs);
    }

    pub fn record_failure(&self, strategy: &str, reason: &str, round_trips: usize, duration_secs: f64) {
        self.hydration_requests.with_label_values(&[strategy]).inc();
        self.hydration_failures.with_label_values(&[strategy, reason]).inc();
        self.hydration_round_trips
            .with_label_values(&[strategy])
            .inc_by(round_trips as u64);
        self.hydration_duration.with_label_values(&[strategy]).observe(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(metrics: &Metrics, name: &str) -> f64 {
        let gathered = metrics.registry.gather();
        let family = gathered.iter().find(|m| m.name() == name).unwrap();
        family.metric.iter().map(|m| m.counter.value.unwrap_or(0.0)).sum()
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_success("batched", 2, 2, 0.001);
        assert!(metrics.registry.gather().len() >= 4);
    }

    #[test]
    fn test_record_success() {
        let metrics = Metrics::new().unwrap();
        metrics.record_success("batched", 2, 2, 0.001);
        metrics.record_success("lazy-walk", 10, 2, 0.002);

        assert_eq!(counter(&metrics, "hydration_requests_total"), 2.0);
        assert_eq!(counter(&metrics, "hydration_round_trips_total"), 12.0);
        assert_eq!(counter(&metrics, "hydrated_orders_total"), 4.0);
    }

    #[test]
    fn test_record_failure() {
        let metrics = Metrics::new().unwrap();
        metrics.record_failure("flat-join", "partial_collection", 1, 0.001);

        let gathered = metrics.registry.gather();
        let failures = gathered
            .iter()
            .find(|m| m.name() == "hydration_failures_total")
            .unwrap();
        assert_eq!(failures.metric.len(), 1);
        assert_eq!(failures.metric[0].counter.value, Some(1.0));
    }
}
