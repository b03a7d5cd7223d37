//! Training metrics.
//!
//! Lock-free counters and gauges updated by the trainer each outer iteration.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric (monotonically increasing).
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment by amount.
    pub fn add(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    /// Get current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicU64, // Store as bits for f64
}

impl Gauge {
    /// Create a new gauge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gauge value.
    pub fn set(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Get current value.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Relaxed))
    }
}

/// Metrics maintained by [`FederatedTrainer`](crate::federated::FederatedTrainer).
#[derive(Debug, Default)]
pub struct TrainingMetrics {
    /// Outer iterations completed
    pub outer_iterations: Counter,
    /// Gossip rounds applied across all outer iterations
    pub gossip_rounds: Counter,
    /// Mean per-node loss at the start of the last iteration
    pub mean_loss: Gauge,
    /// Largest averaged-gradient norm of the last iteration
    pub max_gradient_norm: Gauge,
}

impl TrainingMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed outer iteration.
    pub fn record_iteration(&self, gossip_rounds: usize, mean_loss: f64, max_gradient_norm: f64) {
        self.outer_iterations.inc();
        self.gossip_rounds.add(gossip_rounds as u64);
        self.mean_loss.set(mean_loss);
        self.max_gradient_norm.set(max_gradient_norm);
    }

    /// Point-in-time copy of all values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            outer_iterations: self.outer_iterations.get(),
            gossip_rounds: self.gossip_rounds.get(),
            mean_loss: self.mean_loss.get(),
            max_gradient_norm: self.max_gradient_norm.get(),
        }
    }
}

/// Serializable view of [`TrainingMetrics`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Outer iterations completed
    pub outer_iterations: u64,
    /// Gossip rounds across all iterations
    pub gossip_rounds: u64,
    /// Mean per-node loss at the start of the last iteration
    pub mean_loss: f64,
    /// Largest averaged-gradient norm in the last iteration
    pub max_gradient_norm: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        counter.inc();
        counter.add(4);
        assert_eq!(counter.get(), 5);
    }

    #[test]
    fn test_gauge() {
        let gauge = Gauge::new();
        assert_eq!(gauge.get(), 0.0);
        gauge.set(-1.25);
        assert_eq!(gauge.get(), -1.25);
    }

    #[test]
    fn test_record_iteration() {
        let metrics = TrainingMetrics::new();
        metrics.record_iteration(50, 0.69, 0.4);
        metrics.record_iteration(12, 0.5, 0.1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.outer_iterations, 2);
        assert_eq!(snapshot.gossip_rounds, 62);
        assert_eq!(snapshot.mean_loss, 0.5);
        assert_eq!(snapshot.max_gradient_norm, 0.1);
    }
}
