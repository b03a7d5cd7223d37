//! Monitoring Module
//!
//! Provides observability for training runs:
//! - Structured logging via tracing
//! - Training counters and gauges

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat, LogLevel, LoggerConfig};
pub use metrics::{Counter, Gauge, MetricsSnapshot, TrainingMetrics};
