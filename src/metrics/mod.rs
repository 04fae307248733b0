//! Performance metric model, monitor and Prometheus export
//!
//! Counters accumulate through lock-free atomics; running latency extrema
//! use CAS retry loops; raw latency samples feed a mutex-guarded histogram
//! in its own synchronization domain. The monitor registers named metric
//! entities and the exporter renders them as Prometheus text exposition.

pub mod histogram;
pub mod model;
pub mod monitor;
pub mod prometheus;
pub mod stats;

// Re-export main types
pub use histogram::{LatencyHistogram, DEFAULT_MAX_SAMPLES};
pub use model::{ConnectionMetrics, OperationMetrics, PerformanceMetrics, SystemMetrics};
pub use monitor::PerformanceMonitor;
pub use prometheus::PrometheusExporter;
pub use stats::{ConnectionPoolStats, ErrorStats, ResourceUsageStats};
