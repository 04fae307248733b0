//! Per-entity metric accumulators

use std::{
    sync::atomic::{AtomicU32, AtomicU64, Ordering},
    sync::Mutex,
    time::Instant,
};

use super::{
    histogram::LatencyHistogram,
    stats::{ConnectionPoolStats, ErrorStats, ResourceUsageStats},
};

/// Core operation counters, latency extrema and sampled percentiles shared by
/// connection and operation entities.
///
/// All counters are atomics updated without locks; the min/max extrema use
/// CAS retry loops so concurrent recorders never lose an extremum.
#[derive(Debug)]
pub struct PerformanceMetrics {
    pub total_operations: AtomicU64,
    pub successful_operations: AtomicU64,
    pub failed_operations: AtomicU64,
    pub timeout_operations: AtomicU64,
    pub cancelled_operations: AtomicU64,

    pub total_latency_ns: AtomicU64,
    min_latency_ns: AtomicU64,
    max_latency_ns: AtomicU64,
    latency_count: AtomicU64,

    pub total_bytes_processed: AtomicU64,
    pub total_messages_processed: AtomicU64,

    pub error_stats: ErrorStats,
    histogram: LatencyHistogram,
    last_reset: Mutex<Instant>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            total_operations: AtomicU64::new(0),
            successful_operations: AtomicU64::new(0),
            failed_operations: AtomicU64::new(0),
            timeout_operations: AtomicU64::new(0),
            cancelled_operations: AtomicU64::new(0),
            total_latency_ns: AtomicU64::new(0),
            min_latency_ns: AtomicU64::new(u64::MAX),
            max_latency_ns: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
            total_bytes_processed: AtomicU64::new(0),
            total_messages_processed: AtomicU64::new(0),
            error_stats: ErrorStats::new(),
            histogram: LatencyHistogram::default(),
            last_reset: Mutex::new(Instant::now()),
        }
    }

    /// Record one completed operation: outcome, latency and payload size
    pub fn record(&self, success: bool, latency_ns: u64, bytes: u64) {
        self.total_operations.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_operations.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_operations.fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ns.fetch_add(latency_ns, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
        self.total_bytes_processed.fetch_add(bytes, Ordering::Relaxed);
        self.total_messages_processed.fetch_add(1, Ordering::Relaxed);

        let mut current = self.min_latency_ns.load(Ordering::Relaxed);
        while latency_ns < current {
            match self.min_latency_ns.compare_exchange_weak(
                current,
                latency_ns,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }

        let mut current = self.max_latency_ns.load(Ordering::Relaxed);
        while latency_ns > current {
            match self.max_latency_ns.compare_exchange_weak(
                current,
                latency_ns,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }

        self.histogram.record(latency_ns);
    }

    /// Mean latency in nanoseconds, 0.0 with no samples
    pub fn average_latency_ns(&self) -> f64 {
        let count = self.latency_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.total_latency_ns.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Mean latency in milliseconds
    pub fn average_latency_ms(&self) -> f64 {
        self.average_latency_ns() / 1_000_000.0
    }

    /// Minimum observed latency in nanoseconds, 0 with no samples.
    ///
    /// The internal sentinel is `u64::MAX`; accessors normalize it so export
    /// never shows the sentinel.
    pub fn min_latency_ns(&self) -> u64 {
        if self.latency_count.load(Ordering::Relaxed) == 0 {
            return 0;
        }
        self.min_latency_ns.load(Ordering::Relaxed)
    }

    /// Maximum observed latency in nanoseconds
    pub fn max_latency_ns(&self) -> u64 {
        self.max_latency_ns.load(Ordering::Relaxed)
    }

    /// Latency in milliseconds at percentile `p` in `[0.0, 1.0]`
    pub fn latency_percentile_ms(&self, p: f64) -> f64 {
        self.histogram.percentile(p) / 1_000_000.0
    }

    /// Fraction of operations that succeeded, 0.0 with no operations
    pub fn success_rate(&self) -> f64 {
        let total = self.total_operations.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.successful_operations.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Operations per second since the last reset, 0.0 within the first
    /// whole second
    pub fn throughput_ops_per_sec(&self) -> f64 {
        let elapsed = self.last_reset.lock().unwrap().elapsed().as_secs();
        if elapsed == 0 {
            return 0.0;
        }
        self.total_operations.load(Ordering::Relaxed) as f64 / elapsed as f64
    }

    /// Zero every counter and restart the throughput window
    pub fn reset(&self) {
        self.total_operations.store(0, Ordering::Relaxed);
        self.successful_operations.store(0, Ordering::Relaxed);
        self.failed_operations.store(0, Ordering::Relaxed);
        self.timeout_operations.store(0, Ordering::Relaxed);
        self.cancelled_operations.store(0, Ordering::Relaxed);
        self.total_latency_ns.store(0, Ordering::Relaxed);
        self.min_latency_ns.store(u64::MAX, Ordering::Relaxed);
        self.max_latency_ns.store(0, Ordering::Relaxed);
        self.latency_count.store(0, Ordering::Relaxed);
        self.total_bytes_processed.store(0, Ordering::Relaxed);
        self.total_messages_processed.store(0, Ordering::Relaxed);
        self.error_stats.reset();
        self.histogram.reset();
        *self.last_reset.lock().unwrap() = Instant::now();
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics for one registered connection
#[derive(Debug)]
pub struct ConnectionMetrics {
    pub connection_id: String,
    pub remote_address: String,
    pub connected_at: Instant,
    pub metrics: PerformanceMetrics,
    pub reconnect_count: AtomicU64,
    pub connection_errors: AtomicU64,
    pub protocol_errors: AtomicU64,
    pub pool_stats: ConnectionPoolStats,
}

impl ConnectionMetrics {
    pub fn new(connection_id: impl Into<String>, remote_address: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            remote_address: remote_address.into(),
            connected_at: Instant::now(),
            metrics: PerformanceMetrics::new(),
            reconnect_count: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            pool_stats: ConnectionPoolStats::new(),
        }
    }

    /// Whole seconds this connection has been registered
    pub fn connection_duration_secs(&self) -> u64 {
        self.connected_at.elapsed().as_secs()
    }
}

/// Metrics for one registered operation class
#[derive(Debug)]
pub struct OperationMetrics {
    pub operation_type: String,
    pub protocol: String,
    pub metrics: PerformanceMetrics,
    pub partial_operations: AtomicU64,
    pub retry_count: AtomicU64,
    pub buffer_overflows: AtomicU64,
}

impl OperationMetrics {
    pub fn new(operation_type: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            operation_type: operation_type.into(),
            protocol: protocol.into(),
            metrics: PerformanceMetrics::new(),
            partial_operations: AtomicU64::new(0),
            retry_count: AtomicU64::new(0),
            buffer_overflows: AtomicU64::new(0),
        }
    }
}

/// Process-wide gauges and counters outside any single connection
#[derive(Debug, Default)]
pub struct SystemMetrics {
    pub active_connections: AtomicU32,
    pub total_connections: AtomicU32,
    pub failed_connections: AtomicU32,
    pub resource: ResourceUsageStats,
    pub event_loop_iterations: AtomicU64,
    pub events_processed: AtomicU64,
    pub idle_time_ms: AtomicU64,
    pub batch_processing_count: AtomicU64,
    pub average_batch_size: AtomicU64,
    pub max_batch_size: AtomicU64,
}

impl SystemMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite every field with another instance's current values
    pub fn store_from(&self, other: &SystemMetrics) {
        self.active_connections.store(
            other.active_connections.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.total_connections.store(
            other.total_connections.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.failed_connections.store(
            other.failed_connections.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.resource.store_from(&other.resource);
        self.event_loop_iterations.store(
            other.event_loop_iterations.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.events_processed.store(
            other.events_processed.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.idle_time_ms
            .store(other.idle_time_ms.load(Ordering::Relaxed), Ordering::Relaxed);
        self.batch_processing_count.store(
            other.batch_processing_count.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.average_batch_size.store(
            other.average_batch_size.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.max_batch_size
            .store(other.max_batch_size.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.store_from(&SystemMetrics::default());
    }
}

impl Clone for SystemMetrics {
    fn clone(&self) -> Self {
        let copy = SystemMetrics::default();
        copy.store_from(self);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let metrics = PerformanceMetrics::new();
        metrics.record(true, 1_000_000, 512);
        metrics.record(false, 3_000_000, 256);

        assert_eq!(metrics.total_operations.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.successful_operations.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.failed_operations.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_bytes_processed.load(Ordering::Relaxed), 768);
        assert_eq!(metrics.min_latency_ns(), 1_000_000);
        assert_eq!(metrics.max_latency_ns(), 3_000_000);
        assert!((metrics.average_latency_ms() - 2.0).abs() < 1e-9);
        assert!((metrics.success_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_metrics_never_nan() {
        let metrics = PerformanceMetrics::new();
        assert_eq!(metrics.success_rate(), 0.0);
        assert_eq!(metrics.average_latency_ns(), 0.0);
        assert_eq!(metrics.min_latency_ns(), 0);
        assert_eq!(metrics.throughput_ops_per_sec(), 0.0);
    }

    #[test]
    fn test_reset_restores_sentinels() {
        let metrics = PerformanceMetrics::new();
        metrics.record(true, 42, 1);
        metrics.reset();

        assert_eq!(metrics.total_operations.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.min_latency_ns(), 0);
        assert_eq!(metrics.max_latency_ns(), 0);
        assert_eq!(metrics.latency_percentile_ms(0.5), 0.0);
    }

    #[test]
    fn test_concurrent_extrema() {
        use std::sync::Arc;

        let metrics = Arc::new(PerformanceMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for i in 0..1000u64 {
                        metrics.record(true, 1 + t * 1000 + i, 8);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.total_operations.load(Ordering::Relaxed), 4000);
        assert_eq!(metrics.min_latency_ns(), 1);
        assert_eq!(metrics.max_latency_ns(), 4000);
    }

    #[test]
    fn test_system_metrics_clone_snapshot() {
        let system = SystemMetrics::new();
        system.active_connections.store(3, Ordering::Relaxed);
        system.events_processed.store(99, Ordering::Relaxed);

        let snapshot = system.clone();
        system.events_processed.store(100, Ordering::Relaxed);
        assert_eq!(snapshot.active_connections.load(Ordering::Relaxed), 3);
        assert_eq!(snapshot.events_processed.load(Ordering::Relaxed), 99);
    }
}
