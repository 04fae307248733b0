//! Atomic stat blocks shared across metric entities

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Error counters split by class.
///
/// `record` classifies a free-form error kind string; anything outside the
/// known vocabulary lands in `unknown_errors`.
#[derive(Debug, Default)]
pub struct ErrorStats {
    pub network_errors: AtomicU64,
    pub timeout_errors: AtomicU64,
    pub protocol_errors: AtomicU64,
    pub authentication_errors: AtomicU64,
    pub authorization_errors: AtomicU64,
    pub resource_errors: AtomicU64,
    pub system_errors: AtomicU64,
    pub unknown_errors: AtomicU64,
}

impl ErrorStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one error of the given kind
    pub fn record(&self, kind: &str) {
        let counter = match kind {
            "network" => &self.network_errors,
            "timeout" => &self.timeout_errors,
            "protocol" => &self.protocol_errors,
            "authentication" => &self.authentication_errors,
            "authorization" => &self.authorization_errors,
            "resource" => &self.resource_errors,
            "system" => &self.system_errors,
            _ => &self.unknown_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Sum of all error classes
    pub fn total(&self) -> u64 {
        self.network_errors.load(Ordering::Relaxed)
            + self.timeout_errors.load(Ordering::Relaxed)
            + self.protocol_errors.load(Ordering::Relaxed)
            + self.authentication_errors.load(Ordering::Relaxed)
            + self.authorization_errors.load(Ordering::Relaxed)
            + self.resource_errors.load(Ordering::Relaxed)
            + self.system_errors.load(Ordering::Relaxed)
            + self.unknown_errors.load(Ordering::Relaxed)
    }

    /// Zero every class counter
    pub fn reset(&self) {
        self.network_errors.store(0, Ordering::Relaxed);
        self.timeout_errors.store(0, Ordering::Relaxed);
        self.protocol_errors.store(0, Ordering::Relaxed);
        self.authentication_errors.store(0, Ordering::Relaxed);
        self.authorization_errors.store(0, Ordering::Relaxed);
        self.resource_errors.store(0, Ordering::Relaxed);
        self.system_errors.store(0, Ordering::Relaxed);
        self.unknown_errors.store(0, Ordering::Relaxed);
    }
}

impl Clone for ErrorStats {
    fn clone(&self) -> Self {
        Self {
            network_errors: AtomicU64::new(self.network_errors.load(Ordering::Relaxed)),
            timeout_errors: AtomicU64::new(self.timeout_errors.load(Ordering::Relaxed)),
            protocol_errors: AtomicU64::new(self.protocol_errors.load(Ordering::Relaxed)),
            authentication_errors: AtomicU64::new(
                self.authentication_errors.load(Ordering::Relaxed),
            ),
            authorization_errors: AtomicU64::new(
                self.authorization_errors.load(Ordering::Relaxed),
            ),
            resource_errors: AtomicU64::new(self.resource_errors.load(Ordering::Relaxed)),
            system_errors: AtomicU64::new(self.system_errors.load(Ordering::Relaxed)),
            unknown_errors: AtomicU64::new(self.unknown_errors.load(Ordering::Relaxed)),
        }
    }
}

/// Connection-pool occupancy and wait counters
#[derive(Debug, Default)]
pub struct ConnectionPoolStats {
    pub total_pool_size: AtomicU64,
    pub active_connections: AtomicU64,
    pub idle_connections: AtomicU64,
    pub max_connections: AtomicU64,
    pub pool_exhaustion_count: AtomicU64,
    pub total_wait_time_ms: AtomicU64,
    pub wait_count: AtomicU64,
}

impl ConnectionPoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of the maximum currently active, 0.0 with no maximum
    pub fn utilization(&self) -> f64 {
        let max = self.max_connections.load(Ordering::Relaxed);
        if max == 0 {
            return 0.0;
        }
        self.active_connections.load(Ordering::Relaxed) as f64 / max as f64
    }

    /// Mean acquisition wait in milliseconds, 0.0 with no waits
    pub fn average_wait_time_ms(&self) -> f64 {
        let waits = self.wait_count.load(Ordering::Relaxed);
        if waits == 0 {
            return 0.0;
        }
        self.total_wait_time_ms.load(Ordering::Relaxed) as f64 / waits as f64
    }

    /// Overwrite every counter with another block's current values
    pub fn store_from(&self, other: &ConnectionPoolStats) {
        self.total_pool_size
            .store(other.total_pool_size.load(Ordering::Relaxed), Ordering::Relaxed);
        self.active_connections.store(
            other.active_connections.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.idle_connections.store(
            other.idle_connections.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.max_connections
            .store(other.max_connections.load(Ordering::Relaxed), Ordering::Relaxed);
        self.pool_exhaustion_count.store(
            other.pool_exhaustion_count.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.total_wait_time_ms.store(
            other.total_wait_time_ms.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.wait_count
            .store(other.wait_count.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.store_from(&ConnectionPoolStats::default());
    }
}

impl Clone for ConnectionPoolStats {
    fn clone(&self) -> Self {
        let copy = ConnectionPoolStats::default();
        copy.store_from(self);
        copy
    }
}

/// Host resource gauges reported through the system section
#[derive(Debug, Default)]
pub struct ResourceUsageStats {
    pub memory_usage_bytes: AtomicU64,
    pub peak_memory_usage_bytes: AtomicU64,
    pub thread_count: AtomicU32,
    /// CPU usage in hundredths of a percent
    pub cpu_usage_centipercent: AtomicU64,
    pub file_descriptor_count: AtomicU64,
    pub buffer_pool_usage: AtomicU64,
    pub buffer_pool_capacity: AtomicU64,
}

impl ResourceUsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// CPU usage as a percentage
    pub fn cpu_usage_percent(&self) -> f64 {
        self.cpu_usage_centipercent.load(Ordering::Relaxed) as f64 / 100.0
    }

    /// Fraction of buffer-pool capacity in use, 0.0 with no capacity
    pub fn buffer_pool_utilization(&self) -> f64 {
        let capacity = self.buffer_pool_capacity.load(Ordering::Relaxed);
        if capacity == 0 {
            return 0.0;
        }
        self.buffer_pool_usage.load(Ordering::Relaxed) as f64 / capacity as f64
    }

    /// Overwrite every gauge with another block's current values
    pub fn store_from(&self, other: &ResourceUsageStats) {
        self.memory_usage_bytes.store(
            other.memory_usage_bytes.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.peak_memory_usage_bytes.store(
            other.peak_memory_usage_bytes.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.thread_count
            .store(other.thread_count.load(Ordering::Relaxed), Ordering::Relaxed);
        self.cpu_usage_centipercent.store(
            other.cpu_usage_centipercent.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.file_descriptor_count.store(
            other.file_descriptor_count.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.buffer_pool_usage.store(
            other.buffer_pool_usage.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.buffer_pool_capacity.store(
            other.buffer_pool_capacity.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
    }

    pub fn reset(&self) {
        self.store_from(&ResourceUsageStats::default());
    }
}

impl Clone for ResourceUsageStats {
    fn clone(&self) -> Self {
        let copy = ResourceUsageStats::default();
        copy.store_from(self);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let stats = ErrorStats::new();
        stats.record("network");
        stats.record("timeout");
        stats.record("gremlins");

        assert_eq!(stats.network_errors.load(Ordering::Relaxed), 1);
        assert_eq!(stats.timeout_errors.load(Ordering::Relaxed), 1);
        assert_eq!(stats.unknown_errors.load(Ordering::Relaxed), 1);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_pool_utilization_guards() {
        let stats = ConnectionPoolStats::new();
        assert_eq!(stats.utilization(), 0.0);
        assert_eq!(stats.average_wait_time_ms(), 0.0);

        stats.max_connections.store(10, Ordering::Relaxed);
        stats.active_connections.store(4, Ordering::Relaxed);
        assert!((stats.utilization() - 0.4).abs() < 1e-9);

        stats.wait_count.store(2, Ordering::Relaxed);
        stats.total_wait_time_ms.store(30, Ordering::Relaxed);
        assert!((stats.average_wait_time_ms() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_resource_store_from() {
        let source = ResourceUsageStats::new();
        source.memory_usage_bytes.store(1234, Ordering::Relaxed);
        source.buffer_pool_usage.store(3, Ordering::Relaxed);
        source.buffer_pool_capacity.store(4, Ordering::Relaxed);

        let target = ResourceUsageStats::new();
        target.store_from(&source);
        assert_eq!(target.memory_usage_bytes.load(Ordering::Relaxed), 1234);
        assert!((target.buffer_pool_utilization() - 0.75).abs() < 1e-9);

        target.reset();
        assert_eq!(target.memory_usage_bytes.load(Ordering::Relaxed), 0);
    }
}
