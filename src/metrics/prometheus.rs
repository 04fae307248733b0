//! Prometheus text exposition rendering
//!
//! Pure serialization over monitor snapshots; collection stays in the
//! monitor. Output order is connections, then operations, then system, with
//! one `# HELP`/`# TYPE` pair per metric family followed by one series per
//! registered entity.
//!
//! Label values are emitted verbatim. Ids and addresses containing `"` or
//! `\` would need escaping before registration; the exporter does not
//! rewrite them.

use std::{
    collections::BTreeMap,
    fmt::Write,
    sync::atomic::Ordering,
    sync::Arc,
};

use super::model::{ConnectionMetrics, OperationMetrics, SystemMetrics};

type ConnAccessor = fn(&ConnectionMetrics) -> f64;
type OpAccessor = fn(&OperationMetrics) -> f64;
type SysAccessor = fn(&SystemMetrics) -> f64;

const CONNECTION_FAMILIES: &[(&str, &str, &str, ConnAccessor)] = &[
    (
        "helianthus_connection_total_operations",
        "Total operations on the connection",
        "counter",
        |c| c.metrics.total_operations.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_successful_operations",
        "Successful operations on the connection",
        "counter",
        |c| c.metrics.successful_operations.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_failed_operations",
        "Failed operations on the connection",
        "counter",
        |c| c.metrics.failed_operations.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_success_rate",
        "Fraction of operations that succeeded",
        "gauge",
        |c| c.metrics.success_rate(),
    ),
    (
        "helianthus_connection_avg_latency_ms",
        "Mean operation latency in milliseconds",
        "gauge",
        |c| c.metrics.average_latency_ms(),
    ),
    (
        "helianthus_connection_min_latency_ms",
        "Minimum operation latency in milliseconds",
        "gauge",
        |c| c.metrics.min_latency_ns() as f64 / 1_000_000.0,
    ),
    (
        "helianthus_connection_max_latency_ms",
        "Maximum operation latency in milliseconds",
        "gauge",
        |c| c.metrics.max_latency_ns() as f64 / 1_000_000.0,
    ),
    (
        "helianthus_connection_p50_latency_ms",
        "Median operation latency in milliseconds",
        "gauge",
        |c| c.metrics.latency_percentile_ms(0.50),
    ),
    (
        "helianthus_connection_p95_latency_ms",
        "95th percentile operation latency in milliseconds",
        "gauge",
        |c| c.metrics.latency_percentile_ms(0.95),
    ),
    (
        "helianthus_connection_p99_latency_ms",
        "99th percentile operation latency in milliseconds",
        "gauge",
        |c| c.metrics.latency_percentile_ms(0.99),
    ),
    (
        "helianthus_connection_throughput_ops_per_sec",
        "Operations per second since the last reset",
        "gauge",
        |c| c.metrics.throughput_ops_per_sec(),
    ),
    (
        "helianthus_connection_total_bytes_processed",
        "Total payload bytes processed on the connection",
        "counter",
        |c| c.metrics.total_bytes_processed.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_total_messages_processed",
        "Total messages processed on the connection",
        "counter",
        |c| c.metrics.total_messages_processed.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_duration_sec",
        "Seconds since the connection was registered",
        "gauge",
        |c| c.connection_duration_secs() as f64,
    ),
    (
        "helianthus_connection_reconnect_count",
        "Reconnect attempts on the connection",
        "counter",
        |c| c.reconnect_count.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_network_errors",
        "Network errors on the connection",
        "counter",
        |c| c.metrics.error_stats.network_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_timeout_errors",
        "Timeout errors on the connection",
        "counter",
        |c| c.metrics.error_stats.timeout_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_protocol_errors",
        "Protocol errors on the connection",
        "counter",
        |c| c.metrics.error_stats.protocol_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_authentication_errors",
        "Authentication errors on the connection",
        "counter",
        |c| {
            c.metrics
                .error_stats
                .authentication_errors
                .load(Ordering::Relaxed) as f64
        },
    ),
    (
        "helianthus_connection_authorization_errors",
        "Authorization errors on the connection",
        "counter",
        |c| {
            c.metrics
                .error_stats
                .authorization_errors
                .load(Ordering::Relaxed) as f64
        },
    ),
    (
        "helianthus_connection_resource_errors",
        "Resource exhaustion errors on the connection",
        "counter",
        |c| c.metrics.error_stats.resource_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_system_errors",
        "System errors on the connection",
        "counter",
        |c| c.metrics.error_stats.system_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_connection_unknown_errors",
        "Unclassified errors on the connection",
        "counter",
        |c| c.metrics.error_stats.unknown_errors.load(Ordering::Relaxed) as f64,
    ),
];

const POOL_FAMILIES: &[(&str, &str, &str, ConnAccessor)] = &[
    (
        "helianthus_pool_total_size",
        "Connection pool size",
        "gauge",
        |c| c.pool_stats.total_pool_size.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_pool_active_connections",
        "Active connections in the pool",
        "gauge",
        |c| c.pool_stats.active_connections.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_pool_idle_connections",
        "Idle connections in the pool",
        "gauge",
        |c| c.pool_stats.idle_connections.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_pool_max_connections",
        "Maximum connections allowed in the pool",
        "gauge",
        |c| c.pool_stats.max_connections.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_pool_utilization",
        "Fraction of the pool maximum currently active",
        "gauge",
        |c| c.pool_stats.utilization(),
    ),
    (
        "helianthus_pool_avg_wait_time_ms",
        "Mean pool acquisition wait in milliseconds",
        "gauge",
        |c| c.pool_stats.average_wait_time_ms(),
    ),
    (
        "helianthus_pool_exhaustion_count",
        "Times the pool was exhausted",
        "counter",
        |c| c.pool_stats.pool_exhaustion_count.load(Ordering::Relaxed) as f64,
    ),
];

const OPERATION_FAMILIES: &[(&str, &str, &str, OpAccessor)] = &[
    (
        "helianthus_operation_total_operations",
        "Total operations of this class",
        "counter",
        |o| o.metrics.total_operations.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_successful_operations",
        "Successful operations of this class",
        "counter",
        |o| o.metrics.successful_operations.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_failed_operations",
        "Failed operations of this class",
        "counter",
        |o| o.metrics.failed_operations.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_success_rate",
        "Fraction of operations that succeeded",
        "gauge",
        |o| o.metrics.success_rate(),
    ),
    (
        "helianthus_operation_avg_latency_ms",
        "Mean operation latency in milliseconds",
        "gauge",
        |o| o.metrics.average_latency_ms(),
    ),
    (
        "helianthus_operation_min_latency_ms",
        "Minimum operation latency in milliseconds",
        "gauge",
        |o| o.metrics.min_latency_ns() as f64 / 1_000_000.0,
    ),
    (
        "helianthus_operation_max_latency_ms",
        "Maximum operation latency in milliseconds",
        "gauge",
        |o| o.metrics.max_latency_ns() as f64 / 1_000_000.0,
    ),
    (
        "helianthus_operation_p50_latency_ms",
        "Median operation latency in milliseconds",
        "gauge",
        |o| o.metrics.latency_percentile_ms(0.50),
    ),
    (
        "helianthus_operation_p95_latency_ms",
        "95th percentile operation latency in milliseconds",
        "gauge",
        |o| o.metrics.latency_percentile_ms(0.95),
    ),
    (
        "helianthus_operation_p99_latency_ms",
        "99th percentile operation latency in milliseconds",
        "gauge",
        |o| o.metrics.latency_percentile_ms(0.99),
    ),
    (
        "helianthus_operation_throughput_ops_per_sec",
        "Operations per second since the last reset",
        "gauge",
        |o| o.metrics.throughput_ops_per_sec(),
    ),
    (
        "helianthus_operation_total_bytes_processed",
        "Total payload bytes processed by this class",
        "counter",
        |o| o.metrics.total_bytes_processed.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_total_messages_processed",
        "Total messages processed by this class",
        "counter",
        |o| o.metrics.total_messages_processed.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_partial_operations",
        "Operations completed partially",
        "counter",
        |o| o.partial_operations.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_retry_count",
        "Operation retries",
        "counter",
        |o| o.retry_count.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_buffer_overflows",
        "Buffer overflow events during operations",
        "counter",
        |o| o.buffer_overflows.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_network_errors",
        "Network errors for this class",
        "counter",
        |o| o.metrics.error_stats.network_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_timeout_errors",
        "Timeout errors for this class",
        "counter",
        |o| o.metrics.error_stats.timeout_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_protocol_errors",
        "Protocol errors for this class",
        "counter",
        |o| o.metrics.error_stats.protocol_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_authentication_errors",
        "Authentication errors for this class",
        "counter",
        |o| {
            o.metrics
                .error_stats
                .authentication_errors
                .load(Ordering::Relaxed) as f64
        },
    ),
    (
        "helianthus_operation_authorization_errors",
        "Authorization errors for this class",
        "counter",
        |o| {
            o.metrics
                .error_stats
                .authorization_errors
                .load(Ordering::Relaxed) as f64
        },
    ),
    (
        "helianthus_operation_resource_errors",
        "Resource exhaustion errors for this class",
        "counter",
        |o| o.metrics.error_stats.resource_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_system_errors",
        "System errors for this class",
        "counter",
        |o| o.metrics.error_stats.system_errors.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_operation_unknown_errors",
        "Unclassified errors for this class",
        "counter",
        |o| o.metrics.error_stats.unknown_errors.load(Ordering::Relaxed) as f64,
    ),
];

const SYSTEM_FAMILIES: &[(&str, &str, &str, SysAccessor)] = &[
    (
        "helianthus_system_active_connections",
        "Currently registered connections",
        "gauge",
        |s| s.active_connections.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_total_connections",
        "Connections registered since start",
        "counter",
        |s| s.total_connections.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_failed_connections",
        "Connections that failed to establish",
        "counter",
        |s| s.failed_connections.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_memory_usage_bytes",
        "Process memory usage in bytes",
        "gauge",
        |s| s.resource.memory_usage_bytes.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_peak_memory_usage_bytes",
        "Peak process memory usage in bytes",
        "gauge",
        |s| s.resource.peak_memory_usage_bytes.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_thread_count",
        "Live threads in the process",
        "gauge",
        |s| s.resource.thread_count.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_cpu_usage_percent",
        "Process CPU usage percentage",
        "gauge",
        |s| s.resource.cpu_usage_percent(),
    ),
    (
        "helianthus_system_file_descriptor_count",
        "Open file descriptors",
        "gauge",
        |s| s.resource.file_descriptor_count.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_buffer_pool_usage",
        "Buffers currently checked out of pools",
        "gauge",
        |s| s.resource.buffer_pool_usage.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_buffer_pool_capacity",
        "Total pooled buffer capacity",
        "gauge",
        |s| s.resource.buffer_pool_capacity.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_buffer_pool_utilization",
        "Fraction of buffer pool capacity in use",
        "gauge",
        |s| s.resource.buffer_pool_utilization(),
    ),
    (
        "helianthus_system_event_loop_iterations",
        "Event loop iterations",
        "counter",
        |s| s.event_loop_iterations.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_events_processed",
        "Events processed by the event loop",
        "counter",
        |s| s.events_processed.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_idle_time_ms",
        "Event loop idle time in milliseconds",
        "counter",
        |s| s.idle_time_ms.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_batch_processing_count",
        "Event batches processed",
        "counter",
        |s| s.batch_processing_count.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_average_batch_size",
        "Mean events per processed batch",
        "gauge",
        |s| s.average_batch_size.load(Ordering::Relaxed) as f64,
    ),
    (
        "helianthus_system_max_batch_size",
        "Largest processed batch",
        "gauge",
        |s| s.max_batch_size.load(Ordering::Relaxed) as f64,
    ),
];

/// Renders monitor snapshots as Prometheus text exposition
pub struct PrometheusExporter;

impl PrometheusExporter {
    /// Serialize connections, operations and the system section, in that
    /// order
    pub fn export(
        connections: &BTreeMap<String, Arc<ConnectionMetrics>>,
        operations: &BTreeMap<String, Arc<OperationMetrics>>,
        system: &SystemMetrics,
    ) -> String {
        let mut out = String::new();

        for &(name, help, family_type, accessor) in CONNECTION_FAMILIES {
            Self::write_header(&mut out, name, help, family_type);
            for (id, connection) in connections {
                let labels = format!(
                    "connection_id=\"{}\",remote_address=\"{}\"",
                    id, connection.remote_address
                );
                Self::write_series(&mut out, name, &labels, accessor(connection));
            }
        }

        for &(name, help, family_type, accessor) in POOL_FAMILIES {
            Self::write_header(&mut out, name, help, family_type);
            for (id, connection) in connections {
                let labels = format!("connection_id=\"{}\",pool_type=\"connection\"", id);
                Self::write_series(&mut out, name, &labels, accessor(connection));
            }
        }

        for &(name, help, family_type, accessor) in OPERATION_FAMILIES {
            Self::write_header(&mut out, name, help, family_type);
            for (id, operation) in operations {
                let labels = format!(
                    "operation_id=\"{}\",operation_type=\"{}\",protocol=\"{}\"",
                    id, operation.operation_type, operation.protocol
                );
                Self::write_series(&mut out, name, &labels, accessor(operation));
            }
        }

        for &(name, help, family_type, accessor) in SYSTEM_FAMILIES {
            Self::write_header(&mut out, name, help, family_type);
            Self::write_series(&mut out, name, "", accessor(system));
        }

        out
    }

    fn write_header(out: &mut String, name: &str, help: &str, family_type: &str) {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} {family_type}");
    }

    fn write_series(out: &mut String, name: &str, labels: &str, value: f64) {
        if labels.is_empty() {
            let _ = writeln!(out, "{name} {value:.6}");
        } else {
            let _ = writeln!(out, "{name}{{{labels}}} {value:.6}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PerformanceMonitor;

    #[test]
    fn test_export_series_shape() {
        let monitor = PerformanceMonitor::new();
        monitor.register_connection("c1", "10.0.0.1:9000");
        monitor.update_connection_metrics("c1", true, 2_000_000, 4096);

        let text = monitor.export_prometheus();
        assert!(text.contains("# HELP helianthus_connection_total_operations"));
        assert!(text.contains("# TYPE helianthus_connection_total_operations counter"));
        assert!(text.contains(
            "helianthus_connection_total_operations{connection_id=\"c1\",remote_address=\"10.0.0.1:9000\"} 1.000000"
        ));
    }

    #[test]
    fn test_export_section_order() {
        let monitor = PerformanceMonitor::new();
        monitor.register_connection("c1", "addr");
        monitor.register_operation("op1", "read", "tcp");

        let text = monitor.export_prometheus();
        let conn = text.find("helianthus_connection_total_operations").unwrap();
        let op = text.find("helianthus_operation_total_operations").unwrap();
        let sys = text.find("helianthus_system_active_connections").unwrap();
        assert!(conn < op && op < sys);
    }

    #[test]
    fn test_labels_emitted_verbatim() {
        let monitor = PerformanceMonitor::new();
        monitor.register_connection("c\"1", "addr\\path");

        let text = monitor.export_prometheus();
        assert!(text.contains("connection_id=\"c\"1\""));
        assert!(text.contains("remote_address=\"addr\\path\""));
    }

    #[test]
    fn test_empty_registry_still_exports_system() {
        let monitor = PerformanceMonitor::new();
        let text = monitor.export_prometheus();
        assert!(text.contains("helianthus_system_active_connections 0.000000"));
        assert!(!text.contains("connection_id="));
    }
}
