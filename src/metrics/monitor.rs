//! Registry of named metric entities

use std::{
    collections::BTreeMap,
    sync::atomic::Ordering,
    sync::{Arc, Mutex},
};

use log::{debug, warn};

use super::{
    model::{ConnectionMetrics, OperationMetrics, SystemMetrics},
    prometheus::PrometheusExporter,
    stats::{ConnectionPoolStats, ResourceUsageStats},
};

/// Central registry for connection, operation and system metrics.
///
/// Entities are registered under string ids and shared out as `Arc`s so
/// recorders hold them without going through the registry lock per update.
/// Ordered maps keep export output deterministic.
///
/// Updates against an unregistered id are logged and dropped rather than
/// erroring; metric loss is preferable to failing the operation being
/// measured.
pub struct PerformanceMonitor {
    connections: Mutex<BTreeMap<String, Arc<ConnectionMetrics>>>,
    operations: Mutex<BTreeMap<String, Arc<OperationMetrics>>>,
    system: SystemMetrics,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(BTreeMap::new()),
            operations: Mutex::new(BTreeMap::new()),
            system: SystemMetrics::new(),
        }
    }

    /// Register a connection under `connection_id`. Re-registering the same
    /// id replaces the entity and discards its history.
    pub fn register_connection(
        &self,
        connection_id: impl Into<String>,
        remote_address: impl Into<String>,
    ) -> Arc<ConnectionMetrics> {
        let connection_id = connection_id.into();
        let metrics = Arc::new(ConnectionMetrics::new(&connection_id, remote_address));

        debug!("registering connection metrics for {connection_id}");
        self.connections
            .lock()
            .unwrap()
            .insert(connection_id, Arc::clone(&metrics));

        self.system.active_connections.fetch_add(1, Ordering::Relaxed);
        self.system.total_connections.fetch_add(1, Ordering::Relaxed);
        metrics
    }

    /// Remove a connection from the registry
    pub fn unregister_connection(&self, connection_id: &str) {
        let removed = self.connections.lock().unwrap().remove(connection_id);
        if removed.is_some() {
            // Underflow guard: unregister twice must not wrap the gauge
            let _ = self.system.active_connections.fetch_update(
                Ordering::Relaxed,
                Ordering::Relaxed,
                |active| active.checked_sub(1),
            );
        }
    }

    /// Record one completed operation on a connection. Unknown ids are
    /// logged and dropped.
    pub fn update_connection_metrics(
        &self,
        connection_id: &str,
        success: bool,
        latency_ns: u64,
        bytes: u64,
    ) {
        match self.connection(connection_id) {
            Some(connection) => connection.metrics.record(success, latency_ns, bytes),
            None => warn!("metrics update for unknown connection {connection_id}"),
        }
    }

    /// Count a classified error against a connection
    pub fn update_error_stats(&self, connection_id: &str, kind: &str) {
        match self.connection(connection_id) {
            Some(connection) => connection.metrics.error_stats.record(kind),
            None => warn!("error stats update for unknown connection {connection_id}"),
        }
    }

    /// Overwrite a connection's pool stats snapshot
    pub fn update_connection_pool_stats(&self, connection_id: &str, stats: &ConnectionPoolStats) {
        match self.connection(connection_id) {
            Some(connection) => connection.pool_stats.store_from(stats),
            None => warn!("pool stats update for unknown connection {connection_id}"),
        }
    }

    /// Register an operation class under `operation_id`. Re-registering the
    /// same id replaces the entity and discards its history.
    pub fn register_operation(
        &self,
        operation_id: impl Into<String>,
        operation_type: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Arc<OperationMetrics> {
        let operation_id = operation_id.into();
        let metrics = Arc::new(OperationMetrics::new(operation_type, protocol));

        debug!("registering operation metrics for {operation_id}");
        self.operations
            .lock()
            .unwrap()
            .insert(operation_id, Arc::clone(&metrics));
        metrics
    }

    /// Record one completed operation against an operation class
    pub fn update_operation_metrics(
        &self,
        operation_id: &str,
        success: bool,
        latency_ns: u64,
        bytes: u64,
    ) {
        match self.operation(operation_id) {
            Some(operation) => operation.metrics.record(success, latency_ns, bytes),
            None => warn!("metrics update for unknown operation {operation_id}"),
        }
    }

    /// Count a classified error against an operation class
    pub fn update_operation_error_stats(&self, operation_id: &str, kind: &str) {
        match self.operation(operation_id) {
            Some(operation) => operation.metrics.error_stats.record(kind),
            None => warn!("error stats update for unknown operation {operation_id}"),
        }
    }

    /// Overwrite the system resource gauges
    pub fn update_resource_usage(&self, resource: &ResourceUsageStats) {
        self.system.resource.store_from(resource);
    }

    /// Overwrite the whole system section
    pub fn update_system_metrics(&self, system: &SystemMetrics) {
        self.system.store_from(system);
    }

    /// Shared handle to one connection's metrics
    pub fn connection(&self, connection_id: &str) -> Option<Arc<ConnectionMetrics>> {
        self.connections.lock().unwrap().get(connection_id).cloned()
    }

    /// Shared handle to one operation class's metrics
    pub fn operation(&self, operation_id: &str) -> Option<Arc<OperationMetrics>> {
        self.operations.lock().unwrap().get(operation_id).cloned()
    }

    /// Snapshot of all registered connections
    pub fn connections(&self) -> BTreeMap<String, Arc<ConnectionMetrics>> {
        self.connections.lock().unwrap().clone()
    }

    /// Snapshot of all registered operation classes
    pub fn operations(&self) -> BTreeMap<String, Arc<OperationMetrics>> {
        self.operations.lock().unwrap().clone()
    }

    /// Point-in-time copy of the system section
    pub fn system_metrics(&self) -> SystemMetrics {
        self.system.clone()
    }

    /// Zero one connection's counters, or all of them with `None`. The
    /// registration itself is kept.
    pub fn reset_connection(&self, connection_id: Option<&str>) {
        let connections = self.connections.lock().unwrap();
        match connection_id {
            Some(id) => {
                if let Some(connection) = connections.get(id) {
                    connection.metrics.reset();
                    connection.pool_stats.reset();
                }
            }
            None => {
                for connection in connections.values() {
                    connection.metrics.reset();
                    connection.pool_stats.reset();
                }
            }
        }
    }

    /// Zero one operation class's counters, or all of them with `None`
    pub fn reset_operation(&self, operation_id: Option<&str>) {
        let operations = self.operations.lock().unwrap();
        match operation_id {
            Some(id) => {
                if let Some(operation) = operations.get(id) {
                    operation.metrics.reset();
                }
            }
            None => {
                for operation in operations.values() {
                    operation.metrics.reset();
                }
            }
        }
    }

    /// Zero every registered entity and the system section
    pub fn reset_all(&self) {
        self.reset_connection(None);
        self.reset_operation(None);
        self.system.reset();
    }

    /// Render every registered entity as Prometheus text exposition
    pub fn export_prometheus(&self) -> String {
        PrometheusExporter::export(&self.connections(), &self.operations(), &self.system)
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_update() {
        let monitor = PerformanceMonitor::new();
        monitor.register_connection("c1", "10.0.0.1:9000");
        monitor.update_connection_metrics("c1", true, 1_500_000, 1024);

        let connection = monitor.connection("c1").unwrap();
        assert_eq!(connection.metrics.total_operations.load(Ordering::Relaxed), 1);
        assert_eq!(monitor.system_metrics().active_connections.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let monitor = PerformanceMonitor::new();
        monitor.update_connection_metrics("ghost", true, 1, 1);
        monitor.update_operation_metrics("ghost", true, 1, 1);
        assert!(monitor.connection("ghost").is_none());
    }

    #[test]
    fn test_unregister_underflow_guard() {
        let monitor = PerformanceMonitor::new();
        monitor.register_connection("c1", "addr");
        monitor.unregister_connection("c1");
        monitor.unregister_connection("c1");
        assert_eq!(monitor.system_metrics().active_connections.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_reregister_discards_history() {
        let monitor = PerformanceMonitor::new();
        monitor.register_connection("c1", "addr");
        monitor.update_connection_metrics("c1", true, 1_000, 10);
        monitor.register_connection("c1", "addr");

        let connection = monitor.connection("c1").unwrap();
        assert_eq!(connection.metrics.total_operations.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_reset_keeps_registration() {
        let monitor = PerformanceMonitor::new();
        monitor.register_operation("op1", "read", "tcp");
        monitor.update_operation_metrics("op1", true, 1_000, 10);
        monitor.reset_operation(Some("op1"));

        let operation = monitor.operation("op1").unwrap();
        assert_eq!(operation.metrics.total_operations.load(Ordering::Relaxed), 0);
    }
}
