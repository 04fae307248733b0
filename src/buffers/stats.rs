//! Buffer pool statistics

/// Snapshot of a pool's state for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of pool-tracked blocks ever allocated
    pub total_buffers: usize,
    /// Number of blocks currently in the free queue
    pub available_buffers: usize,
    /// Number of pooled buffers currently held by callers
    pub in_use_buffers: usize,
    /// Configured size of each buffer in bytes
    pub buffer_size: usize,
    /// Memory held by all pool-tracked blocks
    pub total_memory: usize,
}

impl PoolStats {
    /// Fraction of tracked blocks currently in use (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.total_buffers == 0 {
            return 0.0;
        }
        self.in_use_buffers as f64 / self.total_buffers as f64
    }
}
