//! Buffer pool manager: per-size pool registry

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use log::debug;

use crate::error::Result;

use super::{
    buffer::PooledBuffer,
    config::{BufferPoolConfig, DEFAULT_BUFFER_SIZE},
    pool::BufferPool,
    stats::PoolStats,
};

/// Registry mapping buffer size to a lazily-created [`BufferPool`], plus one
/// default pool fixed at [`DEFAULT_BUFFER_SIZE`] bytes.
///
/// Construct one per process and pass it by reference to consumers. The
/// manager's mutex only guards map lookup and creation; pools are handed out
/// as `Arc`s so acquire/release never run under the manager lock.
#[derive(Debug)]
pub struct BufferPoolManager {
    pools: Mutex<HashMap<usize, Arc<BufferPool>>>,
    default_pool: Arc<BufferPool>,
}

impl BufferPoolManager {
    /// Create a manager with its default 4096-byte pool
    pub fn new() -> Result<Self> {
        let default_pool = Arc::new(BufferPool::new(BufferPoolConfig::default())?);
        Ok(Self {
            pools: Mutex::new(HashMap::new()),
            default_pool,
        })
    }

    /// Get the pool for a buffer size, creating it on first use.
    ///
    /// Idempotent: the same size always resolves to the same pool instance
    /// for the life of the manager.
    pub fn pool(&self, buffer_size: usize) -> Result<Arc<BufferPool>> {
        if buffer_size == DEFAULT_BUFFER_SIZE {
            return Ok(Arc::clone(&self.default_pool));
        }

        let mut pools = self.pools.lock().unwrap();
        if let Some(pool) = pools.get(&buffer_size) {
            return Ok(Arc::clone(pool));
        }

        let pool = Arc::new(BufferPool::new(BufferPoolConfig::new(buffer_size))?);
        pools.insert(buffer_size, Arc::clone(&pool));
        debug!("created buffer pool for {} byte buffers", buffer_size);
        Ok(pool)
    }

    /// Get the default pool
    pub fn default_pool(&self) -> Arc<BufferPool> {
        Arc::clone(&self.default_pool)
    }

    /// Acquire a buffer of the requested size from the matching pool
    pub fn acquire(&self, buffer_size: usize) -> Result<PooledBuffer> {
        Ok(self.pool(buffer_size)?.acquire())
    }

    /// Release a buffer back to the pool matching its size.
    ///
    /// Heap-fallback buffers are simply freed.
    pub fn release(&self, buffer: PooledBuffer) -> Result<()> {
        if !buffer.is_pooled() {
            return Ok(());
        }
        let pool = self.pool(buffer.size())?;
        pool.release(buffer);
        Ok(())
    }

    /// Collect statistics for the default pool and every per-size pool
    pub fn all_stats(&self) -> Vec<PoolStats> {
        let pools = self.pools.lock().unwrap();
        let mut stats = Vec::with_capacity(pools.len() + 1);
        stats.push(self.default_pool.stats());
        for pool in pools.values() {
            stats.push(pool.stats());
        }
        stats
    }
}
