//! Buffer management and memory pools
//!
//! This module provides recycled fixed-size buffers for high-throughput
//! network transfer. Acquisition never blocks and never fails: exhausted
//! pools degrade to plain heap allocation instead of stalling the caller.

pub mod buffer;
pub mod config;
pub mod manager;
pub mod pool;
pub mod stats;

// Re-export main types
pub use buffer::PooledBuffer;
pub use config::{BufferPoolConfig, DEFAULT_BUFFER_SIZE};
pub use manager::BufferPoolManager;
pub use pool::BufferPool;
pub use stats::PoolStats;
