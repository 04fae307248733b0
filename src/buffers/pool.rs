//! Buffer pool implementation

use std::{collections::VecDeque, ptr::NonNull, sync::Mutex};

use log::debug;

use crate::error::Result;

use super::{buffer::PooledBuffer, config::BufferPoolConfig, stats::PoolStats};

/// State guarded by the pool mutex.
///
/// Invariant: every pointer in `available` is also in `allocated`, and
/// `allocated.len() <= config.max_pool_size`. Heap-fallback blocks handed out
/// past the cap are never tracked here.
#[derive(Debug)]
struct PoolState {
    available: VecDeque<NonNull<u8>>,
    allocated: Vec<NonNull<u8>>,
    in_use: usize,
}

/// A per-size allocator and recycler of [`PooledBuffer`]s.
///
/// `acquire` never blocks and never fails: when the free queue is empty the
/// pool grows up to `max_pool_size`, and past that it falls back to plain
/// heap allocation (availability over bound).
///
/// All pool-tracked blocks live as long as the pool itself. Callers must
/// release or drop every acquired buffer before dropping the pool.
#[derive(Debug)]
pub struct BufferPool {
    config: BufferPoolConfig,
    state: Mutex<PoolState>,
}

impl BufferPool {
    /// Create a new buffer pool, pre-allocating `initial_pool_size` blocks
    pub fn new(config: BufferPoolConfig) -> Result<Self> {
        config.validate()?;

        let mut state = PoolState {
            available: VecDeque::with_capacity(config.initial_pool_size),
            allocated: Vec::with_capacity(config.initial_pool_size),
            in_use: 0,
        };

        for _ in 0..config.initial_pool_size {
            let block = allocate_block(config.buffer_size);
            state.allocated.push(block);
            state.available.push_back(block);
        }

        Ok(Self {
            config,
            state: Mutex::new(state),
        })
    }

    /// Acquire a buffer.
    ///
    /// Pops the free queue, growing the pool first when it is empty and under
    /// `max_pool_size`. A pool at its cap hands out an untracked heap buffer
    /// with `is_pooled() == false` instead of waiting.
    pub fn acquire(&self) -> PooledBuffer {
        let mut state = self.state.lock().unwrap();

        if state.available.is_empty() && state.allocated.len() < self.config.max_pool_size {
            self.grow_locked(&mut state);
        }

        if let Some(block) = state.available.pop_front() {
            state.in_use += 1;
            return PooledBuffer::new(block, self.config.buffer_size, true);
        }

        // Pool exhausted: untracked heap fallback, exempt from the pool bound
        let block = allocate_block(self.config.buffer_size);
        PooledBuffer::new(block, self.config.buffer_size, false)
    }

    /// Release a buffer.
    ///
    /// Pooled buffers are optionally zero-filled and pushed back onto the
    /// free queue; heap-fallback buffers are freed immediately and never
    /// touch the pool's bookkeeping.
    pub fn release(&self, buffer: PooledBuffer) {
        if !buffer.is_pooled() {
            return;
        }

        let size = buffer.size();
        let block = buffer.into_raw();

        if self.config.enable_zero_init {
            unsafe {
                std::ptr::write_bytes(block.as_ptr(), 0, size);
            }
        }

        let mut state = self.state.lock().unwrap();
        state.available.push_back(block);
        state.in_use = state.in_use.saturating_sub(1);
    }

    /// Get a snapshot of the pool's state
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock().unwrap();
        PoolStats {
            total_buffers: state.allocated.len(),
            available_buffers: state.available.len(),
            in_use_buffers: state.in_use,
            buffer_size: self.config.buffer_size,
            total_memory: state.allocated.len() * self.config.buffer_size,
        }
    }

    /// Get the pool configuration
    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }

    fn grow_locked(&self, state: &mut PoolState) {
        let grow_count = self
            .config
            .grow_step
            .min(self.config.max_pool_size - state.allocated.len());

        for _ in 0..grow_count {
            let block = allocate_block(self.config.buffer_size);
            state.allocated.push(block);
            state.available.push_back(block);
        }

        debug!(
            "buffer pool grew by {} blocks ({} byte buffers, {} total)",
            grow_count,
            self.config.buffer_size,
            state.allocated.len()
        );
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap();
        for block in state.allocated.drain(..) {
            unsafe {
                drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    block.as_ptr(),
                    self.config.buffer_size,
                )));
            }
        }
    }
}

unsafe impl Send for BufferPool {}
unsafe impl Sync for BufferPool {}

fn allocate_block(size: usize) -> NonNull<u8> {
    let block = vec![0u8; size].into_boxed_slice();
    // into_raw never returns null for a non-zero-length allocation
    unsafe { NonNull::new_unchecked(Box::into_raw(block) as *mut u8) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_returns_configured_size() {
        let pool = BufferPool::new(BufferPoolConfig::new(512)).unwrap();
        let buffer = pool.acquire();
        assert_eq!(buffer.size(), 512);
        assert!(buffer.is_pooled());
        pool.release(buffer);
    }

    #[test]
    fn test_growth_capped_at_max() {
        let config = BufferPoolConfig::new(64)
            .with_initial_pool_size(1)
            .with_max_pool_size(3)
            .with_grow_step(8);
        let pool = BufferPool::new(config).unwrap();

        let buffers: Vec<_> = (0..3).map(|_| pool.acquire()).collect();
        assert!(buffers.iter().all(|b| b.is_pooled()));
        assert_eq!(pool.stats().total_buffers, 3);

        // Fourth acquisition must fall back to the heap
        let overflow = pool.acquire();
        assert!(!overflow.is_pooled());
        assert_eq!(pool.stats().total_buffers, 3);

        for buffer in buffers {
            pool.release(buffer);
        }
        pool.release(overflow);
    }

    #[test]
    fn test_zero_init_on_release() {
        let config = BufferPoolConfig::new(32)
            .with_initial_pool_size(1)
            .with_zero_init(true);
        let pool = BufferPool::new(config).unwrap();

        let mut buffer = pool.acquire();
        buffer.as_mut_slice().fill(0xAB);
        pool.release(buffer);

        let buffer = pool.acquire();
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
        pool.release(buffer);
    }
}
