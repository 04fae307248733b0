//! Pooled buffer handle

use std::{mem, ptr::NonNull, slice};

/// A movable handle to a fixed-size memory block.
///
/// Pooled buffers borrow a block owned by their [`BufferPool`] and must be
/// handed back through [`BufferPool::release`]; the block outlives the handle
/// but not the pool. Heap-fallback buffers (`is_pooled() == false`) own their
/// allocation and free it when dropped.
///
/// Using a pooled buffer after its owning pool has been destroyed is
/// undefined behavior; the pool documents this caller obligation.
///
/// [`BufferPool`]: super::pool::BufferPool
/// [`BufferPool::release`]: super::pool::BufferPool::release
#[derive(Debug)]
pub struct PooledBuffer {
    data: NonNull<u8>,
    size: usize,
    pooled: bool,
}

impl PooledBuffer {
    pub(crate) fn new(data: NonNull<u8>, size: usize, pooled: bool) -> Self {
        Self { data, size, pooled }
    }

    /// Get a raw pointer to the buffer data
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Get a mutable raw pointer to the buffer data
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_ptr()
    }

    /// Get the buffer as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.size) }
    }

    /// Get the buffer as a mutable byte slice
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.size) }
    }

    /// Get the size of the buffer in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Check whether the buffer came from a pool
    pub fn is_pooled(&self) -> bool {
        self.pooled
    }

    /// Zero the buffer contents for reuse
    pub fn reset(&mut self) {
        unsafe {
            std::ptr::write_bytes(self.data.as_ptr(), 0, self.size);
        }
    }

    /// Consume the handle and return the raw block pointer without freeing.
    /// Used by the pool when recycling.
    pub(crate) fn into_raw(self) -> NonNull<u8> {
        let ptr = self.data;
        mem::forget(self);
        ptr
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // Pool-owned blocks stay with the pool; a dropped handle simply never
        // returns to the free queue. Heap-fallback blocks are freed here.
        if !self.pooled {
            unsafe {
                drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    self.data.as_ptr(),
                    self.size,
                )));
            }
        }
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsMut<[u8]> for PooledBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

unsafe impl Send for PooledBuffer {}
