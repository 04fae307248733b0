//! Shared-ownership windows into a mapped file

use std::{ptr::NonNull, sync::Arc};

use crate::zerocopy::BufferFragment;

use super::file::MemoryMappedFile;

/// A bounded window into a shared [`MemoryMappedFile`], consumable as a
/// zero-copy transfer fragment.
///
/// The fragment shares ownership of the file: the mapping lives as long as
/// the longest holder. It does not pin the mapping open, though — `unmap()`
/// on any holder invalidates every fragment referencing the file, which
/// `is_valid()` reflects.
#[derive(Debug, Clone)]
pub struct MappedFragment {
    file: Arc<MemoryMappedFile>,
    offset: usize,
    size: usize,
}

impl MappedFragment {
    /// Create a window over `[offset, offset + size)` of the file's mapped
    /// extent. `size` is clamped so the window never exceeds the extent.
    pub fn new(file: Arc<MemoryMappedFile>, offset: usize, size: usize) -> Self {
        let extent = file.len();
        let size = size.min(extent.saturating_sub(offset));
        Self { file, offset, size }
    }

    /// Check that the shared file is still mapped and the window is non-empty
    pub fn is_valid(&self) -> bool {
        self.size > 0 && self.file.is_mapped()
    }

    /// Pointer to the start of the window, `None` when invalid
    pub fn as_ptr(&self) -> Option<NonNull<u8>> {
        if !self.is_valid() {
            return None;
        }
        self.file
            .as_ptr()
            .map(|base| unsafe { NonNull::new_unchecked(base.as_ptr().add(self.offset)) })
    }

    /// Window length in bytes
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if the window is empty
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Window offset within the mapped extent
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The shared underlying file
    pub fn file(&self) -> &Arc<MemoryMappedFile> {
        &self.file
    }

    /// View the window as a transfer fragment, `None` when invalid.
    ///
    /// The fragment is only safe to transfer while the mapping stays alive;
    /// keeping this `MappedFragment` for the duration of the I/O call is the
    /// caller's obligation.
    pub fn as_fragment(&self) -> Option<BufferFragment> {
        self.as_ptr()
            .map(|ptr| unsafe { BufferFragment::from_raw(ptr.as_ptr(), self.size) })
    }
}
