//! Non-owning buffer fragments

/// A non-owning `(pointer, length)` view over caller storage.
///
/// Valid only while the referenced storage is alive and unmodified for the
/// duration of an I/O call; the fragment itself never copies or frees data.
#[derive(Debug, Clone, Copy)]
pub struct BufferFragment {
    data: *const u8,
    len: usize,
}

impl BufferFragment {
    /// Create a fragment from raw parts.
    ///
    /// # Safety
    /// `data` must point to `len` readable bytes that outlive every I/O call
    /// the fragment participates in.
    pub unsafe fn from_raw(data: *const u8, len: usize) -> Self {
        Self { data, len }
    }

    /// Create a fragment borrowing a byte slice
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: bytes.as_ptr(),
            len: bytes.len(),
        }
    }

    /// Get the data pointer
    pub fn as_ptr(&self) -> *const u8 {
        self.data
    }

    /// Get the fragment length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the fragment is empty or null
    pub fn is_empty(&self) -> bool {
        self.data.is_null() || self.len == 0
    }
}
