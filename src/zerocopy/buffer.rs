//! Fragment lists for scatter/gather transfer

use super::fragment::BufferFragment;

/// An ordered list of non-owning fragments for gather writes.
///
/// Fragments are transferred in insertion order by a single vectorized
/// syscall. Null or zero-length inputs are silently ignored.
#[derive(Debug, Default)]
pub struct ZeroCopyBuffer {
    fragments: Vec<BufferFragment>,
}

impl ZeroCopyBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment; null or zero-length fragments are a no-op
    pub fn add_fragment(&mut self, fragment: BufferFragment) {
        if !fragment.is_empty() {
            self.fragments.push(fragment);
        }
    }

    /// Append a fragment borrowing a byte slice
    pub fn add_slice(&mut self, bytes: &[u8]) {
        self.add_fragment(BufferFragment::from_slice(bytes));
    }

    /// Append a fragment from raw parts.
    ///
    /// # Safety
    /// See [`BufferFragment::from_raw`].
    pub unsafe fn add_raw(&mut self, data: *const u8, len: usize) {
        self.add_fragment(BufferFragment::from_raw(data, len));
    }

    /// Get all fragments in transfer order
    pub fn fragments(&self) -> &[BufferFragment] {
        &self.fragments
    }

    /// Sum of all fragment lengths
    pub fn total_size(&self) -> usize {
        self.fragments.iter().map(|f| f.len()).sum()
    }

    /// Number of fragments
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Check if the buffer holds no fragments
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Remove all fragments
    pub fn clear(&mut self) {
        self.fragments.clear();
    }
}

/// An ordered list of writable targets for scatter reads.
///
/// Mirrors [`ZeroCopyBuffer`] for the receive direction: one vectorized
/// syscall fills the targets in insertion order.
#[derive(Debug, Default)]
pub struct ZeroCopyReadBuffer {
    targets: Vec<(*mut u8, usize)>,
}

impl ZeroCopyReadBuffer {
    /// Create an empty read buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a read target; null or zero-length targets are a no-op.
    ///
    /// # Safety
    /// `data` must point to `len` writable bytes that outlive every I/O call
    /// the target participates in.
    pub unsafe fn add_target_raw(&mut self, data: *mut u8, len: usize) {
        if !data.is_null() && len > 0 {
            self.targets.push((data, len));
        }
    }

    /// Append a read target borrowing a mutable byte slice
    pub fn add_target(&mut self, bytes: &mut [u8]) {
        if !bytes.is_empty() {
            self.targets.push((bytes.as_mut_ptr(), bytes.len()));
        }
    }

    /// Get all targets in fill order
    pub fn targets(&self) -> &[(*mut u8, usize)] {
        &self.targets
    }

    /// Sum of all target lengths
    pub fn total_size(&self) -> usize {
        self.targets.iter().map(|(_, len)| len).sum()
    }

    /// Number of targets
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Check if the buffer holds no targets
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Remove all targets
    pub fn clear(&mut self) {
        self.targets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_size_sums_fragments() {
        let a = [1u8; 10];
        let b = [2u8; 22];

        let mut buffer = ZeroCopyBuffer::new();
        buffer.add_slice(&a);
        buffer.add_slice(&b);

        assert_eq!(buffer.fragment_count(), 2);
        assert_eq!(buffer.total_size(), 32);
    }

    #[test]
    fn test_null_and_empty_fragments_ignored() {
        let mut buffer = ZeroCopyBuffer::new();
        buffer.add_slice(&[]);
        unsafe { buffer.add_raw(std::ptr::null(), 16) };

        assert!(buffer.is_empty());
        assert_eq!(buffer.fragment_count(), 0);
        assert_eq!(buffer.total_size(), 0);
    }

    #[test]
    fn test_read_targets_ignored_when_empty() {
        let mut buffer = ZeroCopyReadBuffer::new();
        let mut empty: [u8; 0] = [];
        buffer.add_target(&mut empty);
        unsafe { buffer.add_target_raw(std::ptr::null_mut(), 8) };

        assert_eq!(buffer.target_count(), 0);

        let mut data = [0u8; 16];
        buffer.add_target(&mut data);
        assert_eq!(buffer.target_count(), 1);
        assert_eq!(buffer.total_size(), 16);
    }
}
