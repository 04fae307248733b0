//! Large-file transfer strategy selection

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{
    file::{AdviceMode, MappingMode, MemoryMappedFile},
    fragment::MappedFragment,
};

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;

/// Minimum file size worth the mapping overhead
const MIN_MAPPING_SIZE: usize = 64 * KIB;

/// Chunking and mapping strategy for one transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Size of each transfer chunk in bytes
    pub chunk_size: usize,
    /// Maximum chunks in flight
    pub max_concurrent_chunks: usize,
    /// Map the file instead of streaming it
    pub use_memory_mapping: bool,
    /// Prefetch the leading chunks after mapping
    pub use_prefetch: bool,
    /// Issue a sequential-access advisory after mapping
    pub use_sequential_access: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * KIB,
            max_concurrent_chunks: 4,
            use_memory_mapping: true,
            use_prefetch: true,
            use_sequential_access: true,
        }
    }
}

/// System memory totals used by mapping policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_physical_memory: usize,
    pub available_physical_memory: usize,
    pub total_virtual_memory: usize,
    pub available_virtual_memory: usize,
}

impl MemoryInfo {
    /// Query the host's memory totals.
    ///
    /// Virtual totals are estimated at twice physical; POSIX has no cheap
    /// portable query for them.
    pub fn query() -> Self {
        let page_size = sysconf(libc::_SC_PAGESIZE);
        let total_pages = sysconf(libc::_SC_PHYS_PAGES);
        let available_pages = sysconf(libc::_SC_AVPHYS_PAGES);

        let total_physical_memory = page_size.saturating_mul(total_pages);
        let available_physical_memory = page_size.saturating_mul(available_pages);

        Self {
            total_physical_memory,
            available_physical_memory,
            total_virtual_memory: total_physical_memory.saturating_mul(2),
            available_virtual_memory: available_physical_memory.saturating_mul(2),
        }
    }
}

/// Policy engine choosing chunk size, concurrency and mapping strategy from
/// file size and system memory, and materializing fragment lists over a
/// single shared mapping.
pub struct TransferOptimizer;

impl TransferOptimizer {
    /// Select the transfer configuration for a file size.
    ///
    /// Three tiers: small files stream in 16 KiB chunks, mid-size files map
    /// with 64 KiB chunks, large files map with 256 KiB chunks and more
    /// concurrency.
    pub fn optimal_config(file_size: usize) -> TransferConfig {
        let mut config = TransferConfig::default();

        if file_size < MIB {
            config.chunk_size = 16 * KIB;
            config.max_concurrent_chunks = 2;
            config.use_memory_mapping = false;
        } else if file_size < 100 * MIB {
            config.chunk_size = 64 * KIB;
            config.max_concurrent_chunks = 4;
            config.use_memory_mapping = true;
        } else {
            config.chunk_size = 256 * KIB;
            config.max_concurrent_chunks = 8;
            config.use_memory_mapping = true;
        }

        config
    }

    /// Decide whether a file of this size should be memory-mapped: not below
    /// 64 KiB (overhead unjustified), not above half the available physical
    /// memory (paging pressure).
    pub fn should_use_memory_mapping(file_size: usize) -> bool {
        if file_size < MIN_MAPPING_SIZE {
            return false;
        }
        if file_size > MemoryInfo::query().available_physical_memory / 2 {
            return false;
        }
        true
    }

    /// Map a file once and slice the mapping into contiguous chunk-size
    /// fragments sharing one underlying mapping.
    ///
    /// Returns `Ok(empty)` when mapping is disabled or disallowed for this
    /// file: that is the designed signal for the caller to fall back to a
    /// streaming read path, not an error. I/O and mapping failures are `Err`.
    pub fn create_optimized_fragments(
        path: impl AsRef<Path>,
        config: &TransferConfig,
    ) -> Result<Vec<MappedFragment>> {
        let path = path.as_ref();
        let file_size = MemoryMappedFile::file_size(path)? as usize;

        if file_size == 0
            || !config.use_memory_mapping
            || !Self::should_use_memory_mapping(file_size)
        {
            return Ok(Vec::new());
        }

        // One mapping for the whole file; remapping per chunk is disallowed
        let file = Arc::new(MemoryMappedFile::new());
        file.map(path, MappingMode::ReadOnly, 0, 0)?;

        // Advisories are hints; their failure never fails the transfer
        if config.use_sequential_access {
            let _ = file.advise(AdviceMode::Sequential, 0, 0);
        }
        if config.use_prefetch {
            let prefetch_len = (config.chunk_size * config.max_concurrent_chunks).min(file_size);
            let _ = file.prefetch(0, prefetch_len);
        }

        let mut fragments = Vec::with_capacity(file_size.div_ceil(config.chunk_size));
        let mut offset = 0;
        while offset < file_size {
            let chunk = config.chunk_size.min(file_size - offset);
            fragments.push(MappedFragment::new(Arc::clone(&file), offset, chunk));
            offset += chunk;
        }

        Ok(fragments)
    }
}

fn sysconf(name: libc::c_int) -> usize {
    let value = unsafe { libc::sysconf(name) };
    if value > 0 {
        value as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let small = TransferOptimizer::optimal_config(500_000);
        assert_eq!(small.chunk_size, 16 * KIB);
        assert_eq!(small.max_concurrent_chunks, 2);
        assert!(!small.use_memory_mapping);

        let medium = TransferOptimizer::optimal_config(10_000_000);
        assert_eq!(medium.chunk_size, 64 * KIB);
        assert_eq!(medium.max_concurrent_chunks, 4);
        assert!(medium.use_memory_mapping);

        let large = TransferOptimizer::optimal_config(200_000_000);
        assert_eq!(large.chunk_size, 256 * KIB);
        assert_eq!(large.max_concurrent_chunks, 8);
        assert!(large.use_memory_mapping);
    }

    #[test]
    fn test_small_files_never_mapped() {
        assert!(!TransferOptimizer::should_use_memory_mapping(63 * KIB));
        assert!(!TransferOptimizer::should_use_memory_mapping(1));
    }

    #[test]
    fn test_memory_info_query() {
        let info = MemoryInfo::query();
        assert!(info.total_physical_memory > 0);
        assert!(info.available_physical_memory <= info.total_physical_memory);
    }
}
