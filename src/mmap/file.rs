//! Cross-platform memory-mapped file wrapper

use std::{
    fs::{File, OpenOptions},
    path::Path,
    ptr::NonNull,
    sync::Mutex,
};

use log::warn;
use memmap2::{Mmap, MmapMut, MmapOptions, UncheckedAdvice};

use crate::error::{HelianthusError, Result};

/// Access mode for a memory mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingMode {
    /// Read-only mapping
    ReadOnly,
    /// Read-write shared mapping
    ReadWrite,
}

/// Access-pattern advisories forwarded to the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceMode {
    Normal,
    Sequential,
    Random,
    WillNeed,
    DontNeed,
}

enum MapInner {
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

impl MapInner {
    fn as_ptr(&self) -> *const u8 {
        match self {
            MapInner::ReadOnly(m) => m.as_ptr(),
            MapInner::ReadWrite(m) => m.as_ptr(),
        }
    }

    fn advise_range(&self, advice: memmap2::Advice, offset: usize, len: usize) -> std::io::Result<()> {
        match self {
            MapInner::ReadOnly(m) => m.advise_range(advice, offset, len),
            MapInner::ReadWrite(m) => m.advise_range(advice, offset, len),
        }
    }

    /// MADV_DONTNEED may discard dirty pages, hence the unchecked path
    fn dont_need_range(&self, offset: usize, len: usize) -> std::io::Result<()> {
        unsafe {
            match self {
                MapInner::ReadOnly(m) => m.unchecked_advise_range(UncheckedAdvice::DontNeed, offset, len),
                MapInner::ReadWrite(m) => {
                    m.unchecked_advise_range(UncheckedAdvice::DontNeed, offset, len)
                }
            }
        }
    }
}

struct MapState {
    inner: Option<MapInner>,
    /// Caller-visible window length (requested, not aligned)
    len: usize,
    /// Distance from the aligned mapping start to the requested offset
    delta: usize,
    mode: MappingMode,
}

/// A wrapper around one OS memory mapping.
///
/// `map` is reentrant: any existing mapping on the instance is torn down
/// first. The mapping platform seam (per-OS map/unmap/advise/sync) is
/// delegated to `memmap2`.
///
/// Instances are shared through `Arc` by [`MappedFragment`] holders, and
/// `unmap` on *any* holder invalidates the mapping for all of them; reading
/// a fragment after another holder unmapped is the caller's obligation to
/// avoid. Internal state transitions are mutex-guarded so `&self` unmap
/// through a shared handle stays sound.
///
/// [`MappedFragment`]: super::fragment::MappedFragment
pub struct MemoryMappedFile {
    state: Mutex<MapState>,
}

impl MemoryMappedFile {
    /// Create an unmapped instance
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MapState {
                inner: None,
                len: 0,
                delta: 0,
                mode: MappingMode::ReadOnly,
            }),
        }
    }

    /// Map a window of a file into memory.
    ///
    /// `length == 0` maps from `offset` to the end of the file. The offset
    /// is aligned down to the allocation granularity internally; `len()` and
    /// `as_ptr()` still reflect the caller's requested window.
    pub fn map(
        &self,
        path: impl AsRef<Path>,
        mode: MappingMode,
        offset: usize,
        length: usize,
    ) -> Result<()> {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap();

        // Reentrant: tear down any prior mapping first
        state.inner = None;
        state.len = 0;
        state.delta = 0;

        let file = open_for_mode(path, mode).map_err(|e| {
            warn!("failed to open {} for mapping: {}", path.display(), e);
            HelianthusError::mapping(path.display().to_string(), e.to_string())
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| HelianthusError::mapping(path.display().to_string(), e.to_string()))?
            .len() as usize;

        let length = if length == 0 {
            file_size.checked_sub(offset).ok_or_else(|| {
                HelianthusError::mapping(
                    path.display().to_string(),
                    "offset exceeds file size",
                )
            })?
        } else {
            length
        };

        if offset + length > file_size {
            return Err(HelianthusError::mapping(
                path.display().to_string(),
                "mapping range exceeds file size",
            ));
        }

        if length == 0 {
            return Err(HelianthusError::mapping(
                path.display().to_string(),
                "cannot map an empty range",
            ));
        }

        // Align the offset down to the allocation granularity and remember
        // the delta; the caller keeps seeing the unaligned window.
        let granularity = allocation_granularity();
        let aligned_offset = offset - offset % granularity;
        let delta = offset - aligned_offset;
        let map_len = length + delta;

        let inner = match mode {
            MappingMode::ReadOnly => unsafe {
                MmapOptions::new()
                    .offset(aligned_offset as u64)
                    .len(map_len)
                    .map(&file)
                    .map(MapInner::ReadOnly)
            },
            MappingMode::ReadWrite => unsafe {
                MmapOptions::new()
                    .offset(aligned_offset as u64)
                    .len(map_len)
                    .map_mut(&file)
                    .map(MapInner::ReadWrite)
            },
        }
        .map_err(|e| {
            warn!("mmap failed for {}: {}", path.display(), e);
            HelianthusError::mapping(path.display().to_string(), e.to_string())
        })?;

        state.inner = Some(inner);
        state.len = length;
        state.delta = delta;
        state.mode = mode;
        Ok(())
    }

    /// Release the mapping. Visible to every `Arc` holder sharing this file.
    pub fn unmap(&self) {
        let mut state = self.state.lock().unwrap();
        state.inner = None;
        state.len = 0;
        state.delta = 0;
    }

    /// Check whether a mapping is active
    pub fn is_mapped(&self) -> bool {
        self.state.lock().unwrap().inner.is_some()
    }

    /// Length of the mapped window (0 when unmapped)
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().len
    }

    /// Check whether nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pointer to the start of the requested window, `None` when unmapped.
    ///
    /// The pointer stays valid until any holder calls `unmap` or remaps.
    pub fn as_ptr(&self) -> Option<NonNull<u8>> {
        let state = self.state.lock().unwrap();
        state
            .inner
            .as_ref()
            .and_then(|inner| NonNull::new(unsafe { inner.as_ptr().add(state.delta) } as *mut u8))
    }

    /// Flush a writable mapping to disk
    pub fn sync(&self, async_flush: bool) -> Result<()> {
        let state = self.state.lock().unwrap();
        match state.inner.as_ref() {
            Some(MapInner::ReadWrite(m)) => {
                let result = if async_flush {
                    m.flush_async()
                } else {
                    m.flush()
                };
                result.map_err(|e| HelianthusError::from_io(e, "Failed to sync mapping"))
            }
            Some(MapInner::ReadOnly(_)) => Ok(()),
            None => Err(HelianthusError::memory("sync on unmapped file")),
        }
    }

    /// Ask the OS to fault in a range ahead of use (`length == 0` means to
    /// the end of the window)
    pub fn prefetch(&self, offset: usize, length: usize) -> Result<()> {
        self.advise_window(offset, length, |inner, off, len| {
            inner.advise_range(memmap2::Advice::WillNeed, off, len)
        })
    }

    /// Forward an access-pattern advisory for a range of the window
    pub fn advise(&self, mode: AdviceMode, offset: usize, length: usize) -> Result<()> {
        self.advise_window(offset, length, move |inner, off, len| match mode {
            AdviceMode::Normal => inner.advise_range(memmap2::Advice::Normal, off, len),
            AdviceMode::Sequential => inner.advise_range(memmap2::Advice::Sequential, off, len),
            AdviceMode::Random => inner.advise_range(memmap2::Advice::Random, off, len),
            AdviceMode::WillNeed => inner.advise_range(memmap2::Advice::WillNeed, off, len),
            AdviceMode::DontNeed => inner.dont_need_range(off, len),
        })
    }

    /// Size of a file on disk without mapping it
    pub fn file_size(path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| HelianthusError::mapping(path.display().to_string(), e.to_string()))
    }

    /// Check whether the platform supports memory mapping
    pub fn is_supported() -> bool {
        cfg!(unix)
    }

    fn advise_window<F>(&self, offset: usize, length: usize, f: F) -> Result<()>
    where
        F: FnOnce(&MapInner, usize, usize) -> std::io::Result<()>,
    {
        let state = self.state.lock().unwrap();
        let inner = state
            .inner
            .as_ref()
            .ok_or_else(|| HelianthusError::memory("advise on unmapped file"))?;

        let length = if length == 0 {
            state.len.saturating_sub(offset)
        } else {
            length
        };

        if offset + length > state.len {
            return Err(HelianthusError::invalid_parameter(
                "offset",
                "advisory range exceeds mapped window",
            ));
        }

        // Window offsets are relative to the requested start, the OS range
        // is relative to the aligned mapping start
        f(inner, state.delta + offset, length)
            .map_err(|e| HelianthusError::from_io(e, "madvise failed"))
    }
}

impl Default for MemoryMappedFile {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryMappedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("MemoryMappedFile")
            .field("mapped", &state.inner.is_some())
            .field("len", &state.len)
            .field("mode", &state.mode)
            .finish()
    }
}

unsafe impl Send for MemoryMappedFile {}
unsafe impl Sync for MemoryMappedFile {}

fn open_for_mode(path: &Path, mode: MappingMode) -> std::io::Result<File> {
    match mode {
        MappingMode::ReadOnly => File::open(path),
        MappingMode::ReadWrite => OpenOptions::new().read(true).write(true).open(path),
    }
}

fn allocation_granularity() -> usize {
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page > 0 {
        page as usize
    } else {
        4096
    }
}
