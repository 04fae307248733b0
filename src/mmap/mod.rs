//! Memory-mapped file access and large-file transfer optimization
//!
//! One OS mapping per [`MemoryMappedFile`], shared across bounded
//! [`MappedFragment`] windows for zero-copy transfer. The
//! [`TransferOptimizer`] picks chunk size, concurrency and mapping strategy
//! from file size and system memory.

pub mod file;
pub mod fragment;
pub mod optimizer;

// Re-export main types
pub use file::{AdviceMode, MappingMode, MemoryMappedFile};
pub use fragment::MappedFragment;
pub use optimizer::{MemoryInfo, TransferConfig, TransferOptimizer};
