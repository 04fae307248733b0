//! Zero-copy scatter/gather transfer
//!
//! Non-owning fragment lists assembled into one vectorized syscall per
//! transfer. Data is passed by reference; callers keep the referenced
//! storage alive and unmodified until the call returns.

pub mod buffer;
pub mod fragment;
pub mod io;

// Re-export main types
pub use buffer::{ZeroCopyBuffer, ZeroCopyReadBuffer};
pub use fragment::BufferFragment;
pub use io::{TransferStatsSnapshot, ZeroCopyIO, ZeroCopyResult};
