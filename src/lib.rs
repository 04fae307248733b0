//! # Helianthus-IO - Zero-Copy I/O Substrate
//!
//! Helianthus-IO is the buffer and transfer layer underlying an asynchronous
//! network transport: pooled buffer recycling, scatter/gather vectorized
//! transfer, memory-mapped large-file access and the performance metrics that
//! measure all of it.
//!
//! ## Features
//!
//! - **Buffer pools**: fixed-size recycled buffers with heap fallback under
//!   pressure, so acquisition never blocks and never fails
//! - **Scatter/gather I/O**: one vectorized syscall over an ordered fragment
//!   list, no data copies
//! - **Memory-mapped files**: shared, window-clamped fragments over a single
//!   mapping with prefetch and access advisories
//! - **Transfer optimization**: file-size-tiered chunk/concurrency/mapping
//!   strategy selection
//! - **Performance monitoring**: lock-free counters, CAS running extrema,
//!   latency percentiles and Prometheus text exposition
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 Helianthus-IO                    │
//! ├──────────────────────────────────────────────────┤
//! │  Buffer layer            │  Transfer layer       │
//! │  - Buffer pools          │  - Fragment lists     │
//! │  - Pool manager          │  - sendmsg/recvmsg    │
//! │  - Mapped files          │  - writev/readv       │
//! ├──────────────────────────────────────────────────┤
//! │  Metrics: monitor, histograms, Prometheus export │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! This crate provides no event loop, no encryption and no cancellation or
//! timeout semantics; those belong to the transport layer built on top of it.

pub mod buffers;
pub mod error;
pub mod metrics;
pub mod mmap;
pub mod zerocopy;

// Re-export commonly used types
pub use buffers::{BufferPool, BufferPoolConfig, BufferPoolManager, PoolStats, PooledBuffer};
pub use error::{HelianthusError, Result};
pub use metrics::{
    ConnectionMetrics, LatencyHistogram, OperationMetrics, PerformanceMetrics, PerformanceMonitor,
    PrometheusExporter, SystemMetrics,
};
pub use mmap::{
    AdviceMode, MappedFragment, MappingMode, MemoryInfo, MemoryMappedFile, TransferConfig,
    TransferOptimizer,
};
pub use zerocopy::{BufferFragment, ZeroCopyBuffer, ZeroCopyIO, ZeroCopyReadBuffer, ZeroCopyResult};
