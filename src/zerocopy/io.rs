//! Vectorized I/O over fragment lists
//!
//! Each operation converts a fragment list into exactly one scatter/gather
//! syscall (`sendmsg`/`recvmsg`/`writev`/`readv`), never one call per
//! fragment. Outcomes feed a set of process-wide transfer counters.

use std::{
    os::unix::io::RawFd,
    sync::atomic::{AtomicU64, Ordering},
};

use super::buffer::{ZeroCopyBuffer, ZeroCopyReadBuffer};

/// Outcome of one vectorized I/O operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroCopyResult {
    /// Bytes moved by the syscall
    pub bytes_transferred: usize,
    /// Whether the syscall succeeded
    pub success: bool,
    /// Native error code when `success` is false, 0 otherwise
    pub error_code: i32,
}

impl ZeroCopyResult {
    fn ok(bytes: usize) -> Self {
        Self {
            bytes_transferred: bytes,
            success: true,
            error_code: 0,
        }
    }

    fn failed(error_code: i32) -> Self {
        Self {
            bytes_transferred: 0,
            success: false,
            error_code,
        }
    }
}

/// Process-wide transfer counters, accumulated lock-free
#[derive(Debug)]
struct TransferStats {
    total_operations: AtomicU64,
    total_bytes_transferred: AtomicU64,
    failed_operations: AtomicU64,
}

static STATS: TransferStats = TransferStats {
    total_operations: AtomicU64::new(0),
    total_bytes_transferred: AtomicU64::new(0),
    failed_operations: AtomicU64::new(0),
};

/// Snapshot of the process-wide transfer counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransferStatsSnapshot {
    /// Successful vectorized operations
    pub total_operations: u64,
    /// Bytes moved by successful operations
    pub total_bytes_transferred: u64,
    /// Mean bytes per successful operation
    pub average_bytes_per_operation: f64,
    /// Operations that returned an error
    pub failed_operations: u64,
}

/// Stateless facade issuing vectorized transfer syscalls.
///
/// Contract: fragments do not copy data. Callers keep the referenced storage
/// alive and unmodified until the call returns.
pub struct ZeroCopyIO;

impl ZeroCopyIO {
    /// Gather-send all fragments over a socket with one `sendmsg` call.
    ///
    /// An empty buffer short-circuits to a zero-byte success without
    /// issuing a syscall.
    pub fn send_msg(socket: RawFd, buffer: &ZeroCopyBuffer, flags: i32) -> ZeroCopyResult {
        if buffer.is_empty() {
            return ZeroCopyResult::ok(0);
        }

        let mut iovecs = gather_iovecs(buffer);
        let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
        msg.msg_iov = iovecs.as_mut_ptr();
        msg.msg_iovlen = iovecs.len() as _;

        let result = unsafe { libc::sendmsg(socket, &msg, flags) };
        record(result)
    }

    /// Scatter-receive from a socket into all targets with one `recvmsg` call
    pub fn recv_msg(socket: RawFd, buffer: &mut ZeroCopyReadBuffer, flags: i32) -> ZeroCopyResult {
        if buffer.is_empty() {
            return ZeroCopyResult::ok(0);
        }

        let mut iovecs = scatter_iovecs(buffer);
        let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
        msg.msg_iov = iovecs.as_mut_ptr();
        msg.msg_iovlen = iovecs.len() as _;

        let result = unsafe { libc::recvmsg(socket, &mut msg, flags) };
        record(result)
    }

    /// Gather-write all fragments to a descriptor with one `writev` call
    pub fn write_v(fd: RawFd, buffer: &ZeroCopyBuffer) -> ZeroCopyResult {
        if buffer.is_empty() {
            return ZeroCopyResult::ok(0);
        }

        let iovecs = gather_iovecs(buffer);
        let result = unsafe { libc::writev(fd, iovecs.as_ptr(), iovecs.len() as _) };
        record(result)
    }

    /// Scatter-read from a descriptor into all targets with one `readv` call
    pub fn read_v(fd: RawFd, buffer: &mut ZeroCopyReadBuffer) -> ZeroCopyResult {
        if buffer.is_empty() {
            return ZeroCopyResult::ok(0);
        }

        let iovecs = scatter_iovecs(buffer);
        let result = unsafe { libc::readv(fd, iovecs.as_ptr(), iovecs.len() as _) };
        record(result)
    }

    /// Check whether the platform supports scatter/gather I/O
    pub fn is_supported() -> bool {
        cfg!(unix)
    }

    /// Get a snapshot of the process-wide transfer counters
    pub fn stats() -> TransferStatsSnapshot {
        let ops = STATS.total_operations.load(Ordering::Relaxed);
        let bytes = STATS.total_bytes_transferred.load(Ordering::Relaxed);
        TransferStatsSnapshot {
            total_operations: ops,
            total_bytes_transferred: bytes,
            average_bytes_per_operation: if ops == 0 {
                0.0
            } else {
                bytes as f64 / ops as f64
            },
            failed_operations: STATS.failed_operations.load(Ordering::Relaxed),
        }
    }

    /// Reset the process-wide transfer counters
    pub fn reset_stats() {
        STATS.total_operations.store(0, Ordering::Relaxed);
        STATS.total_bytes_transferred.store(0, Ordering::Relaxed);
        STATS.failed_operations.store(0, Ordering::Relaxed);
    }
}

fn gather_iovecs(buffer: &ZeroCopyBuffer) -> Vec<libc::iovec> {
    buffer
        .fragments()
        .iter()
        .map(|fragment| libc::iovec {
            iov_base: fragment.as_ptr() as *mut libc::c_void,
            iov_len: fragment.len(),
        })
        .collect()
}

fn scatter_iovecs(buffer: &ZeroCopyReadBuffer) -> Vec<libc::iovec> {
    buffer
        .targets()
        .iter()
        .map(|&(ptr, len)| libc::iovec {
            iov_base: ptr as *mut libc::c_void,
            iov_len: len,
        })
        .collect()
}

fn record(result: isize) -> ZeroCopyResult {
    if result >= 0 {
        let bytes = result as usize;
        STATS.total_operations.fetch_add(1, Ordering::Relaxed);
        STATS
            .total_bytes_transferred
            .fetch_add(bytes as u64, Ordering::Relaxed);
        ZeroCopyResult::ok(bytes)
    } else {
        STATS.failed_operations.fetch_add(1, Ordering::Relaxed);
        let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
        ZeroCopyResult::failed(errno)
    }
}
