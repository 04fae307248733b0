//! Integration tests for buffer pool acquisition, recycling and the
//! per-size pool manager

use std::sync::Arc;

use helianthus_io::{BufferPool, BufferPoolConfig, BufferPoolManager};

#[test]
fn test_acquire_release_cycle() {
    let config = BufferPoolConfig::new(1024)
        .with_initial_pool_size(4)
        .with_max_pool_size(16);
    let pool = BufferPool::new(config).unwrap();

    let mut first = pool.acquire();
    let mut second = pool.acquire();
    assert_eq!(first.size(), 1024);
    assert_eq!(second.size(), 1024);

    // Distinct payloads prove the buffers are distinct storage
    first.as_mut_slice().fill(0x11);
    second.as_mut_slice().fill(0x22);
    assert!(first.as_slice().iter().all(|&b| b == 0x11));
    assert!(second.as_slice().iter().all(|&b| b == 0x22));

    let stats = pool.stats();
    assert_eq!(stats.in_use_buffers, 2);
    assert_eq!(stats.available_buffers, 2);

    pool.release(first);
    pool.release(second);

    let stats = pool.stats();
    assert_eq!(stats.available_buffers, 4);
    assert_eq!(stats.in_use_buffers, 0);
    assert_eq!(stats.total_buffers, 4);
}

#[test]
fn test_heap_fallback_past_pool_cap() {
    let config = BufferPoolConfig::new(256)
        .with_initial_pool_size(1)
        .with_max_pool_size(1);
    let pool = BufferPool::new(config).unwrap();

    let pooled = pool.acquire();
    assert!(pooled.is_pooled());

    // Cap reached: acquisition still succeeds, just untracked
    let fallback = pool.acquire();
    assert!(!fallback.is_pooled());
    assert_eq!(fallback.size(), 256);

    let before = pool.stats();
    pool.release(fallback);
    let after = pool.stats();
    assert_eq!(before.total_buffers, after.total_buffers);
    assert_eq!(before.available_buffers, after.available_buffers);

    pool.release(pooled);
}

#[test]
fn test_exhaustion_produces_at_least_one_fallback() {
    let config = BufferPoolConfig::new(128)
        .with_initial_pool_size(2)
        .with_max_pool_size(4)
        .with_grow_step(2);
    let pool = BufferPool::new(config).unwrap();

    let buffers: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
    assert!(buffers.iter().any(|b| !b.is_pooled()));
    assert_eq!(pool.stats().total_buffers, 4);

    for buffer in buffers {
        pool.release(buffer);
    }
    assert_eq!(pool.stats().available_buffers, 4);
}

#[test]
fn test_growth_is_incremental() {
    let config = BufferPoolConfig::new(64)
        .with_initial_pool_size(1)
        .with_max_pool_size(8)
        .with_grow_step(3);
    let pool = BufferPool::new(config).unwrap();

    let first = pool.acquire();
    assert_eq!(pool.stats().total_buffers, 1);

    // Free queue empty, pool grows by one step
    let second = pool.acquire();
    assert_eq!(pool.stats().total_buffers, 4);

    pool.release(first);
    pool.release(second);
}

#[test]
fn test_manager_routes_by_size() {
    let manager = BufferPoolManager::new().unwrap();

    let small = manager.acquire(512).unwrap();
    let large = manager.acquire(65536).unwrap();
    assert_eq!(small.size(), 512);
    assert_eq!(large.size(), 65536);

    manager.release(small).unwrap();
    manager.release(large).unwrap();

    assert!(Arc::ptr_eq(
        &manager.pool(512).unwrap(),
        &manager.pool(512).unwrap()
    ));

    // Default pool plus the two created above
    assert_eq!(manager.all_stats().len(), 3);
}

#[test]
fn test_concurrent_acquire_release() {
    let pool = Arc::new(
        BufferPool::new(
            BufferPoolConfig::new(512)
                .with_initial_pool_size(4)
                .with_max_pool_size(8),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let mut buffer = pool.acquire();
                    buffer.as_mut_slice()[0] = 0xFF;
                    pool.release(buffer);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.in_use_buffers, 0);
    assert!(stats.total_buffers <= 8);
}
