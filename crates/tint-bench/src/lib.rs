//! Benchmark profiles for the Tint scratch-memory subsystem.
//!
//! Provides pre-built managers so benches measure the hot path (frame
//! open/close, view materialization) rather than setup.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tint_scratch::{BundlePool, RegionConfig, ScratchManager};

/// A pool pre-warmed with `bundles` idle bundles, so pooled-frame
/// benches measure reuse rather than first construction.
pub fn warmed_pool(bundles: usize) -> BundlePool {
    let pool = BundlePool::new();
    let managers: Vec<_> = (0..bundles).map(|_| ScratchManager::pooled(&pool)).collect();
    drop(managers);
    pool
}

/// An arena manager sized for sustained frame churn: larger chunks so
/// growth never interrupts the measured loop.
pub fn churn_arena() -> ScratchManager {
    let config = RegionConfig {
        chunk_bytes: 1024 * 1024,
        max_chunks: 64,
    };
    ScratchManager::arena_with(config).expect("bench region config is valid")
}
