//! Concurrent cache of reusable scratch bundles.
//!
//! [`BundlePool`] backs the heap/pool strategy: workers acquire a bundle
//! at frame open and release it at frame close, and the pool keeps
//! released bundles for future reuse instead of freeing them. The idle
//! list is a `crossbeam-channel` queue, so acquire and release are safe
//! from any number of worker threads without a dedicated lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::bundle::ScratchBundle;

/// Shared, cloneable pool of scratch bundles.
///
/// Clones share the same idle list and counters; inject one pool at
/// startup and hand clones to whoever opens frames. Dropping the last
/// clone drops every idle bundle.
#[derive(Clone)]
pub struct BundlePool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    /// Producer side of the idle list (used by release).
    idle_tx: Sender<ScratchBundle>,
    /// Consumer side of the idle list (used by acquire).
    idle_rx: Receiver<ScratchBundle>,
    /// Bundles currently out on loan.
    in_use: AtomicUsize,
    /// Bundles constructed over the pool's lifetime.
    built: AtomicUsize,
}

impl BundlePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        let (idle_tx, idle_rx) = unbounded();
        Self {
            inner: Arc::new(PoolInner {
                idle_tx,
                idle_rx,
                in_use: AtomicUsize::new(0),
                built: AtomicUsize::new(0),
            }),
        }
    }

    /// Take an idle bundle, or construct a fresh one if none is cached.
    ///
    /// Never fails: fixed-shape bundle construction only aborts on
    /// system-allocator exhaustion, which is fatal by policy. A reused
    /// bundle keeps whatever contents its previous frame left behind —
    /// callers must write before they read.
    pub fn acquire(&self) -> ScratchBundle {
        let bundle = match self.inner.idle_rx.try_recv() {
            Ok(bundle) => bundle,
            Err(_) => {
                self.inner.built.fetch_add(1, Ordering::Relaxed);
                ScratchBundle::new()
            }
        };
        self.inner.in_use.fetch_add(1, Ordering::Relaxed);
        bundle
    }

    /// Return a bundle for future reuse.
    ///
    /// Takes the bundle by value, so releasing the same acquisition
    /// twice is not expressible.
    pub fn release(&self, bundle: ScratchBundle) {
        self.inner.in_use.fetch_sub(1, Ordering::Relaxed);
        // The receiver lives inside the same Arc, so the channel can
        // never be disconnected while self exists.
        self.inner
            .idle_tx
            .send(bundle)
            .expect("idle list outlives every pool handle");
    }

    /// Bundles currently on loan to open frames.
    pub fn in_use(&self) -> usize {
        self.inner.in_use.load(Ordering::Relaxed)
    }

    /// Bundles sitting idle, ready for reuse.
    pub fn idle(&self) -> usize {
        self.inner.idle_rx.len()
    }

    /// Bundles constructed over the pool's lifetime.
    pub fn bundles_built(&self) -> usize {
        self.inner.built.load(Ordering::Relaxed)
    }

    /// Drop all idle bundles, releasing their memory.
    ///
    /// Bundles currently on loan are unaffected and will re-enter the
    /// idle list when released.
    pub fn drain_idle(&self) {
        while self.inner.idle_rx.try_recv().is_ok() {}
    }
}

impl Default for BundlePool {
    fn default() -> Self {
        Self::new()
    }
}
