//! The public scratch-manager handle and its frame lifecycle.
//!
//! [`ScratchManager`] combines one backing strategy with ownership of
//! exactly one scratch bundle. A frame is simply a child manager produced
//! by [`ScratchManager::frame`]: in arena mode it carves its bundle from
//! the parent's shared region (O(1), no system allocation on the happy
//! path); in pooled mode it acquires one from the shared [`BundlePool`].
//!
//! The lifecycle per top-level operation is:
//! 1. build a manager once (`pooled` or `arena`)
//! 2. per row or pixel batch, open a frame, use its buffers, close it
//! 3. tear the manager down (`free_all` in arena mode; pooled bundles
//!    return to the pool on drop)
//!
//! Closing consumes the frame, so a double close is a compile error, and
//! an unwound panic closes pooled frames through `Drop`. `free_all` with
//! live frames cannot free memory out from under them: frames hold their
//! own reference to the region, which is released when the last one
//! drops.

use std::sync::Arc;

use crate::bundle::{RawBundle, ScratchBundle, ScratchBuffers, FLOAT_LANE_LEN, WORD_LANE_LEN};
use crate::config::RegionConfig;
use crate::error::ScratchError;
use crate::pool::BundlePool;
use crate::region::{ArenaRegion, HeapRegion};

/// A scratch-memory handle: one backing strategy plus one bundle.
///
/// Both strategies expose the same contract — [`ScratchManager::scratch`]
/// for the fixed working buffers, the generic allocation helpers for
/// other transient state, and [`ScratchManager::frame`] for child scopes
/// — so the transform engine never depends on the concrete backing.
pub struct ScratchManager {
    backing: Backing,
}

enum Backing {
    /// The "no manager supplied" sentinel; holds no bundle.
    Empty,
    /// Arena strategy: bundles carved from a shared bump region.
    Arena {
        region: Arc<ArenaRegion>,
        bundle: RawBundle,
    },
    /// Heap/pool strategy: bundle on loan from the shared pool,
    /// transient allocations straight from the global allocator.
    Pooled {
        pool: BundlePool,
        transient: HeapRegion,
        /// Taken only by `Drop`, to hand the bundle back to the pool.
        bundle: Option<ScratchBundle>,
    },
}

impl ScratchManager {
    /// Build a heap/pool-mode manager with one freshly acquired bundle.
    pub fn pooled(pool: &BundlePool) -> Self {
        Self {
            backing: Backing::Pooled {
                pool: pool.clone(),
                transient: HeapRegion::new(),
                bundle: Some(pool.acquire()),
            },
        }
    }

    /// Build an arena-mode manager with the default region sizing.
    pub fn arena() -> Self {
        Self::arena_with(RegionConfig::new()).expect("default region config is valid")
    }

    /// Build an arena-mode manager with the given region sizing.
    ///
    /// The region is created with one pre-allocated chunk and the
    /// top-level bundle is carved from it immediately.
    pub fn arena_with(config: RegionConfig) -> Result<Self, ScratchError> {
        let region = Arc::new(ArenaRegion::new(&config)?);
        let bundle = RawBundle::carve_from(&region)?;
        Ok(Self {
            backing: Backing::Arena { region, bundle },
        })
    }

    /// The empty sentinel: a manager holding no bundle.
    ///
    /// Callers that accept an optional manager test [`Self::is_empty`]
    /// and substitute an internally created default before use.
    pub fn empty() -> Self {
        Self {
            backing: Backing::Empty,
        }
    }

    /// Whether this manager holds no scratch bundle.
    pub fn is_empty(&self) -> bool {
        matches!(self.backing, Backing::Empty)
    }

    /// Borrow the working buffers for the current unit of work.
    ///
    /// # Panics
    ///
    /// Panics on the empty sentinel; see [`Self::try_scratch`].
    pub fn scratch(&mut self) -> ScratchBuffers<'_> {
        match self.try_scratch() {
            Ok(buffers) => buffers,
            Err(e) => panic!("{e}"),
        }
    }

    /// Borrow the working buffers, or fail on the empty sentinel.
    pub fn try_scratch(&mut self) -> Result<ScratchBuffers<'_>, ScratchError> {
        match &mut self.backing {
            Backing::Empty => Err(ScratchError::EmptyManager),
            Backing::Arena { bundle, .. } => Ok(bundle.buffers()),
            Backing::Pooled { bundle, .. } => Ok(bundle
                .as_mut()
                .expect("pooled manager holds its bundle until drop")
                .buffers()),
        }
    }

    /// Allocate a default-initialized slice following this manager's
    /// strategy: carved from the arena, or an ordinary heap allocation
    /// freed when the manager drops.
    ///
    /// Successive allocations are independently addressable and may be
    /// held simultaneously.
    ///
    /// # Panics
    ///
    /// Panics on capacity exhaustion or the empty sentinel (allocation
    /// failures are fatal); see [`Self::try_alloc_slice`].
    pub fn alloc_slice<T: Copy + Default>(&self, len: usize) -> &mut [T] {
        match self.try_alloc_slice(len) {
            Ok(slice) => slice,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible form of [`Self::alloc_slice`].
    pub fn try_alloc_slice<T: Copy + Default>(
        &self,
        len: usize,
    ) -> Result<&mut [T], ScratchError> {
        match &self.backing {
            Backing::Empty => Err(ScratchError::EmptyManager),
            Backing::Arena { region, .. } => region.try_alloc_slice(len),
            Backing::Pooled { transient, .. } => transient.try_alloc_slice(len),
        }
    }

    /// Allocate one default-initialized value following this manager's
    /// strategy.
    ///
    /// # Panics
    ///
    /// Panics on capacity exhaustion or the empty sentinel.
    pub fn alloc_value<T: Copy + Default>(&self) -> &mut T {
        match self.try_alloc_value() {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible form of [`Self::alloc_value`].
    pub fn try_alloc_value<T: Copy + Default>(&self) -> Result<&mut T, ScratchError> {
        match &self.backing {
            Backing::Empty => Err(ScratchError::EmptyManager),
            Backing::Arena { region, .. } => region.try_alloc_value(),
            Backing::Pooled { transient, .. } => transient.try_alloc_value(),
        }
    }

    /// Open a child frame.
    ///
    /// Arena mode carves the frame's bundle from this manager's region;
    /// pooled mode acquires one from the shared pool. Frames may open
    /// frames of their own.
    ///
    /// # Panics
    ///
    /// Panics on capacity exhaustion or the empty sentinel; see
    /// [`Self::try_frame`].
    #[must_use]
    pub fn frame(&self) -> ScratchManager {
        match self.try_frame() {
            Ok(frame) => frame,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible form of [`Self::frame`].
    pub fn try_frame(&self) -> Result<ScratchManager, ScratchError> {
        match &self.backing {
            Backing::Empty => Err(ScratchError::EmptyManager),
            Backing::Arena { region, .. } => {
                let bundle = RawBundle::carve_from(region)?;
                Ok(Self {
                    backing: Backing::Arena {
                        region: Arc::clone(region),
                        bundle,
                    },
                })
            }
            Backing::Pooled { pool, .. } => Ok(Self::pooled(pool)),
        }
    }

    /// Close a frame (or tear down a top-level manager).
    ///
    /// Pooled bundles return to the pool; arena carvings are reclaimed
    /// only when the backing region itself is released. Consuming `self`
    /// makes a second close unrepresentable.
    pub fn close(self) {
        // Drop does the work; this name exists for call sites that want
        // the lifecycle spelled out.
    }

    /// Open a frame, run `body` with it, and close it on every exit
    /// path — normal return, early return, or unwinding panic.
    pub fn with_frame<R>(&self, body: impl FnOnce(&mut ScratchManager) -> R) -> R {
        let mut frame = self.frame();
        let out = body(&mut frame);
        frame.close();
        out
    }

    /// Bulk-release the backing region (arena mode).
    ///
    /// This manager becomes the empty sentinel. The region's memory is
    /// freed once the last frame holding a reference to it closes; with
    /// no frames open, that is immediately. No-op in pooled mode and on
    /// the empty sentinel.
    pub fn free_all(&mut self) {
        if matches!(self.backing, Backing::Arena { .. }) {
            self.backing = Backing::Empty;
        }
    }

    /// Bytes of backing memory attributable to this manager: region
    /// chunks in arena mode, or the bundle lanes plus transient
    /// allocations in pooled mode.
    pub fn memory_bytes(&self) -> usize {
        match &self.backing {
            Backing::Empty => 0,
            Backing::Arena { region, .. } => region.memory_bytes(),
            Backing::Pooled { transient, .. } => {
                FLOAT_LANE_LEN * std::mem::size_of::<f32>()
                    + WORD_LANE_LEN * std::mem::size_of::<u16>()
                    + transient.bytes_used()
            }
        }
    }
}

impl Drop for ScratchManager {
    fn drop(&mut self) {
        if let Backing::Pooled { pool, bundle, .. } = &mut self.backing {
            if let Some(bundle) = bundle.take() {
                pool.release(bundle);
            }
        }
        // Arena mode: dropping our Arc releases the region once the last
        // frame's reference is gone. Empty: nothing to do.
    }
}
