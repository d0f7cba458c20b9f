//! Fixed-shape scratch memory for the Tint color-transform pipeline.
//!
//! Supplies the working buffers one unit of pixel processing needs, so
//! the per-pixel and per-row hot loops never touch the system allocator.
//! Two backing strategies sit behind one contract:
//!
//! ```text
//! ScratchManager (public handle, one bundle + one strategy)
//! ├── Arena mode:  Arc<ArenaRegion> → Chunk[] (bump-carved lanes,
//! │                bulk-freed when the last reference drops)
//! ├── Pooled mode: BundlePool (crossbeam idle list of ScratchBundles)
//! │                + HeapRegion (exact-fit transient allocations)
//! └── Empty:       the "no manager supplied" sentinel
//! ```
//!
//! A frame — one bounded unit of work such as a row or a pixel batch —
//! is a child `ScratchManager`: open with [`ScratchManager::frame`], use
//! its [`ScratchBuffers`], and close it. Closing returns pooled bundles
//! to the pool; arena carvings are reclaimed only when the whole region
//! is released.
//!
//! Every buffer's length is fixed at [`MAX_CHANNELS`] or
//! [`MAX_SHORT_CHANNELS`] for the lifetime of its bundle; only contents
//! are overwritten. Bundles are zeroed when first built and NOT re-zeroed
//! on pool reuse — never read a buffer you did not write in the current
//! frame.
//!
//! This crate contains the subsystem's only `unsafe` code, confined to
//! the raw-lane internals of [`region`] and [`bundle`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bundle;
pub mod channels;
pub mod config;
pub mod error;
pub mod manager;
pub mod pool;
pub mod region;

// Public re-exports for the primary API surface.
pub use bundle::{ScratchBuffers, ScratchBundle};
pub use channels::{ChannelCount, MAX_CHANNELS, MAX_SHORT_CHANNELS};
pub use config::RegionConfig;
pub use error::ScratchError;
pub use manager::ScratchManager;
pub use pool::BundlePool;
