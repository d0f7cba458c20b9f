//! Backing regions for the two allocation strategies.
//!
//! [`ArenaRegion`] is a chunked bump allocator: carving advances a cursor
//! within a fixed-size chunk, a fresh chunk is appended when the current
//! one is full, and everything is released at once when the region drops.
//! [`HeapRegion`] is its heap-mode counterpart: every request is an
//! ordinary, exact-fit global-allocator allocation, retained until the
//! region drops.
//!
//! Together with the raw-bundle views in [`crate::bundle`], this module
//! holds all of the crate's `unsafe`. The soundness argument for handing out `&mut [T]` from a shared region
//! reference is the usual bump-allocator one: each successful allocation
//! covers a byte range that has never been returned before and never will
//! be again, chunk backing memory never moves once allocated, and the
//! cursor is updated under a mutex so ranges cannot be issued twice.

use std::alloc::{self, Layout};
use std::mem;
use std::ptr::NonNull;
use std::slice;
use std::sync::{Mutex, PoisonError};

use smallvec::SmallVec;

use crate::config::RegionConfig;
use crate::error::ScratchError;

/// Alignment of chunk backing allocations (one cache line).
const CHUNK_ALIGN: usize = 64;

/// One contiguous backing allocation with a bump cursor.
struct Chunk {
    /// Start of the backing allocation.
    data: NonNull<u8>,
    /// Layout the backing allocation was created with.
    layout: Layout,
    /// Byte offset of the next free position.
    cursor: usize,
}

// SAFETY: a Chunk exclusively owns its backing allocation; nothing about
// it is tied to the thread that created it.
unsafe impl Send for Chunk {}

impl Chunk {
    /// Allocate a zeroed chunk of `bytes` bytes.
    ///
    /// Aborts via `handle_alloc_error` if the system allocator fails —
    /// backing-store exhaustion is fatal, never silently ignored.
    fn new(bytes: usize) -> Self {
        let layout = Layout::from_size_align(bytes, CHUNK_ALIGN)
            .expect("chunk size is validated before construction");
        // SAFETY: layout has non-zero size (validated >= MIN_CHUNK_BYTES).
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let data = match NonNull::new(ptr) {
            Some(data) => data,
            None => alloc::handle_alloc_error(layout),
        };
        Self {
            data,
            layout,
            cursor: 0,
        }
    }

    /// Bump-allocate `layout` from this chunk, or `None` if it cannot fit.
    fn try_alloc(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        // SAFETY: cursor <= layout.size(), so the offset pointer stays
        // within (or one past) the allocation.
        let tail = unsafe { self.data.as_ptr().add(self.cursor) };
        let pad = tail.align_offset(layout.align());
        let start = self.cursor.checked_add(pad)?;
        let end = start.checked_add(layout.size())?;
        if end > self.layout.size() {
            return None;
        }
        self.cursor = end;
        // SAFETY: start < end <= chunk size, so the pointer is in bounds.
        NonNull::new(unsafe { self.data.as_ptr().add(start) })
    }

    /// Bytes consumed so far, including alignment padding.
    fn used(&self) -> usize {
        self.cursor
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        // SAFETY: data was allocated with exactly this layout.
        unsafe {
            alloc::dealloc(self.data.as_ptr(), self.layout);
        }
    }
}

/// Materialize an allocation as a default-initialized slice.
///
/// # Safety
///
/// `ptr` must point to a fresh, exclusively owned allocation of at least
/// `len` elements of `T`, properly aligned, valid for the caller-chosen
/// lifetime `'a`.
unsafe fn init_slice<'a, T: Copy + Default>(ptr: NonNull<T>, len: usize) -> &'a mut [T] {
    let p = ptr.as_ptr();
    for i in 0..len {
        p.add(i).write(T::default());
    }
    slice::from_raw_parts_mut(p, len)
}

/// A slice of zero-sized or zero-length values needs no backing memory.
fn dangling_slice<'a, T>(len: usize) -> &'a mut [T] {
    // SAFETY: a dangling, aligned pointer is valid for zero-size reads
    // and writes; every element of a ZST slice occupies zero bytes.
    unsafe { slice::from_raw_parts_mut(NonNull::<T>::dangling().as_ptr(), len) }
}

/// Chunked bump region backing arena-mode managers.
///
/// Carving is O(1): align the cursor, bump it, hand out the range.
/// Individual carvings are never freed; the whole region is released when
/// the last reference drops. Carving is internally synchronized, so a
/// region may be shared across threads behind `Arc`, though the intended
/// use is one region per top-level transform invocation.
pub struct ArenaRegion {
    /// Chunk list; the last entry is the one currently being filled.
    chunks: Mutex<SmallVec<[Chunk; 4]>>,
    /// Size of each chunk in bytes.
    chunk_bytes: usize,
    /// Maximum number of chunks.
    max_chunks: usize,
}

impl ArenaRegion {
    /// Create a region with one pre-allocated chunk.
    ///
    /// Validates `config`: `chunk_bytes` must be a power of two of at
    /// least [`RegionConfig::MIN_CHUNK_BYTES`], and `max_chunks` nonzero.
    pub fn new(config: &RegionConfig) -> Result<Self, ScratchError> {
        if !config.chunk_bytes.is_power_of_two()
            || config.chunk_bytes < RegionConfig::MIN_CHUNK_BYTES
        {
            return Err(ScratchError::InvalidConfig {
                reason: format!(
                    "chunk_bytes must be a power of two and >= {} (got {})",
                    RegionConfig::MIN_CHUNK_BYTES,
                    config.chunk_bytes,
                ),
            });
        }
        if config.max_chunks == 0 {
            return Err(ScratchError::InvalidConfig {
                reason: "max_chunks must be >= 1".to_string(),
            });
        }

        let mut chunks = SmallVec::new();
        chunks.push(Chunk::new(config.chunk_bytes));
        Ok(Self {
            chunks: Mutex::new(chunks),
            chunk_bytes: config.chunk_bytes,
            max_chunks: config.max_chunks as usize,
        })
    }

    /// Carve a default-initialized slice of `len` elements of `T`.
    ///
    /// The returned slice borrows the region but is exclusively owned by
    /// the caller; successive calls return disjoint slices that may be
    /// held simultaneously. Fails with `CapacityExceeded` if the request
    /// cannot fit in a single chunk or the chunk cap is reached.
    pub fn try_alloc_slice<T: Copy + Default>(
        &self,
        len: usize,
    ) -> Result<&mut [T], ScratchError> {
        if len == 0 || mem::size_of::<T>() == 0 {
            return Ok(dangling_slice(len));
        }
        let layout = match Layout::array::<T>(len) {
            Ok(layout) => layout,
            Err(_) => {
                return Err(ScratchError::CapacityExceeded {
                    requested: len.saturating_mul(mem::size_of::<T>()),
                    capacity: self.capacity_bytes(),
                })
            }
        };
        let ptr = self.try_alloc_layout(layout)?;
        // SAFETY: try_alloc_layout returned a fresh, aligned range of
        // layout.size() bytes that will never be handed out again; the
        // region outlives the &self borrow, so the lifetime is valid.
        Ok(unsafe { init_slice(ptr.cast::<T>(), len) })
    }

    /// Carve one default-initialized value of `T`.
    pub fn try_alloc_value<T: Copy + Default>(&self) -> Result<&mut T, ScratchError> {
        let slice = self.try_alloc_slice::<T>(1)?;
        Ok(&mut slice[0])
    }

    /// Bump-allocate a raw range for `layout`.
    fn try_alloc_layout(&self, layout: Layout) -> Result<NonNull<u8>, ScratchError> {
        // A request must fit a single chunk even in the worst alignment
        // case; cross-chunk splitting is not supported.
        if layout.size() + layout.align() > self.chunk_bytes {
            return Err(ScratchError::CapacityExceeded {
                requested: layout.size(),
                capacity: self.chunk_bytes,
            });
        }

        let mut chunks = self.chunks.lock().unwrap_or_else(PoisonError::into_inner);
        let current = chunks
            .last_mut()
            .expect("region always holds at least one chunk");
        if let Some(ptr) = current.try_alloc(layout) {
            return Ok(ptr);
        }

        if chunks.len() >= self.max_chunks {
            return Err(ScratchError::CapacityExceeded {
                requested: layout.size(),
                capacity: self.capacity_bytes(),
            });
        }

        let mut chunk = Chunk::new(self.chunk_bytes);
        let ptr = chunk
            .try_alloc(layout)
            .expect("request fits a fresh chunk by the size check above");
        chunks.push(chunk);
        Ok(ptr)
    }

    /// Number of chunks currently allocated.
    pub fn chunk_count(&self) -> usize {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Bytes consumed across all chunks, including alignment padding.
    pub fn bytes_used(&self) -> usize {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Chunk::used)
            .sum()
    }

    /// Memory reserved by the region's chunks, in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.chunk_count() * self.chunk_bytes
    }

    /// Total capacity the region may reach, in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.chunk_bytes * self.max_chunks
    }
}

/// Heap-mode transient allocations.
///
/// Each request goes straight to the global allocator at its exact size;
/// the region only records the allocations so they can all be released
/// when it drops. This keeps the generic allocation helpers uniform
/// across strategies without giving heap-mode managers a bump region.
pub struct HeapRegion {
    allocs: Mutex<Vec<RawAlloc>>,
}

/// One recorded heap allocation.
struct RawAlloc {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: a RawAlloc exclusively owns its allocation.
unsafe impl Send for RawAlloc {}

impl HeapRegion {
    /// Create an empty heap region.
    pub fn new() -> Self {
        Self {
            allocs: Mutex::new(Vec::new()),
        }
    }

    /// Allocate a default-initialized slice of `len` elements of `T`
    /// from the global allocator.
    ///
    /// System-allocator failure aborts via `handle_alloc_error`; the only
    /// `Err` this returns is for a `Layout` overflow, which mirrors the
    /// arena path's error shape.
    pub fn try_alloc_slice<T: Copy + Default>(
        &self,
        len: usize,
    ) -> Result<&mut [T], ScratchError> {
        if len == 0 || mem::size_of::<T>() == 0 {
            return Ok(dangling_slice(len));
        }
        let layout = match Layout::array::<T>(len) {
            Ok(layout) => layout,
            Err(_) => {
                return Err(ScratchError::CapacityExceeded {
                    requested: len.saturating_mul(mem::size_of::<T>()),
                    capacity: usize::MAX,
                })
            }
        };
        // SAFETY: layout has non-zero size (guarded above).
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        };
        self.allocs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RawAlloc { ptr, layout });
        // SAFETY: fresh exclusive allocation of at least `len` elements;
        // it is freed only when the region drops, and the region outlives
        // the returned borrow.
        Ok(unsafe { init_slice(ptr.cast::<T>(), len) })
    }

    /// Allocate one default-initialized value of `T`.
    pub fn try_alloc_value<T: Copy + Default>(&self) -> Result<&mut T, ScratchError> {
        let slice = self.try_alloc_slice::<T>(1)?;
        Ok(&mut slice[0])
    }

    /// Number of live allocations held by this region.
    pub fn alloc_count(&self) -> usize {
        self.allocs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total bytes held by this region's allocations.
    pub fn bytes_used(&self) -> usize {
        self.allocs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|a| a.layout.size())
            .sum()
    }
}

impl Default for HeapRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HeapRegion {
    fn drop(&mut self) {
        let allocs = self.allocs.get_mut().unwrap_or_else(PoisonError::into_inner);
        for a in allocs.drain(..) {
            // SAFETY: each ptr was allocated with exactly this layout and
            // no borrow of it can outlive the region.
            unsafe {
                alloc::dealloc(a.ptr.as_ptr(), a.layout);
            }
        }
    }
}
