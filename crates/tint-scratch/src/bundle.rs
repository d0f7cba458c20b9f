//! The fixed scratch-bundle layout and its view type.
//!
//! A bundle is two contiguous lanes — one `f32`, one `u16` — packed with
//! every working buffer one unit of pixel processing needs. Both
//! allocation strategies store lanes the same way; [`ScratchBuffers`] is
//! the uniform view carved out of them by a single canonical split, so
//! buffer shapes are identical across strategies by construction.
//!
//! Initialization policy: lanes are zeroed when a bundle is first
//! constructed or carved. Reuse through the pool does NOT re-zero —
//! a caller must never read a buffer it did not itself write in the
//! current frame.

use std::ptr::NonNull;
use std::slice;

use crate::channels::{ChannelCount, MAX_CHANNELS, MAX_SHORT_CHANNELS};
use crate::error::ScratchError;
use crate::region::ArenaRegion;

/// Length of the `f32` lane: two LUT stages, the narrow float window,
/// two full-width temporaries, and the two tone-curve cells.
pub const FLOAT_LANE_LEN: usize =
    2 * MAX_CHANNELS + 2 * MAX_SHORT_CHANNELS + 2 * MAX_CHANNELS + 2;

/// Length of the `u16` lane: the 16-bit I/O pair, the narrow 16-bit
/// window, two full-width temporaries, and the two tone-curve cells.
pub const WORD_LANE_LEN: usize =
    2 * MAX_CHANNELS + 2 * MAX_SHORT_CHANNELS + 2 * MAX_CHANNELS + 2;

/// Named views over one scratch bundle, exclusively owned for the
/// duration of the borrow.
///
/// All slices have their documented fixed lengths for the lifetime of
/// the bundle; only contents are ever overwritten. The four tone-curve
/// cells are carved from dedicated lane positions and never alias the
/// sliced buffers.
pub struct ScratchBuffers<'a> {
    /// First LUT intermediate stage, [`MAX_CHANNELS`] elements.
    pub lut0: &'a mut [f32],
    /// Second LUT intermediate stage, [`MAX_CHANNELS`] elements.
    pub lut1: &'a mut [f32],
    /// 16-bit input channels, [`MAX_CHANNELS`] elements.
    pub in16: &'a mut [u16],
    /// 16-bit output channels, [`MAX_CHANNELS`] elements.
    pub out16: &'a mut [u16],
    /// Narrow 16-bit input window, [`MAX_SHORT_CHANNELS`] elements.
    pub short_in16: &'a mut [u16],
    /// Narrow 16-bit output window, [`MAX_SHORT_CHANNELS`] elements.
    pub short_out16: &'a mut [u16],
    /// Narrow float input window, [`MAX_SHORT_CHANNELS`] elements.
    pub short_in_f: &'a mut [f32],
    /// Narrow float output window, [`MAX_SHORT_CHANNELS`] elements.
    pub short_out_f: &'a mut [f32],
    /// First 16-bit temporary, [`MAX_CHANNELS`] elements.
    pub tmp1_16: &'a mut [u16],
    /// Second 16-bit temporary, [`MAX_CHANNELS`] elements.
    pub tmp2_16: &'a mut [u16],
    /// First float temporary, [`MAX_CHANNELS`] elements.
    pub tmp1_f: &'a mut [f32],
    /// Second float temporary, [`MAX_CHANNELS`] elements.
    pub tmp2_f: &'a mut [f32],
    /// Tone-curve 16-bit input cell. Reserved for tone-curve evaluation.
    pub tone_in16: &'a mut u16,
    /// Tone-curve 16-bit output cell. Reserved for tone-curve evaluation.
    pub tone_out16: &'a mut u16,
    /// Tone-curve float input cell. Reserved for tone-curve evaluation.
    pub tone_in_f: &'a mut f32,
    /// Tone-curve float output cell. Reserved for tone-curve evaluation.
    pub tone_out_f: &'a mut f32,
}

impl<'a> ScratchBuffers<'a> {
    /// Carve the named views out of a bundle's two lanes.
    ///
    /// This is the only place the lane layout is interpreted; both
    /// strategies go through it.
    pub(crate) fn carve(floats: &'a mut [f32], words: &'a mut [u16]) -> Self {
        debug_assert_eq!(floats.len(), FLOAT_LANE_LEN);
        debug_assert_eq!(words.len(), WORD_LANE_LEN);

        let (lut0, rest) = floats.split_at_mut(MAX_CHANNELS);
        let (lut1, rest) = rest.split_at_mut(MAX_CHANNELS);
        let (short_in_f, rest) = rest.split_at_mut(MAX_SHORT_CHANNELS);
        let (short_out_f, rest) = rest.split_at_mut(MAX_SHORT_CHANNELS);
        let (tmp1_f, rest) = rest.split_at_mut(MAX_CHANNELS);
        let (tmp2_f, rest) = rest.split_at_mut(MAX_CHANNELS);
        let (tone_in_f, tone_out_f) = rest.split_at_mut(1);

        let (in16, rest) = words.split_at_mut(MAX_CHANNELS);
        let (out16, rest) = rest.split_at_mut(MAX_CHANNELS);
        let (short_in16, rest) = rest.split_at_mut(MAX_SHORT_CHANNELS);
        let (short_out16, rest) = rest.split_at_mut(MAX_SHORT_CHANNELS);
        let (tmp1_16, rest) = rest.split_at_mut(MAX_CHANNELS);
        let (tmp2_16, rest) = rest.split_at_mut(MAX_CHANNELS);
        let (tone_in16, tone_out16) = rest.split_at_mut(1);

        Self {
            lut0,
            lut1,
            in16,
            out16,
            short_in16,
            short_out16,
            short_in_f,
            short_out_f,
            tmp1_16,
            tmp2_16,
            tmp1_f,
            tmp2_f,
            tone_in16: &mut tone_in16[0],
            tone_out16: &mut tone_out16[0],
            tone_in_f: &mut tone_in_f[0],
            tone_out_f: &mut tone_out_f[0],
        }
    }

    /// The active prefix of `in16` for an `n`-channel call.
    pub fn in16_window(&mut self, n: ChannelCount) -> &mut [u16] {
        &mut self.in16[..n.get()]
    }

    /// The active prefix of `out16` for an `n`-channel call.
    pub fn out16_window(&mut self, n: ChannelCount) -> &mut [u16] {
        &mut self.out16[..n.get()]
    }

    /// The active prefixes of both LUT stages for an `n`-channel call.
    pub fn lut_windows(&mut self, n: ChannelCount) -> (&mut [f32], &mut [f32]) {
        (&mut self.lut0[..n.get()], &mut self.lut1[..n.get()])
    }
}

/// An owned scratch bundle, the unit the pool lends out.
///
/// Constructed with both lanes zeroed at their fixed lengths; never
/// resized or reallocated afterwards. Contents persist across pool
/// reuse cycles.
pub struct ScratchBundle {
    floats: Box<[f32]>,
    words: Box<[u16]>,
}

impl ScratchBundle {
    /// Build a fresh bundle with zeroed lanes at the fixed lengths.
    pub(crate) fn new() -> Self {
        Self {
            floats: vec![0.0; FLOAT_LANE_LEN].into_boxed_slice(),
            words: vec![0; WORD_LANE_LEN].into_boxed_slice(),
        }
    }

    /// Borrow the named working buffers.
    pub fn buffers(&mut self) -> ScratchBuffers<'_> {
        ScratchBuffers::carve(&mut self.floats, &mut self.words)
    }

    /// Length of the `f32` lane. Fixed for the bundle's lifetime.
    pub fn float_lane_len(&self) -> usize {
        self.floats.len()
    }

    /// Length of the `u16` lane. Fixed for the bundle's lifetime.
    pub fn word_lane_len(&self) -> usize {
        self.words.len()
    }
}

/// A bundle carved from an [`ArenaRegion`], held as raw lane pointers.
///
/// The carved ranges are exclusively owned by this value; the manager
/// that holds it also holds the region alive (via `Arc`), so the
/// pointers remain valid for as long as the `RawBundle` exists. Views
/// materialize through `&mut self`, which serializes access.
pub(crate) struct RawBundle {
    floats: NonNull<f32>,
    words: NonNull<u16>,
}

// SAFETY: the carved lanes are exclusively owned by this bundle, and
// nothing about them is tied to the carving thread.
unsafe impl Send for RawBundle {}

impl RawBundle {
    /// Carve a bundle's two lanes from `region`.
    pub(crate) fn carve_from(region: &ArenaRegion) -> Result<Self, ScratchError> {
        let floats = region.try_alloc_slice::<f32>(FLOAT_LANE_LEN)?;
        let words = region.try_alloc_slice::<u16>(WORD_LANE_LEN)?;
        Ok(Self {
            floats: NonNull::from(&mut floats[0]),
            words: NonNull::from(&mut words[0]),
        })
    }

    /// Borrow the named working buffers.
    pub(crate) fn buffers(&mut self) -> ScratchBuffers<'_> {
        // SAFETY: the lanes were carved at exactly these lengths, are
        // exclusively owned by self, and stay valid while the owning
        // manager keeps the region alive; `&mut self` guarantees no
        // other view of them exists.
        let floats = unsafe { slice::from_raw_parts_mut(self.floats.as_ptr(), FLOAT_LANE_LEN) };
        let words = unsafe { slice::from_raw_parts_mut(self.words.as_ptr(), WORD_LANE_LEN) };
        ScratchBuffers::carve(floats, words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionConfig;

    fn assert_shapes(bufs: &ScratchBuffers<'_>) {
        assert_eq!(bufs.lut0.len(), MAX_CHANNELS);
        assert_eq!(bufs.lut1.len(), MAX_CHANNELS);
        assert_eq!(bufs.in16.len(), MAX_CHANNELS);
        assert_eq!(bufs.out16.len(), MAX_CHANNELS);
        assert_eq!(bufs.short_in16.len(), MAX_SHORT_CHANNELS);
        assert_eq!(bufs.short_out16.len(), MAX_SHORT_CHANNELS);
        assert_eq!(bufs.short_in_f.len(), MAX_SHORT_CHANNELS);
        assert_eq!(bufs.short_out_f.len(), MAX_SHORT_CHANNELS);
        assert_eq!(bufs.tmp1_16.len(), MAX_CHANNELS);
        assert_eq!(bufs.tmp2_16.len(), MAX_CHANNELS);
        assert_eq!(bufs.tmp1_f.len(), MAX_CHANNELS);
        assert_eq!(bufs.tmp2_f.len(), MAX_CHANNELS);
    }

    #[test]
    fn owned_bundle_has_fixed_shapes() {
        let mut bundle = ScratchBundle::new();
        assert_eq!(bundle.float_lane_len(), FLOAT_LANE_LEN);
        assert_eq!(bundle.word_lane_len(), WORD_LANE_LEN);
        let bufs = bundle.buffers();
        assert_shapes(&bufs);
    }

    #[test]
    fn lanes_are_fully_consumed_by_the_carve() {
        // The layout constants and the split chain must agree exactly;
        // a mismatch would panic inside carve().
        assert_eq!(FLOAT_LANE_LEN, 546);
        assert_eq!(WORD_LANE_LEN, 546);
        let mut bundle = ScratchBundle::new();
        let _ = bundle.buffers();
    }

    #[test]
    fn buffers_do_not_alias() {
        let mut bundle = ScratchBundle::new();
        let bufs = bundle.buffers();
        bufs.tmp1_16.fill(0x1111);
        bufs.tmp2_16.fill(0x2222);
        *bufs.tone_in16 = 0x3333;
        *bufs.tone_out16 = 0x4444;
        assert!(bufs.tmp1_16.iter().all(|&v| v == 0x1111));
        assert!(bufs.tmp2_16.iter().all(|&v| v == 0x2222));
        assert_eq!(*bufs.tone_in16, 0x3333);
        assert_eq!(*bufs.tone_out16, 0x4444);
    }

    #[test]
    fn contents_persist_across_views() {
        let mut bundle = ScratchBundle::new();
        bundle.buffers().lut0[7] = 0.5;
        assert_eq!(bundle.buffers().lut0[7], 0.5);
    }

    #[test]
    fn windows_expose_active_prefix() {
        let mut bundle = ScratchBundle::new();
        let mut bufs = bundle.buffers();
        let n = ChannelCount::new(4).unwrap();
        assert_eq!(bufs.in16_window(n).len(), 4);
        assert_eq!(bufs.out16_window(n).len(), 4);
        let (l0, l1) = bufs.lut_windows(n);
        assert_eq!(l0.len(), 4);
        assert_eq!(l1.len(), 4);
    }

    #[test]
    fn raw_bundle_matches_owned_shapes() {
        let region = ArenaRegion::new(&RegionConfig::new()).unwrap();
        let mut raw = RawBundle::carve_from(&region).unwrap();
        let bufs = raw.buffers();
        assert_shapes(&bufs);
        assert!(bufs.lut0.iter().all(|&v| v == 0.0));
        assert!(bufs.in16.iter().all(|&v| v == 0));
    }

    #[test]
    fn raw_bundle_carves_are_disjoint() {
        let region = ArenaRegion::new(&RegionConfig::new()).unwrap();
        let mut a = RawBundle::carve_from(&region).unwrap();
        let mut b = RawBundle::carve_from(&region).unwrap();
        a.buffers().tmp1_16.fill(0xAAAA);
        b.buffers().tmp1_16.fill(0xBBBB);
        assert!(a.buffers().tmp1_16.iter().all(|&v| v == 0xAAAA));
        assert!(b.buffers().tmp1_16.iter().all(|&v| v == 0xBBBB));
    }
}
