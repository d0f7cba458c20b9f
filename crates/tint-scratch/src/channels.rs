//! Channel-count bounds shared with the transform engine.
//!
//! Every scratch buffer's length equals one of these two constants. They
//! mirror the hard upper bounds the transform engine places on channel
//! counts, so a bundle carved today can serve any transform the engine
//! will ever build.

use std::fmt;

/// Maximum number of channels a transform can carry.
///
/// Full-width working buffers (`lut0`, `in16`, `tmp1_f`, ...) hold exactly
/// this many elements.
pub const MAX_CHANNELS: usize = 128;

/// Maximum number of channels in the narrow per-stage window.
///
/// The `short_*` working buffers hold exactly this many elements.
pub const MAX_SHORT_CHANNELS: usize = 16;

/// A validated per-call channel count, in `1..=MAX_CHANNELS`.
///
/// The transform engine supplies one of these per invocation; windowed
/// view helpers on [`crate::ScratchBuffers`] use it to expose only the
/// active prefix of a full-width buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelCount(u16);

impl ChannelCount {
    /// The largest representable count, [`MAX_CHANNELS`].
    pub const MAX: ChannelCount = ChannelCount(MAX_CHANNELS as u16);

    /// Create a validated channel count.
    ///
    /// Returns `None` for zero or anything above [`MAX_CHANNELS`].
    pub fn new(n: usize) -> Option<Self> {
        if n == 0 || n > MAX_CHANNELS {
            return None;
        }
        Some(Self(n as u16))
    }

    /// The count as a plain `usize`.
    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Whether this count also fits the narrow `short_*` buffers.
    pub fn fits_short(self) -> bool {
        self.get() <= MAX_SHORT_CHANNELS
    }
}

impl fmt::Display for ChannelCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for ChannelCount {
    type Error = usize;

    fn try_from(n: usize) -> Result<Self, usize> {
        Self::new(n).ok_or(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_oversized() {
        assert!(ChannelCount::new(0).is_none());
        assert!(ChannelCount::new(MAX_CHANNELS + 1).is_none());
    }

    #[test]
    fn accepts_bounds() {
        assert_eq!(ChannelCount::new(1).unwrap().get(), 1);
        assert_eq!(ChannelCount::new(MAX_CHANNELS).unwrap().get(), MAX_CHANNELS);
        assert_eq!(ChannelCount::MAX.get(), MAX_CHANNELS);
    }

    #[test]
    fn short_window_check() {
        assert!(ChannelCount::new(MAX_SHORT_CHANNELS).unwrap().fits_short());
        assert!(!ChannelCount::new(MAX_SHORT_CHANNELS + 1).unwrap().fits_short());
    }

    #[test]
    fn try_from_round_trip() {
        let n = ChannelCount::try_from(4usize).unwrap();
        assert_eq!(n.get(), 4);
        assert_eq!(ChannelCount::try_from(0usize), Err(0));
    }
}
