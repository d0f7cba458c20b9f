//! Backing-region configuration parameters.

/// Configuration for an arena-mode backing region.
///
/// The region grows in fixed-size chunks: a fresh chunk of `chunk_bytes`
/// is appended whenever the current one cannot satisfy a request, up to
/// `max_chunks`. Validated at region construction; immutable afterwards.
#[derive(Clone, Debug)]
pub struct RegionConfig {
    /// Size of each backing chunk in bytes.
    ///
    /// Default: 64 KiB, roughly twenty scratch bundles per chunk. Must be
    /// a power of two and at least [`RegionConfig::MIN_CHUNK_BYTES`].
    pub chunk_bytes: usize,

    /// Maximum number of chunks the region may hold.
    ///
    /// Default: 64, i.e. a 4 MiB cap at the default chunk size. Requests
    /// that would require more chunks fail with `CapacityExceeded`.
    pub max_chunks: u16,
}

impl RegionConfig {
    /// Default chunk size: 64 KiB.
    pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

    /// Default chunk-count cap.
    pub const DEFAULT_MAX_CHUNKS: u16 = 64;

    /// Smallest permitted chunk size.
    ///
    /// A chunk must fit one full-width lane of a scratch bundle plus
    /// alignment slack; 4 KiB covers that with room for transient
    /// allocations.
    pub const MIN_CHUNK_BYTES: usize = 4 * 1024;

    /// Create a config with the default sizing policy.
    pub fn new() -> Self {
        Self {
            chunk_bytes: Self::DEFAULT_CHUNK_BYTES,
            max_chunks: Self::DEFAULT_MAX_CHUNKS,
        }
    }

    /// Total capacity the region may reach, in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.chunk_bytes * self.max_chunks as usize
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_4mib() {
        let config = RegionConfig::new();
        assert_eq!(config.capacity_bytes(), 4 * 1024 * 1024);
    }

    #[test]
    fn min_chunk_holds_a_lane() {
        use crate::bundle::FLOAT_LANE_LEN;
        assert!(RegionConfig::MIN_CHUNK_BYTES >= FLOAT_LANE_LEN * std::mem::size_of::<f32>() + 64);
    }
}
