//! Scratch-subsystem error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur while managing scratch memory.
///
/// Allocation in this subsystem is a single atomic step: a request either
/// succeeds immediately or is fatal to the enclosing operation. The
/// infallible API surface panics with the formatted error; the `try_*`
/// variants return it so a caller can abort one transform invocation
/// instead of the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScratchError {
    /// The backing region cannot grow to satisfy an allocation.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Total capacity the region may reach, in bytes.
        capacity: usize,
    },
    /// Region configuration failed validation.
    InvalidConfig {
        /// Human-readable description of the invalid parameter.
        reason: String,
    },
    /// An operation that needs a scratch bundle was invoked on the empty
    /// sentinel manager. Callers that accept an optional manager must
    /// substitute a default before asking it for memory.
    EmptyManager,
}

impl fmt::Display for ScratchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "scratch region capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid region config: {reason}")
            }
            Self::EmptyManager => {
                write!(f, "empty scratch manager holds no bundle")
            }
        }
    }
}

impl Error for ScratchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_sizes() {
        let err = ScratchError::CapacityExceeded {
            requested: 4096,
            capacity: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn display_invalid_config_carries_reason() {
        let err = ScratchError::InvalidConfig {
            reason: "chunk_bytes too small".to_string(),
        };
        assert!(err.to_string().contains("chunk_bytes too small"));
    }
}
