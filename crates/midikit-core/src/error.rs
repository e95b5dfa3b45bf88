//! Error types for the protocol core.

use thiserror::Error;

/// Error type for event construction and codec operations.
///
/// Codecs never log; every failure propagates as one of these three kinds
/// with enough position information to diagnose the input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The input violates the wire format. `offset` is the byte offset for
    /// byte-stream codecs, or the word index for UMP.
    #[error("malformed input at offset {offset}: {reason}")]
    Malformed {
        offset: usize,
        reason: &'static str,
    },

    /// Well-formed input outside the configured spec level.
    #[error("unsupported input: {what}")]
    Unsupported { what: &'static str },

    /// A numeric constructor rejected an out-of-range value.
    #[error("{field} out of range: {value} (max {bound})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        bound: u32,
    },
}

impl Error {
    #[inline]
    pub(crate) const fn malformed(offset: usize, reason: &'static str) -> Self {
        Self::Malformed { offset, reason }
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
