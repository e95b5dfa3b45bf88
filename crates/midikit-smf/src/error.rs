//! Error types for the SMF codec.

use thiserror::Error;

/// Error type for SMF parsing and encoding.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmfError {
    /// The file violates the chunk format. `offset` is the absolute byte
    /// offset into the input.
    #[error("malformed file at byte {offset}: {reason}")]
    Malformed {
        offset: usize,
        reason: &'static str,
    },

    /// Well-formed but unsupported content.
    #[error("unsupported: {what}")]
    Unsupported { what: &'static str },

    /// An embedded channel event failed to encode or decode.
    #[error(transparent)]
    Event(#[from] midikit_core::Error),
}

impl SmfError {
    #[inline]
    pub(crate) const fn malformed(offset: usize, reason: &'static str) -> Self {
        Self::Malformed { offset, reason }
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, SmfError>;
