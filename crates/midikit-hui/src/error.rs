//! Error types for the HUI codec.

use thiserror::Error;

/// Error type for HUI encoding and decoding.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuiError {
    /// The message violates the HUI wire conventions (bad SysEx sub-id,
    /// truncated display payload).
    #[error("malformed hui message: {reason}")]
    Malformed { reason: &'static str },

    /// Well-formed but not expressible (display text beyond 7 bits, LED
    /// ring update for the scroll encoder).
    #[error("unsupported: {what}")]
    Unsupported { what: &'static str },

    /// An embedded MIDI event failed to encode.
    #[error(transparent)]
    Event(#[from] midikit_core::Error),
}

impl HuiError {
    #[inline]
    pub(crate) const fn malformed(reason: &'static str) -> Self {
        Self::Malformed { reason }
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, HuiError>;
