//! Protocol core for MIDI 1.0 and MIDI 2.0.
//!
//! Provides the type-safe event model, the restricted-width value types,
//! and the two wire codecs (MIDI 1.0 byte stream, Universal MIDI Packet),
//! plus stream filters and the stateful CC-transaction combiners.
//!
//! Codecs are pure: they hold no shared state, never touch I/O and never
//! log. Errors propagate to the caller with input offsets.
//!
//! # Example
//!
//! ```
//! use midikit_core::prelude::*;
//!
//! let event = MidiEvent::note_on(U4::new(0), Note::C4.number(), Velocity::Midi1(U7::new(100)));
//!
//! // MIDI 1.0 wire bytes.
//! let bytes = event.to_midi1_bytes()?;
//! assert_eq!(bytes, vec![0x90, 60, 100]);
//!
//! // The same event as a MIDI 2.0 UMP, velocity upscaled to 16 bits.
//! let words = event.ump_words(Protocol::Midi2)?;
//! assert_eq!(words.len(), 2);
//! # Ok::<(), midikit_core::Error>(())
//! ```

pub mod combine;
pub mod controller;
mod error;
pub mod event;
pub mod filter;
pub mod manufacturer;
pub mod midi1;
pub mod note;
pub mod num;
pub mod ump;

#[cfg(feature = "serde")]
mod serde_support;

pub use error::{Error, Result};
pub use event::{
    BendValue, ChannelVoiceMsg, ControlValue, MidiEvent, NoteAttribute, ParamValue, Protocol,
    SysExMsg, SystemCommonMsg, SystemRealTimeMsg, UniversalKind, UtilityMsg, Velocity,
};
pub use manufacturer::ManufacturerId;
pub use note::Note;
pub use num::{U14, U16, U25, U32, U4, U7};

/// Recommended imports.
pub mod prelude {
    pub use crate::controller::{
        Controller, ParamChange, PerNoteController, RegisteredParameter,
    };
    pub use crate::event::{
        BendValue, ChannelVoiceMsg, ControlValue, MidiEvent, NoteAttribute, ParamValue, Protocol,
        SysExMsg, SystemCommonMsg, SystemRealTimeMsg, UniversalKind, UtilityMsg, Velocity,
    };
    pub use crate::filter::{EventKind, FilterKind, MidiFilter};
    pub use crate::manufacturer::ManufacturerId;
    pub use crate::midi1::decode_midi1;
    pub use crate::note::Note;
    pub use crate::num::{U14, U16, U25, U32, U4, U7};
    pub use crate::ump::decode_ump;
}
