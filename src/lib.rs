//! # MIDIKit - MIDI 1.0 / MIDI 2.0 protocol core
//!
//! Umbrella crate over the protocol subsystems:
//!
//! - **midikit-core** - Event model, value types, MIDI 1.0 byte codec,
//!   Universal MIDI Packet codec, stream filters and CC combiners
//! - **midikit-smf** - Standard MIDI File parser/encoder (feature: `smf`)
//! - **midikit-sync** - MIDI Time Code receiver and generator (feature:
//!   `sync`)
//! - **midikit-hui** - HUI control-surface protocol and surface model
//!   (feature: `hui`)
//!
//! The core never touches I/O: bytes and packets come in from whatever
//! transport the application uses, events come out, and the mirror image
//! on the way back.
//!
//! ## Quick start
//!
//! ```
//! use midikit::prelude::*;
//!
//! // Decode a MIDI 1.0 byte stream.
//! let events: Vec<_> = decode_midi1(&[0x90, 60, 100, 0xE0, 0x00, 0x40])
//!     .collect::<Result<_, _>>()?;
//! assert!(events[0].is_note_on());
//!
//! // Re-encode the same events as MIDI 2.0 packets.
//! for event in &events {
//!     let words = event.ump_words(Protocol::Midi2)?;
//!     assert_eq!(words.len(), 2);
//! }
//! # Ok::<(), midikit::Error>(())
//! ```
//!
//! ## Feature flags
//!
//! - `smf`, `sync`, `hui` - subsystem crates (all on by default)
//! - `serde` - serialization for the model types
//! - `full` - everything

pub use midikit_core as core;
pub use midikit_core::{Error, Result};

#[cfg(feature = "hui")]
pub use midikit_hui as hui;
#[cfg(feature = "smf")]
pub use midikit_smf as smf;
#[cfg(feature = "sync")]
pub use midikit_sync as sync;

/// Recommended imports across all enabled subsystems.
pub mod prelude {
    pub use midikit_core::prelude::*;

    #[cfg(feature = "smf")]
    pub use midikit_smf::prelude::*;

    #[cfg(feature = "sync")]
    pub use midikit_sync::{
        Direction, LocalRate, MtcRate, MtcReceiver, MtcUpdate, Timecode,
    };

    #[cfg(feature = "hui")]
    pub use midikit_hui::prelude::*;
}
