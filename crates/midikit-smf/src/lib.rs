//! Standard MIDI File codec.
//!
//! Big-endian chunked container: an `MThd` header followed by `MTrk`
//! tracks (and any unrecognized chunks, preserved verbatim). Track events
//! are delta-timed with variable-length quantities; running status is
//! recognised on parse and optionally emitted on encode.
//!
//! # Example
//!
//! ```
//! use midikit_smf::prelude::*;
//!
//! let mut file = MidiFile::new(
//!     SmfFormat::SingleTrack,
//!     TimeBase::Musical { ticks_per_quarter: 480 },
//! );
//! file.chunks.push(Chunk::Track(vec![
//!     TrackEvent::new(0, SmfEvent::Meta(MetaEvent::Tempo { micros_per_quarter: 500_000 })),
//!     TrackEvent::new(0, SmfEvent::Meta(MetaEvent::EndOfTrack)),
//! ]));
//!
//! let bytes = encode_smf(&file)?;
//! assert_eq!(parse_smf(&bytes)?, file);
//! # Ok::<(), midikit_smf::SmfError>(())
//! ```

mod encode;
mod error;
pub mod file;
pub mod meta;
mod parse;
pub mod tempo;
pub mod vlq;

pub use encode::{encode_smf, encode_smf_with, SmfEncodeOptions};
pub use error::{Result, SmfError};
pub use file::{Chunk, MidiFile, SmfEvent, SmfFormat, SmpteFps, TimeBase, TrackEvent};
pub use meta::{MetaEvent, SmpteOffset, TextKind};
pub use parse::{parse_smf, parse_smf_with, SmfParseOptions, DEFAULT_CHUNK_CAP};
pub use tempo::{TempoEntry, TempoMap};

/// Recommended imports.
pub mod prelude {
    pub use crate::encode::{encode_smf, encode_smf_with, SmfEncodeOptions};
    pub use crate::file::{
        Chunk, MidiFile, SmfEvent, SmfFormat, SmpteFps, TimeBase, TrackEvent,
    };
    pub use crate::meta::{MetaEvent, SmpteOffset, TextKind};
    pub use crate::parse::{parse_smf, parse_smf_with, SmfParseOptions};
    pub use crate::tempo::TempoMap;
}
