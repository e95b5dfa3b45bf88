//! The Standard MIDI File model.

use crate::meta::MetaEvent;
use midikit_core::MidiEvent;

/// SMF header format word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmfFormat {
    /// Format 0: one track.
    SingleTrack,
    /// Format 1: simultaneous tracks.
    MultiTrack,
    /// Format 2: independent sequences.
    MultiSequence,
}

impl SmfFormat {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::SingleTrack => 0,
            Self::MultiTrack => 1,
            Self::MultiSequence => 2,
        }
    }

    pub const fn from_u16(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::SingleTrack),
            1 => Some(Self::MultiTrack),
            2 => Some(Self::MultiSequence),
            _ => None,
        }
    }
}

/// The four SMPTE frame rates MIDI can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmpteFps {
    Fps24,
    Fps25,
    /// 29.97 fps drop-frame.
    Fps2997Drop,
    Fps30,
}

impl SmpteFps {
    /// Nominal whole frames per second (29.97 drop reports 30).
    pub const fn nominal(self) -> u8 {
        match self {
            Self::Fps24 => 24,
            Self::Fps25 => 25,
            Self::Fps2997Drop | Self::Fps30 => 30,
        }
    }

    /// The 2-bit code used by the SMPTE-offset meta event and MTC.
    pub const fn code(self) -> u8 {
        match self {
            Self::Fps24 => 0,
            Self::Fps25 => 1,
            Self::Fps2997Drop => 2,
            Self::Fps30 => 3,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Fps24),
            1 => Some(Self::Fps25),
            2 => Some(Self::Fps2997Drop),
            3 => Some(Self::Fps30),
            _ => None,
        }
    }

    /// The negated fps byte of the header division word (`-24`, `-25`,
    /// `-29`, `-30`).
    pub const fn division_byte(self) -> i8 {
        match self {
            Self::Fps24 => -24,
            Self::Fps25 => -25,
            Self::Fps2997Drop => -29,
            Self::Fps30 => -30,
        }
    }

    pub const fn from_division_byte(byte: i8) -> Option<Self> {
        match byte {
            -24 => Some(Self::Fps24),
            -25 => Some(Self::Fps25),
            -29 => Some(Self::Fps2997Drop),
            -30 => Some(Self::Fps30),
            _ => None,
        }
    }
}

/// The header division word: musical (ticks per quarter note) or
/// SMPTE-timecode based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeBase {
    Musical {
        /// 15-bit ticks per quarter note.
        ticks_per_quarter: u16,
    },
    Timecode { fps: SmpteFps, ticks_per_frame: u8 },
}

impl TimeBase {
    /// The wire division word.
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Musical { ticks_per_quarter } => ticks_per_quarter & 0x7FFF,
            Self::Timecode {
                fps,
                ticks_per_frame,
            } => (((fps.division_byte() as u8) as u16) << 8) | ticks_per_frame as u16,
        }
    }
}

/// One chunk of an SMF file. Unknown chunk types round-trip verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Chunk {
    Track(Vec<TrackEvent>),
    Unrecognized { id: [u8; 4], data: Vec<u8> },
}

/// A delta-timed event inside a track.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackEvent {
    /// Ticks since the previous event in the track.
    pub delta: u32,
    pub event: SmfEvent,
}

impl TrackEvent {
    #[inline]
    pub fn new(delta: u32, event: SmfEvent) -> Self {
        Self { delta, event }
    }
}

/// The event payload of a [`TrackEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmfEvent {
    /// A channel voice event.
    Channel(MidiEvent),
    /// A meta event (`FF type len data`).
    Meta(MetaEvent),
    /// Length-prefixed system exclusive (`F0 len data`). `data` is stored
    /// verbatim, conventionally ending with the `F7` terminator.
    SysEx { data: Vec<u8> },
    /// The `F7` escape form carrying arbitrary bytes.
    Escape { data: Vec<u8> },
}

/// A parsed Standard MIDI File.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MidiFile {
    pub format: SmfFormat,
    pub time_base: TimeBase,
    /// All chunks in file order, tracks and unrecognized alike.
    pub chunks: Vec<Chunk>,
}

impl MidiFile {
    /// An empty file with the given format and time base.
    pub fn new(format: SmfFormat, time_base: TimeBase) -> Self {
        Self {
            format,
            time_base,
            chunks: Vec::new(),
        }
    }

    /// Iterates over the track chunks only.
    pub fn tracks(&self) -> impl Iterator<Item = &Vec<TrackEvent>> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            Chunk::Track(events) => Some(events),
            Chunk::Unrecognized { .. } => None,
        })
    }

    /// Number of track chunks (the header `ntrks` word).
    pub fn track_count(&self) -> usize {
        self.tracks().count()
    }
}
