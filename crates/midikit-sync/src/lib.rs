//! MIDI Time Code: SMPTE timecode over MIDI.
//!
//! [`MtcReceiver`] reconstructs timecode from quarter-frame streams and
//! full-frame SysEx, with direction detection, frame-rate scaling and
//! subframe interpolation. [`generator`] produces the mirror-image
//! messages for transmitters.
//!
//! # Example
//!
//! ```
//! use midikit_core::num::{U4, U7};
//! use midikit_sync::{generator, MtcRate, MtcReceiver, Timecode};
//!
//! let mut receiver = MtcReceiver::new();
//! let mut last = None;
//! for event in generator::quarter_frames(&Timecode::new(1, 0, 0, 0), MtcRate::Fps25, U4::MIN) {
//!     last = receiver.feed(&event);
//! }
//! // Emissions compensate for the two-frame quarter-frame latency.
//! assert_eq!(last.unwrap().timecode, Timecode::new(1, 0, 0, 2));
//! ```

pub mod generator;
mod receiver;
mod timecode;

pub use receiver::{
    Direction, MtcReceiver, MtcSnapshot, MtcSnapshotHandle, MtcSource, MtcUpdate,
};
pub use timecode::{LocalRate, MtcRate, Timecode};
