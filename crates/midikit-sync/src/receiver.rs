//! The MTC receiver state machine.
//!
//! Reconstructs SMPTE timecode from an interleaved stream of quarter-frame
//! messages or full-frame SysEx. Single-writer: one thread feeds events;
//! any number of threads may read the published snapshot. The receiver
//! never errors: unrecognised input is ignored and the quarter-frame
//! buffer self-heals once eight in-order pieces arrive again.

use crate::timecode::{LocalRate, MtcRate, Timecode};
use arc_swap::ArcSwap;
use midikit_core::event::{MidiEvent, SysExMsg, SystemCommonMsg, UniversalKind};
use midikit_core::num::U7;
use std::sync::Arc;

/// Tape direction inferred from successive quarter-frame piece indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Forwards,
    Backwards,
    #[default]
    Ambiguous,
}

/// What produced an emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MtcSource {
    QuarterFrame,
    FullFrame,
}

/// One decoded timecode emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MtcUpdate {
    pub timecode: Timecode,
    pub rate: MtcRate,
    pub source: MtcSource,
    pub direction: Direction,
    /// Whether the whole-frame part changed since the previous emission.
    pub frame_changed: bool,
}

/// The cross-thread readable state of a receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MtcSnapshot {
    pub timecode: Timecode,
    pub rate: MtcRate,
    pub direction: Direction,
}

/// Cloneable read handle onto a receiver's latest emission.
#[derive(Clone)]
pub struct MtcSnapshotHandle(Arc<ArcSwap<MtcSnapshot>>);

impl MtcSnapshotHandle {
    /// The most recently published snapshot. Consistent: readers never see
    /// a partially updated timecode.
    pub fn load(&self) -> MtcSnapshot {
        **self.0.load()
    }
}

type UpdateHandler = Box<dyn FnMut(&MtcUpdate) + Send>;

/// MTC decoder. Feed it decoded [`MidiEvent`]s; it emits timecode updates.
pub struct MtcReceiver {
    /// One 4-bit register per quarter-frame piece.
    registers: [u8; 8],
    /// Received flags, one bit per piece.
    received: u8,
    last_piece: Option<u8>,
    direction: Direction,
    /// Whole timecode captured at the last window boundary.
    snapshot: Timecode,
    capture_direction: Direction,
    /// Quarter-frames seen since the capture, signed by direction.
    delta_qfs: i32,
    synced: bool,
    rate: MtcRate,
    local_rate: Option<LocalRate>,
    last_emitted: Option<Timecode>,
    published: Arc<ArcSwap<MtcSnapshot>>,
    handler: Option<UpdateHandler>,
}

impl Default for MtcReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl MtcReceiver {
    pub fn new() -> Self {
        Self {
            registers: [0; 8],
            received: 0,
            last_piece: None,
            direction: Direction::Ambiguous,
            snapshot: Timecode::ZERO,
            capture_direction: Direction::Ambiguous,
            delta_qfs: 0,
            synced: false,
            rate: MtcRate::default(),
            local_rate: None,
            last_emitted: None,
            published: Arc::new(ArcSwap::from_pointee(MtcSnapshot::default())),
            handler: None,
        }
    }

    /// Scales emissions to this rate when it is compatible with the
    /// incoming MTC rate; otherwise the MTC rate's direct equivalent is
    /// used.
    pub fn set_local_rate(&mut self, rate: Option<LocalRate>) {
        self.local_rate = rate;
    }

    /// Installs a callback invoked on every emission, on the feeding
    /// thread.
    pub fn on_update(&mut self, handler: impl FnMut(&MtcUpdate) + Send + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// A cloneable cross-thread read handle.
    pub fn snapshot_handle(&self) -> MtcSnapshotHandle {
        MtcSnapshotHandle(Arc::clone(&self.published))
    }

    /// The most recently emitted timecode.
    pub fn timecode(&self) -> Timecode {
        self.published.load().timecode
    }

    /// The most recently seen MTC rate.
    pub fn rate(&self) -> MtcRate {
        self.rate
    }

    /// The current direction inference.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Clears the quarter-frame registers and received flags.
    pub fn reset_qf_buffer(&mut self) {
        self.registers = [0; 8];
        self.received = 0;
        self.last_piece = None;
        self.synced = false;
        self.delta_qfs = 0;
    }

    /// Zeroes the timecode without clearing the detected rate.
    pub fn reset_timecode(&mut self) {
        self.snapshot = Timecode::ZERO;
        self.last_emitted = None;
        self.published.store(Arc::new(MtcSnapshot {
            timecode: Timecode::ZERO,
            rate: self.rate,
            direction: self.direction,
        }));
    }

    /// Feeds one event. Non-MTC events are ignored. Returns the emission,
    /// if this event produced one; the installed handler sees it too.
    pub fn feed(&mut self, event: &MidiEvent) -> Option<MtcUpdate> {
        let update = match event {
            MidiEvent::SystemCommon {
                msg: SystemCommonMsg::TimecodeQuarterFrame { data },
                ..
            } => self.process_quarter_frame(*data),
            MidiEvent::SysEx(SysExMsg::UniversalSysEx7 {
                kind: UniversalKind::Realtime,
                sub_id1,
                sub_id2,
                data,
                ..
            }) if sub_id1.get() == 0x01 && sub_id2.get() == 0x01 => self.process_full_frame(data),
            _ => None,
        };
        if let Some(update) = update {
            self.publish(&update);
            if let Some(handler) = self.handler.as_mut() {
                handler(&update);
            }
            return Some(update);
        }
        None
    }

    fn process_quarter_frame(&mut self, data: U7) -> Option<MtcUpdate> {
        let piece = data.get() >> 4;
        let nibble = data.get() & 0x0F;

        let direction = match self.last_piece {
            None => Direction::Ambiguous,
            Some(last) if piece == (last + 1) % 8 => Direction::Forwards,
            Some(last) if (piece + 1) % 8 == last => Direction::Backwards,
            Some(_) => Direction::Ambiguous,
        };
        if self.last_piece.is_some() && direction == Direction::Ambiguous {
            // Discontinuity: drop everything assembled so far and start
            // re-accumulating from this piece.
            tracing::trace!(piece, "quarter-frame discontinuity, resetting buffer");
            self.reset_qf_buffer();
        }
        self.last_piece = Some(piece);
        self.direction = direction;

        self.registers[piece as usize] = nibble;
        self.received |= 1 << piece;
        if self.received != 0xFF {
            return None;
        }

        // The registers hold one coherent timecode at a window boundary:
        // piece 7 going forwards, piece 0 going backwards, or the moment
        // the buffer first completes.
        let at_boundary = match direction {
            Direction::Backwards => piece == 0,
            _ => piece == 7,
        };
        if !self.synced || at_boundary {
            self.rate = MtcRate::from_code((self.registers[7] >> 1) & 0x03);
            self.snapshot = self.assemble();
            self.capture_direction = direction;
            self.delta_qfs = 0;
            self.synced = true;
        } else {
            self.delta_qfs += match direction {
                Direction::Forwards => 1,
                Direction::Backwards => -1,
                Direction::Ambiguous => 0,
            };
        }

        // The assembled value is two frames old by the time the eighth
        // piece lands; quarter-frames since then interpolate in 1/4-frame
        // steps.
        let offset: i64 = match self.capture_direction {
            Direction::Backwards => -2,
            _ => 2,
        };
        let fps = self.rate.nominal();
        let mut timecode = self
            .snapshot
            .offset_frames(offset + self.delta_qfs.div_euclid(4) as i64, fps);
        timecode.subframes = (self.delta_qfs.rem_euclid(4) * 25) as u8;
        Some(self.finish(timecode, MtcSource::QuarterFrame))
    }

    fn process_full_frame(&mut self, data: &[u8]) -> Option<MtcUpdate> {
        let [hours_rate, minutes, seconds, frames] = data else {
            tracing::debug!(len = data.len(), "ignoring malformed full-frame payload");
            return None;
        };
        self.rate = MtcRate::from_code((hours_rate >> 5) & 0x03);
        self.snapshot = Timecode::new(hours_rate & 0x1F, *minutes, *seconds, *frames);
        self.delta_qfs = 0;
        self.synced = true;
        self.capture_direction = self.direction;
        // The quarter-frame registers are left alone; a resuming QF stream
        // re-captures at its next window boundary.
        Some(self.finish(self.snapshot, MtcSource::FullFrame))
    }

    fn assemble(&self) -> Timecode {
        Timecode::new(
            ((self.registers[7] & 0x01) << 4) | self.registers[6],
            ((self.registers[5] & 0x03) << 4) | self.registers[4],
            ((self.registers[3] & 0x03) << 4) | self.registers[2],
            ((self.registers[1] & 0x01) << 4) | self.registers[0],
        )
    }

    fn finish(&mut self, timecode: Timecode, source: MtcSource) -> MtcUpdate {
        let timecode = match self.local_rate.and_then(|local| local.multiplier_of(self.rate)) {
            Some(k) => timecode.scale_frames(k),
            None => timecode,
        };
        let frame_changed = self.last_emitted.map_or(true, |last| {
            (last.hours, last.minutes, last.seconds, last.frames)
                != (
                    timecode.hours,
                    timecode.minutes,
                    timecode.seconds,
                    timecode.frames,
                )
        });
        self.last_emitted = Some(timecode);
        MtcUpdate {
            timecode,
            rate: self.rate,
            source,
            direction: self.direction,
            frame_changed,
        }
    }

    fn publish(&self, update: &MtcUpdate) {
        self.published.store(Arc::new(MtcSnapshot {
            timecode: update.timecode,
            rate: update.rate,
            direction: update.direction,
        }));
    }
}
