//! The MIDI event model.
//!
//! A single sum type covers every channel-voice, system-common,
//! system-real-time, system-exclusive and utility message of MIDI 1.0 and
//! MIDI 2.0. Payload values that exist at different resolutions in the two
//! protocols ([`Velocity`], [`ControlValue`], [`BendValue`], [`ParamValue`])
//! carry their native representation and convert on demand.

use crate::controller::{Controller, ParamChange, PerNoteController, RegisteredParameter};
use crate::manufacturer::ManufacturerId;
use crate::num::{self, U14, U16, U32, U4, U7};
use smallvec::SmallVec;

/// Which protocol's wire representation a codec should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Protocol {
    Midi1,
    Midi2,
}

/// Note velocity: 7-bit in MIDI 1.0, 16-bit in MIDI 2.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Velocity {
    Midi1(U7),
    Midi2(U16),
}

impl Velocity {
    /// The 7-bit value, downscaled if natively 16-bit.
    #[inline]
    pub const fn midi1(self) -> U7 {
        match self {
            Self::Midi1(v) => v,
            Self::Midi2(v) => U7::new(num::downscale(v.as_u32(), 16, 7) as u8),
        }
    }

    /// The 16-bit value, Min-Center-Max upscaled if natively 7-bit.
    #[inline]
    pub const fn midi2(self) -> U16 {
        match self {
            Self::Midi1(v) => U16::new(num::upscale(v.as_u32(), 7, 16) as u16),
            Self::Midi2(v) => v,
        }
    }

    /// Unit-interval view of the native value.
    #[inline]
    pub fn unit(self) -> f64 {
        match self {
            Self::Midi1(v) => v.as_unit(),
            Self::Midi2(v) => v.as_unit(),
        }
    }

    /// Whether the native value is zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        match self {
            Self::Midi1(v) => v.get() == 0,
            Self::Midi2(v) => v.get() == 0,
        }
    }
}

/// Controller / pressure amount: 7-bit in MIDI 1.0, 32-bit in MIDI 2.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlValue {
    Midi1(U7),
    Midi2(U32),
}

impl ControlValue {
    #[inline]
    pub const fn midi1(self) -> U7 {
        match self {
            Self::Midi1(v) => v,
            Self::Midi2(v) => U7::new(num::downscale(v.get(), 32, 7) as u8),
        }
    }

    #[inline]
    pub const fn midi2(self) -> U32 {
        match self {
            Self::Midi1(v) => U32::new(num::upscale(v.as_u32(), 7, 32)),
            Self::Midi2(v) => v,
        }
    }

    #[inline]
    pub fn unit(self) -> f64 {
        match self {
            Self::Midi1(v) => v.as_unit(),
            Self::Midi2(v) => v.as_unit(),
        }
    }
}

/// Pitch bend: 14-bit in MIDI 1.0, 32-bit in MIDI 2.0. Center means no
/// bend in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BendValue {
    Midi1(U14),
    Midi2(U32),
}

impl BendValue {
    /// Center (no bend) in the MIDI 1.0 representation.
    pub const CENTER_MIDI1: Self = Self::Midi1(U14::CENTER);

    #[inline]
    pub const fn midi1(self) -> U14 {
        match self {
            Self::Midi1(v) => v,
            Self::Midi2(v) => U14::new(num::downscale(v.get(), 32, 14) as u16),
        }
    }

    #[inline]
    pub const fn midi2(self) -> U32 {
        match self {
            Self::Midi1(v) => U32::new(num::upscale(v.as_u32(), 14, 32)),
            Self::Midi2(v) => v,
        }
    }

    #[inline]
    pub fn unit(self) -> f64 {
        match self {
            Self::Midi1(v) => v.as_unit(),
            Self::Midi2(v) => v.as_unit(),
        }
    }
}

/// RPN/NRPN data value: a 14-bit MSB/LSB pair in MIDI 1.0, 32 bits in
/// MIDI 2.0. Relative changes reinterpret the 32-bit form as two's
/// complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    Midi1(U14),
    Midi2(U32),
}

impl ParamValue {
    #[inline]
    pub const fn midi1(self) -> U14 {
        match self {
            Self::Midi1(v) => v,
            Self::Midi2(v) => U14::new(num::downscale(v.get(), 32, 14) as u16),
        }
    }

    #[inline]
    pub const fn midi2(self) -> U32 {
        match self {
            Self::Midi1(v) => U32::new(num::upscale(v.as_u32(), 14, 32)),
            Self::Midi2(v) => v,
        }
    }

    /// The 32-bit form reinterpreted as a signed relative adjustment.
    #[inline]
    pub const fn as_relative(self) -> i32 {
        self.midi2().get() as i32
    }
}

/// MIDI 2.0 per-note attribute attached to note-on/off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteAttribute {
    /// Attribute type 0x01.
    ManufacturerSpecific(U16),
    /// Attribute type 0x02.
    ProfileSpecific(U16),
    /// Attribute type 0x03: pitch in 7.9 fixed point.
    Pitch7_9 {
        /// Semitone part.
        note: U7,
        /// Fraction of a semitone in 1/512 steps (9 bits).
        fraction: u16,
    },
    /// An attribute type this library does not know; carried verbatim.
    Unknown { attr_type: u8, data: U16 },
}

impl NoteAttribute {
    /// The wire attribute-type byte.
    pub const fn attr_type(self) -> u8 {
        match self {
            Self::ManufacturerSpecific(_) => 0x01,
            Self::ProfileSpecific(_) => 0x02,
            Self::Pitch7_9 { .. } => 0x03,
            Self::Unknown { attr_type, .. } => attr_type,
        }
    }

    /// The 16-bit wire attribute data.
    pub const fn data(self) -> U16 {
        match self {
            Self::ManufacturerSpecific(data) | Self::ProfileSpecific(data) => data,
            Self::Pitch7_9 { note, fraction } => {
                U16::new(((note.get() as u16) << 9) | (fraction & 0x01FF))
            }
            Self::Unknown { data, .. } => data,
        }
    }

    /// Reconstructs from the wire pair; `None` when the type byte is zero
    /// (no attribute).
    pub const fn from_wire(attr_type: u8, data: U16) -> Option<Self> {
        match attr_type {
            0x00 => None,
            0x01 => Some(Self::ManufacturerSpecific(data)),
            0x02 => Some(Self::ProfileSpecific(data)),
            0x03 => Some(Self::Pitch7_9 {
                note: U7::new((data.get() >> 9) as u8),
                fraction: data.get() & 0x01FF,
            }),
            _ => Some(Self::Unknown { attr_type, data }),
        }
    }
}

/// A channel voice message. Carried inside
/// [`MidiEvent::ChannelVoice`] together with its group and channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelVoiceMsg {
    NoteOff {
        note: U7,
        velocity: Velocity,
        attribute: Option<NoteAttribute>,
    },
    NoteOn {
        note: U7,
        velocity: Velocity,
        attribute: Option<NoteAttribute>,
    },
    /// Polyphonic (per-note) pressure.
    NotePressure { note: U7, amount: ControlValue },
    /// MIDI 2.0 per-note controller.
    NoteCc {
        note: U7,
        controller: PerNoteController,
        value: U32,
    },
    /// MIDI 2.0 per-note pitch bend.
    NotePitchBend { note: U7, value: U32 },
    /// MIDI 2.0 per-note management.
    NoteManagement { note: U7, detach: bool, reset: bool },
    ControlChange {
        controller: Controller,
        value: ControlValue,
    },
    ProgramChange { program: U7, bank: Option<U14> },
    ChannelPressure { amount: ControlValue },
    PitchBend { value: BendValue },
    /// Registered parameter change. MIDI 1.0 spells this as a CC
    /// transaction; MIDI 2.0 as a single packet whose status carries
    /// `change`.
    Rpn {
        parameter: RegisteredParameter,
        value: ParamValue,
        change: ParamChange,
    },
    /// Non-registered parameter change.
    Nrpn {
        parameter: U14,
        value: ParamValue,
        change: ParamChange,
    },
}

/// A system common message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SystemCommonMsg {
    /// MTC quarter-frame (`F1`); the payload nibbles are interpreted by the
    /// MTC receiver, not here.
    TimecodeQuarterFrame { data: U7 },
    /// `F2`, 14-bit beat position.
    SongPositionPointer { beat: U14 },
    /// `F3`.
    SongSelect { number: U7 },
    /// `F6`.
    TuneRequest,
}

/// A system real-time message (`F8..=FF`, minus the undefined bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SystemRealTimeMsg {
    TimingClock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
    SystemReset,
}

impl SystemRealTimeMsg {
    /// The status byte.
    pub const fn status(self) -> u8 {
        match self {
            Self::TimingClock => 0xF8,
            Self::Start => 0xFA,
            Self::Continue => 0xFB,
            Self::Stop => 0xFC,
            Self::ActiveSensing => 0xFE,
            Self::SystemReset => 0xFF,
        }
    }

    /// The message for a real-time status byte; `None` for the undefined
    /// bytes `F9`/`FD`.
    pub const fn from_status(status: u8) -> Option<Self> {
        match status {
            0xF8 => Some(Self::TimingClock),
            0xFA => Some(Self::Start),
            0xFB => Some(Self::Continue),
            0xFC => Some(Self::Stop),
            0xFE => Some(Self::ActiveSensing),
            0xFF => Some(Self::SystemReset),
            _ => None,
        }
    }
}

/// MIDI 2.0 utility message (UMP message type 0x0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UtilityMsg {
    NoOp,
    JrClock { time: U16 },
    JrTimestamp { time: U16 },
}

/// Universal SysEx flavor: `0x7E` (non-realtime) or `0x7F` (realtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UniversalKind {
    NonRealtime,
    Realtime,
}

impl UniversalKind {
    /// The SysEx prefix byte.
    pub const fn prefix(self) -> u8 {
        match self {
            Self::NonRealtime => 0x7E,
            Self::Realtime => 0x7F,
        }
    }
}

/// A system exclusive message. SysEx7 payload bytes are 7-bit; SysEx8
/// payloads use all 8 bits and add a stream ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SysExMsg {
    SysEx7 {
        group: U4,
        manufacturer: ManufacturerId,
        data: Vec<u8>,
    },
    UniversalSysEx7 {
        group: U4,
        kind: UniversalKind,
        device_id: U7,
        sub_id1: U7,
        sub_id2: U7,
        data: Vec<u8>,
    },
    SysEx8 {
        group: U4,
        stream_id: u8,
        manufacturer: ManufacturerId,
        data: Vec<u8>,
    },
    UniversalSysEx8 {
        group: U4,
        stream_id: u8,
        kind: UniversalKind,
        device_id: U7,
        sub_id1: U7,
        sub_id2: U7,
        data: Vec<u8>,
    },
}

impl SysExMsg {
    /// The UMP group.
    pub const fn group(&self) -> U4 {
        match self {
            Self::SysEx7 { group, .. }
            | Self::UniversalSysEx7 { group, .. }
            | Self::SysEx8 { group, .. }
            | Self::UniversalSysEx8 { group, .. } => *group,
        }
    }

    /// Whether this is an 8-bit (UMP-only) message.
    pub const fn is_eight_bit(&self) -> bool {
        matches!(self, Self::SysEx8 { .. } | Self::UniversalSysEx8 { .. })
    }
}

/// A MIDI event: the top-level sum over everything the three wire codecs
/// can produce or consume.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MidiEvent {
    ChannelVoice {
        group: U4,
        channel: U4,
        msg: ChannelVoiceMsg,
    },
    SystemCommon { group: U4, msg: SystemCommonMsg },
    SystemRealTime { group: U4, msg: SystemRealTimeMsg },
    SysEx(SysExMsg),
    Utility { group: U4, msg: UtilityMsg },
    /// A well-formed UMP this decoder passes through verbatim (flex data,
    /// stream messages).
    Unrecognized {
        group: U4,
        words: SmallVec<[u32; 4]>,
    },
}

impl MidiEvent {
    /// Note On on `channel`, group 0.
    #[inline]
    pub fn note_on(channel: U4, note: U7, velocity: Velocity) -> Self {
        Self::ChannelVoice {
            group: U4::MIN,
            channel,
            msg: ChannelVoiceMsg::NoteOn {
                note,
                velocity,
                attribute: None,
            },
        }
    }

    /// Note Off on `channel`, group 0.
    #[inline]
    pub fn note_off(channel: U4, note: U7, velocity: Velocity) -> Self {
        Self::ChannelVoice {
            group: U4::MIN,
            channel,
            msg: ChannelVoiceMsg::NoteOff {
                note,
                velocity,
                attribute: None,
            },
        }
    }

    /// Control change on `channel`, group 0.
    #[inline]
    pub fn control_change(channel: U4, controller: Controller, value: ControlValue) -> Self {
        Self::ChannelVoice {
            group: U4::MIN,
            channel,
            msg: ChannelVoiceMsg::ControlChange { controller, value },
        }
    }

    /// Program change without bank select, group 0.
    #[inline]
    pub fn program_change(channel: U4, program: U7) -> Self {
        Self::ChannelVoice {
            group: U4::MIN,
            channel,
            msg: ChannelVoiceMsg::ProgramChange {
                program,
                bank: None,
            },
        }
    }

    /// Pitch bend, group 0.
    #[inline]
    pub fn pitch_bend(channel: U4, value: BendValue) -> Self {
        Self::ChannelVoice {
            group: U4::MIN,
            channel,
            msg: ChannelVoiceMsg::PitchBend { value },
        }
    }

    /// Channel pressure, group 0.
    #[inline]
    pub fn channel_pressure(channel: U4, amount: ControlValue) -> Self {
        Self::ChannelVoice {
            group: U4::MIN,
            channel,
            msg: ChannelVoiceMsg::ChannelPressure { amount },
        }
    }

    /// Returns the event with its UMP group replaced.
    pub fn with_group(mut self, new_group: U4) -> Self {
        match &mut self {
            Self::ChannelVoice { group, .. }
            | Self::SystemCommon { group, .. }
            | Self::SystemRealTime { group, .. }
            | Self::Utility { group, .. }
            | Self::Unrecognized { group, .. } => *group = new_group,
            Self::SysEx(msg) => match msg {
                SysExMsg::SysEx7 { group, .. }
                | SysExMsg::UniversalSysEx7 { group, .. }
                | SysExMsg::SysEx8 { group, .. }
                | SysExMsg::UniversalSysEx8 { group, .. } => *group = new_group,
            },
        }
        self
    }

    /// The UMP group (0 in MIDI 1.0 contexts).
    pub const fn group(&self) -> U4 {
        match self {
            Self::ChannelVoice { group, .. }
            | Self::SystemCommon { group, .. }
            | Self::SystemRealTime { group, .. }
            | Self::Utility { group, .. }
            | Self::Unrecognized { group, .. } => *group,
            Self::SysEx(msg) => msg.group(),
        }
    }

    /// The channel, for channel voice events.
    pub const fn channel(&self) -> Option<U4> {
        match self {
            Self::ChannelVoice { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    /// The note number, for per-note events.
    pub const fn note(&self) -> Option<U7> {
        match self {
            Self::ChannelVoice { msg, .. } => match msg {
                ChannelVoiceMsg::NoteOn { note, .. }
                | ChannelVoiceMsg::NoteOff { note, .. }
                | ChannelVoiceMsg::NotePressure { note, .. }
                | ChannelVoiceMsg::NoteCc { note, .. }
                | ChannelVoiceMsg::NotePitchBend { note, .. }
                | ChannelVoiceMsg::NoteManagement { note, .. } => Some(*note),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether this is a note-on with nonzero velocity.
    pub const fn is_note_on(&self) -> bool {
        matches!(
            self,
            Self::ChannelVoice {
                msg: ChannelVoiceMsg::NoteOn { velocity, .. },
                ..
            } if !velocity.is_zero()
        )
    }

    /// Whether this ends a note: a note-off, or a MIDI 1.0 note-on with
    /// velocity zero.
    pub const fn is_note_off(&self) -> bool {
        match self {
            Self::ChannelVoice { msg, .. } => match msg {
                ChannelVoiceMsg::NoteOff { .. } => true,
                ChannelVoiceMsg::NoteOn {
                    velocity: Velocity::Midi1(v),
                    ..
                } => v.get() == 0,
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_conversion() {
        assert_eq!(Velocity::Midi1(U7::new(0)).midi2(), U16::new(0));
        assert_eq!(Velocity::Midi1(U7::new(64)).midi2(), U16::new(0x8000));
        assert_eq!(Velocity::Midi1(U7::new(127)).midi2(), U16::MAX);
        assert_eq!(Velocity::Midi2(U16::new(0xC000)).midi1(), U7::new(0x60));
        for v in 0..=127u8 {
            let up = Velocity::Midi1(U7::new(v)).midi2();
            assert_eq!(Velocity::Midi2(up).midi1(), U7::new(v));
        }
    }

    #[test]
    fn test_bend_center_maps_to_center() {
        assert_eq!(BendValue::Midi1(U14::CENTER).midi2(), U32::CENTER);
        assert_eq!(BendValue::Midi2(U32::CENTER).midi1(), U14::CENTER);
    }

    #[test]
    fn test_note_attribute_wire() {
        let attr = NoteAttribute::Pitch7_9 {
            note: U7::new(60),
            fraction: 256,
        };
        assert_eq!(attr.attr_type(), 0x03);
        assert_eq!(
            NoteAttribute::from_wire(attr.attr_type(), attr.data()),
            Some(attr)
        );
        assert_eq!(NoteAttribute::from_wire(0x00, U16::new(5)), None);
    }

    #[test]
    fn test_note_on_off_predicates() {
        let on = MidiEvent::note_on(U4::new(0), U7::new(60), Velocity::Midi1(U7::new(100)));
        assert!(on.is_note_on());
        assert!(!on.is_note_off());
        assert_eq!(on.note(), Some(U7::new(60)));

        let silent = MidiEvent::note_on(U4::new(0), U7::new(60), Velocity::Midi1(U7::new(0)));
        assert!(!silent.is_note_on());
        assert!(silent.is_note_off());
    }

    #[test]
    fn test_with_group() {
        let e = MidiEvent::note_on(U4::new(3), U7::new(60), Velocity::Midi1(U7::new(1)))
            .with_group(U4::new(5));
        assert_eq!(e.group(), U4::new(5));
        assert_eq!(e.channel(), Some(U4::new(3)));

        let sysex = MidiEvent::SysEx(SysExMsg::SysEx7 {
            group: U4::MIN,
            manufacturer: ManufacturerId::Standard(0x41),
            data: vec![1, 2, 3],
        })
        .with_group(U4::new(7));
        assert_eq!(sysex.group(), U4::new(7));
    }

    #[test]
    fn test_realtime_status_bijection() {
        for msg in [
            SystemRealTimeMsg::TimingClock,
            SystemRealTimeMsg::Start,
            SystemRealTimeMsg::Continue,
            SystemRealTimeMsg::Stop,
            SystemRealTimeMsg::ActiveSensing,
            SystemRealTimeMsg::SystemReset,
        ] {
            assert_eq!(SystemRealTimeMsg::from_status(msg.status()), Some(msg));
        }
        assert_eq!(SystemRealTimeMsg::from_status(0xF9), None);
        assert_eq!(SystemRealTimeMsg::from_status(0xFD), None);
    }
}
