//! MIDI 1.0 byte-stream codec.
//!
//! The encoder emits one complete message per event (no running status at
//! this layer; the SMF encoder imposes it explicitly when configured). The
//! decoder is an explicit state machine that accepts real-time bytes in any
//! state without disturbing the message being assembled.

use crate::error::{Error, Result};
use crate::event::{
    BendValue, ChannelVoiceMsg, ControlValue, MidiEvent, SysExMsg, SystemCommonMsg,
    SystemRealTimeMsg, Velocity,
};
use crate::controller::{Controller, ParamChange};
use crate::manufacturer::ManufacturerId;
use crate::num::{U14, U4, U7};
use smallvec::SmallVec;

/// Default cap on an accumulated system-exclusive body.
pub const DEFAULT_SYSEX_CAP: usize = 65_536;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

impl MidiEvent {
    /// The MIDI 1.0 status byte, for events that encode as a single
    /// MIDI 1.0 message.
    pub fn raw_status_byte(&self) -> Option<u8> {
        match self {
            Self::ChannelVoice { channel, msg, .. } => {
                let nibble: u8 = match msg {
                    ChannelVoiceMsg::NoteOff { .. } => 0x80,
                    ChannelVoiceMsg::NoteOn { .. } => 0x90,
                    ChannelVoiceMsg::NotePressure { .. } => 0xA0,
                    ChannelVoiceMsg::ControlChange { .. } => 0xB0,
                    ChannelVoiceMsg::ProgramChange { .. } => 0xC0,
                    ChannelVoiceMsg::ChannelPressure { .. } => 0xD0,
                    ChannelVoiceMsg::PitchBend { .. } => 0xE0,
                    // CC transactions or MIDI 2.0-only; no single status.
                    _ => return None,
                };
                Some(nibble | channel.get())
            }
            Self::SystemCommon { msg, .. } => Some(match msg {
                SystemCommonMsg::TimecodeQuarterFrame { .. } => 0xF1,
                SystemCommonMsg::SongPositionPointer { .. } => 0xF2,
                SystemCommonMsg::SongSelect { .. } => 0xF3,
                SystemCommonMsg::TuneRequest => 0xF6,
            }),
            Self::SystemRealTime { msg, .. } => Some(msg.status()),
            Self::SysEx(msg) if !msg.is_eight_bit() => Some(0xF0),
            _ => None,
        }
    }

    /// The MIDI 1.0 data bytes following [`Self::raw_status_byte`], for
    /// events that encode as a single channel or system-common message.
    pub fn raw_data_bytes(&self) -> Option<SmallVec<[u8; 2]>> {
        let bytes: SmallVec<[u8; 2]> = match self {
            Self::ChannelVoice { msg, .. } => match msg {
                ChannelVoiceMsg::NoteOff { note, velocity, .. }
                | ChannelVoiceMsg::NoteOn { note, velocity, .. } => {
                    SmallVec::from_slice(&[note.get(), velocity.midi1().get()])
                }
                ChannelVoiceMsg::NotePressure { note, amount } => {
                    SmallVec::from_slice(&[note.get(), amount.midi1().get()])
                }
                ChannelVoiceMsg::ControlChange { controller, value } => {
                    SmallVec::from_slice(&[controller.number().get(), value.midi1().get()])
                }
                ChannelVoiceMsg::ProgramChange { program, .. } => {
                    SmallVec::from_slice(&[program.get()])
                }
                ChannelVoiceMsg::ChannelPressure { amount } => {
                    SmallVec::from_slice(&[amount.midi1().get()])
                }
                ChannelVoiceMsg::PitchBend { value } => {
                    let (msb, lsb) = value.midi1().into_pair();
                    SmallVec::from_slice(&[lsb.get(), msb.get()])
                }
                _ => return None,
            },
            Self::SystemCommon { msg, .. } => match msg {
                SystemCommonMsg::TimecodeQuarterFrame { data } => {
                    SmallVec::from_slice(&[data.get()])
                }
                SystemCommonMsg::SongPositionPointer { beat } => {
                    let (msb, lsb) = beat.into_pair();
                    SmallVec::from_slice(&[lsb.get(), msb.get()])
                }
                SystemCommonMsg::SongSelect { number } => SmallVec::from_slice(&[number.get()]),
                SystemCommonMsg::TuneRequest => SmallVec::new(),
            },
            Self::SystemRealTime { .. } => SmallVec::new(),
            _ => return None,
        };
        Some(bytes)
    }

    /// Encodes to MIDI 1.0 wire bytes.
    ///
    /// Events whose MIDI 1.0 spelling is a CC transaction (RPN, NRPN,
    /// bank-qualified program change) produce the full multi-message
    /// sequence. Returns [`Error::Unsupported`] for events with no MIDI 1.0
    /// representation at all.
    pub fn to_midi1_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        encode(self, &mut out)?;
        Ok(out)
    }
}

/// Encodes `event` onto the end of `out`. See
/// [`MidiEvent::to_midi1_bytes`].
pub fn encode(event: &MidiEvent, out: &mut Vec<u8>) -> Result<()> {
    if let MidiEvent::ChannelVoice { channel, msg, .. } = event {
        let cc_status = 0xB0 | channel.get();
        match msg {
            ChannelVoiceMsg::ProgramChange {
                program,
                bank: Some(bank),
            } => {
                let (msb, lsb) = bank.into_pair();
                out.extend_from_slice(&[cc_status, 0x00, msb.get()]);
                out.extend_from_slice(&[cc_status, 0x20, lsb.get()]);
                out.extend_from_slice(&[0xC0 | channel.get(), program.get()]);
                return Ok(());
            }
            ChannelVoiceMsg::Rpn {
                parameter,
                value,
                change,
            } => {
                let (pmsb, plsb) = parameter.number().into_pair();
                out.extend_from_slice(&[cc_status, 101, pmsb.get()]);
                out.extend_from_slice(&[cc_status, 100, plsb.get()]);
                encode_param_data(cc_status, *value, *change, out);
                return Ok(());
            }
            ChannelVoiceMsg::Nrpn {
                parameter,
                value,
                change,
            } => {
                let (pmsb, plsb) = parameter.into_pair();
                out.extend_from_slice(&[cc_status, 99, pmsb.get()]);
                out.extend_from_slice(&[cc_status, 98, plsb.get()]);
                encode_param_data(cc_status, *value, *change, out);
                return Ok(());
            }
            ChannelVoiceMsg::NoteCc { .. }
            | ChannelVoiceMsg::NotePitchBend { .. }
            | ChannelVoiceMsg::NoteManagement { .. } => {
                return Err(Error::Unsupported {
                    what: "per-note controllers exist only in MIDI 2.0",
                });
            }
            _ => {}
        }
    }
    if let MidiEvent::SysEx(msg) = event {
        return encode_sysex(msg, out);
    }
    // Everything else is a single-message event fully described by its raw
    // status and data bytes, or has no MIDI 1.0 form at all.
    match (event.raw_status_byte(), event.raw_data_bytes()) {
        (Some(status), Some(data)) => {
            out.push(status);
            out.extend_from_slice(&data);
            Ok(())
        }
        _ => Err(Error::Unsupported {
            what: "event has no MIDI 1.0 representation",
        }),
    }
}

fn encode_param_data(
    cc_status: u8,
    value: crate::event::ParamValue,
    change: ParamChange,
    out: &mut Vec<u8>,
) {
    match change {
        ParamChange::Absolute => {
            let (vmsb, vlsb) = value.midi1().into_pair();
            out.extend_from_slice(&[cc_status, 6, vmsb.get()]);
            out.extend_from_slice(&[cc_status, 38, vlsb.get()]);
        }
        ParamChange::Relative => {
            // Data increment / decrement; the data byte carries the
            // magnitude, clamped to 7 bits.
            let delta = value.as_relative();
            let cc = if delta < 0 { 97 } else { 96 };
            let magnitude = delta.unsigned_abs().min(127) as u8;
            out.extend_from_slice(&[cc_status, cc, magnitude]);
        }
    }
}

fn encode_sysex(msg: &SysExMsg, out: &mut Vec<u8>) -> Result<()> {
    match msg {
        SysExMsg::SysEx7 {
            manufacturer, data, ..
        } => {
            out.push(0xF0);
            out.extend_from_slice(&manufacturer.to_bytes());
            out.extend_from_slice(data);
            out.push(0xF7);
            Ok(())
        }
        SysExMsg::UniversalSysEx7 {
            kind,
            device_id,
            sub_id1,
            sub_id2,
            data,
            ..
        } => {
            out.push(0xF0);
            out.extend_from_slice(&[
                kind.prefix(),
                device_id.get(),
                sub_id1.get(),
                sub_id2.get(),
            ]);
            out.extend_from_slice(data);
            out.push(0xF7);
            Ok(())
        }
        SysExMsg::SysEx8 { .. } | SysExMsg::UniversalSysEx8 { .. } => Err(Error::Unsupported {
            what: "8-bit system exclusive exists only in UMP",
        }),
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Options for the byte-stream decoder.
#[derive(Debug, Clone, Copy)]
pub struct Midi1ParseOptions {
    /// Translate MIDI 1.0 note-on with velocity 0 into note-off on decode.
    pub translate_zero_velocity_note_on: bool,
    /// Maximum accumulated system-exclusive body length.
    pub sysex_cap: usize,
}

impl Default for Midi1ParseOptions {
    fn default() -> Self {
        Self {
            translate_zero_velocity_note_on: true,
            sysex_cap: DEFAULT_SYSEX_CAP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Data1Expected { status: u8 },
    Data2Expected { status: u8, data1: u8 },
    SysExBody,
}

/// Streaming MIDI 1.0 decoder. Feed bytes one at a time; complete events
/// come back as they finish. Real-time bytes interleave freely.
#[derive(Debug)]
pub struct Midi1Parser {
    state: State,
    sysex: Vec<u8>,
    offset: usize,
    options: Midi1ParseOptions,
}

impl Default for Midi1Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Midi1Parser {
    pub fn new() -> Self {
        Self::with_options(Midi1ParseOptions::default())
    }

    pub fn with_options(options: Midi1ParseOptions) -> Self {
        Self {
            state: State::Idle,
            sysex: Vec::new(),
            offset: 0,
            options,
        }
    }

    /// Whether the parser is between messages.
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Consumes one byte. Returns a completed event, an error, or nothing
    /// if the byte only advanced the state machine. After an error the
    /// parser is idle again and subsequent well-formed input decodes
    /// normally.
    pub fn feed(&mut self, byte: u8) -> Option<Result<MidiEvent>> {
        let offset = self.offset;
        self.offset += 1;

        // Real-time bytes are side-band in every state.
        if byte >= 0xF8 {
            return Some(match SystemRealTimeMsg::from_status(byte) {
                Some(msg) => Ok(MidiEvent::SystemRealTime {
                    group: U4::MIN,
                    msg,
                }),
                None => Err(Error::malformed(offset, "undefined real-time status byte")),
            });
        }

        match self.state {
            State::Idle => self.feed_idle(byte, offset),
            State::Data1Expected { status } => {
                if byte >= 0x80 {
                    self.state = State::Idle;
                    return Some(Err(Error::malformed(offset, "status byte where data expected")));
                }
                if expects_two_data_bytes(status) {
                    self.state = State::Data2Expected {
                        status,
                        data1: byte,
                    };
                    None
                } else {
                    self.state = State::Idle;
                    Some(self.complete(status, byte, 0))
                }
            }
            State::Data2Expected { status, data1 } => {
                if byte >= 0x80 {
                    self.state = State::Idle;
                    return Some(Err(Error::malformed(offset, "status byte where data expected")));
                }
                self.state = State::Idle;
                Some(self.complete(status, data1, byte))
            }
            State::SysExBody => {
                if byte == 0xF7 {
                    self.state = State::Idle;
                    let body = core::mem::take(&mut self.sysex);
                    Some(parse_sysex_body(&body, offset))
                } else if byte >= 0x80 {
                    self.state = State::Idle;
                    self.sysex.clear();
                    Some(Err(Error::malformed(
                        offset,
                        "unterminated system exclusive",
                    )))
                } else if self.sysex.len() >= self.options.sysex_cap {
                    self.state = State::Idle;
                    self.sysex.clear();
                    Some(Err(Error::malformed(
                        offset,
                        "system exclusive exceeds byte cap",
                    )))
                } else {
                    self.sysex.push(byte);
                    None
                }
            }
        }
    }

    fn feed_idle(&mut self, byte: u8, offset: usize) -> Option<Result<MidiEvent>> {
        match byte {
            0x80..=0xEF => {
                self.state = State::Data1Expected { status: byte };
                None
            }
            0xF0 => {
                self.sysex.clear();
                self.state = State::SysExBody;
                None
            }
            0xF1 | 0xF2 | 0xF3 => {
                self.state = State::Data1Expected { status: byte };
                None
            }
            0xF6 => Some(Ok(MidiEvent::SystemCommon {
                group: U4::MIN,
                msg: SystemCommonMsg::TuneRequest,
            })),
            0xF4 | 0xF5 | 0xF7 => Some(Err(Error::malformed(offset, "undefined status byte"))),
            _ => Some(Err(Error::malformed(
                offset,
                "data byte outside a message (running status is not valid on the wire)",
            ))),
        }
    }

    fn complete(&self, status: u8, data1: u8, data2: u8) -> Result<MidiEvent> {
        let group = U4::MIN;
        if status >= 0xF0 {
            let msg = match status {
                0xF1 => SystemCommonMsg::TimecodeQuarterFrame {
                    data: U7::new(data1),
                },
                0xF2 => SystemCommonMsg::SongPositionPointer {
                    beat: U14::from_pair(U7::new(data2), U7::new(data1)),
                },
                0xF3 => SystemCommonMsg::SongSelect {
                    number: U7::new(data1),
                },
                _ => unreachable!("only F1-F3 carry data"),
            };
            return Ok(MidiEvent::SystemCommon { group, msg });
        }

        channel_voice_from_bytes(
            status,
            data1,
            data2,
            self.options.translate_zero_velocity_note_on,
        )
    }
}

fn expects_two_data_bytes(status: u8) -> bool {
    if status < 0xF0 {
        channel_voice_data_len(status) == 2
    } else {
        status == 0xF2
    }
}

/// Number of data bytes following a channel voice status byte.
pub const fn channel_voice_data_len(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 1,
        _ => 2,
    }
}

/// Decodes one channel voice message (`0x80..=0xEF` status) from its
/// status and data bytes. Used by the byte-stream state machine and by the
/// SMF track parser, which frames messages itself.
pub fn channel_voice_from_bytes(
    status: u8,
    data1: u8,
    data2: u8,
    translate_zero_velocity_note_on: bool,
) -> Result<MidiEvent> {
    if !(0x80..=0xEF).contains(&status) {
        return Err(Error::OutOfRange {
            field: "channel voice status",
            value: status as u32,
            bound: 0xEF,
        });
    }
    for data in [data1, data2] {
        if data > 0x7F {
            return Err(Error::OutOfRange {
                field: "data byte",
                value: data as u32,
                bound: 0x7F,
            });
        }
    }

    let channel = U4::new(status & 0x0F);
    let msg = match status & 0xF0 {
        0x80 => ChannelVoiceMsg::NoteOff {
            note: U7::new(data1),
            velocity: Velocity::Midi1(U7::new(data2)),
            attribute: None,
        },
        0x90 => {
            if data2 == 0 && translate_zero_velocity_note_on {
                ChannelVoiceMsg::NoteOff {
                    note: U7::new(data1),
                    velocity: Velocity::Midi1(U7::MIN),
                    attribute: None,
                }
            } else {
                ChannelVoiceMsg::NoteOn {
                    note: U7::new(data1),
                    velocity: Velocity::Midi1(U7::new(data2)),
                    attribute: None,
                }
            }
        }
        0xA0 => ChannelVoiceMsg::NotePressure {
            note: U7::new(data1),
            amount: ControlValue::Midi1(U7::new(data2)),
        },
        0xB0 => ChannelVoiceMsg::ControlChange {
            controller: Controller::from_number(U7::new(data1)),
            value: ControlValue::Midi1(U7::new(data2)),
        },
        0xC0 => ChannelVoiceMsg::ProgramChange {
            program: U7::new(data1),
            bank: None,
        },
        0xD0 => ChannelVoiceMsg::ChannelPressure {
            amount: ControlValue::Midi1(U7::new(data1)),
        },
        _ => ChannelVoiceMsg::PitchBend {
            value: BendValue::Midi1(U14::from_pair(U7::new(data2), U7::new(data1))),
        },
    };
    Ok(MidiEvent::ChannelVoice {
        group: U4::MIN,
        channel,
        msg,
    })
}

/// Interprets an accumulated `F0..F7` body (exclusive of the frame bytes).
fn parse_sysex_body(body: &[u8], offset: usize) -> Result<MidiEvent> {
    let group = U4::MIN;
    match body.first() {
        None => Err(Error::malformed(offset, "empty system exclusive")),
        Some(&prefix @ (0x7E | 0x7F)) => {
            if body.len() < 4 {
                return Err(Error::malformed(offset, "truncated universal sysex header"));
            }
            let kind = if prefix == 0x7E {
                crate::event::UniversalKind::NonRealtime
            } else {
                crate::event::UniversalKind::Realtime
            };
            Ok(MidiEvent::SysEx(SysExMsg::UniversalSysEx7 {
                group,
                kind,
                device_id: U7::new(body[1]),
                sub_id1: U7::new(body[2]),
                sub_id2: U7::new(body[3]),
                data: body[4..].to_vec(),
            }))
        }
        Some(_) => {
            let (manufacturer, consumed) =
                ManufacturerId::parse(body).map_err(|_| Error::malformed(offset, "invalid manufacturer id"))?;
            Ok(MidiEvent::SysEx(SysExMsg::SysEx7 {
                group,
                manufacturer,
                data: body[consumed..].to_vec(),
            }))
        }
    }
}

/// Decodes a MIDI 1.0 byte stream into events.
///
/// Truncated trailing input yields one final [`Error::Malformed`].
pub fn decode_midi1(bytes: &[u8]) -> Midi1Decoder<'_> {
    Midi1Decoder {
        parser: Midi1Parser::new(),
        bytes,
        pos: 0,
        finished: false,
    }
}

/// Iterator returned by [`decode_midi1`].
#[derive(Debug)]
pub struct Midi1Decoder<'a> {
    parser: Midi1Parser,
    bytes: &'a [u8],
    pos: usize,
    finished: bool,
}

impl Midi1Decoder<'_> {
    /// Replaces the decoder options (affects bytes not yet consumed).
    pub fn with_options(mut self, options: Midi1ParseOptions) -> Self {
        self.parser.options = options;
        self
    }
}

impl Iterator for Midi1Decoder<'_> {
    type Item = Result<MidiEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            self.pos += 1;
            if let Some(result) = self.parser.feed(byte) {
                return Some(result);
            }
        }
        if !self.finished {
            self.finished = true;
            if !self.parser.is_idle() {
                return Some(Err(Error::malformed(self.bytes.len(), "truncated event")));
            }
        }
        None
    }
}
