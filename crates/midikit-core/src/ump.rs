//! Universal MIDI Packet codec.
//!
//! Every packet starts with a 32-bit word whose top nibble is the message
//! type; a fixed table gives the packet length in words. The decoder
//! consumes exactly that many words per packet and never peeks beyond.
//! Multi-packet SysEx streams reassemble per UMP group under a byte cap.

use crate::controller::{ParamChange, PerNoteController, RegisteredParameter};
use crate::error::{Error, Result};
use crate::event::{
    BendValue, ChannelVoiceMsg, ControlValue, MidiEvent, NoteAttribute, ParamValue, Protocol,
    SysExMsg, SystemCommonMsg, SystemRealTimeMsg, UniversalKind, UtilityMsg, Velocity,
};
use crate::manufacturer::ManufacturerId;
use crate::num::{U14, U16, U32, U4, U7};
use smallvec::SmallVec;

/// Default cap on a reassembled system-exclusive stream, per group.
pub const DEFAULT_SYSEX_CAP: usize = 65_536;

/// Words per packet, indexed by message-type nibble.
const WORD_COUNTS: [usize; 16] = [1, 1, 1, 2, 2, 4, 1, 1, 2, 2, 2, 3, 3, 4, 4, 4];

/// The packet length in 32-bit words for a message-type nibble.
#[inline]
pub const fn word_count(message_type: u8) -> usize {
    WORD_COUNTS[(message_type & 0x0F) as usize]
}

#[inline]
const fn pack(mt: u8, group: U4, b1: u8, b2: u8, b3: u8) -> u32 {
    ((mt as u32) << 28)
        | ((group.get() as u32) << 24)
        | ((b1 as u32) << 16)
        | ((b2 as u32) << 8)
        | (b3 as u32)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

impl MidiEvent {
    /// Encodes to UMP words.
    ///
    /// Channel voice events pick the MIDI 1.0 (MT 0x2) or MIDI 2.0 (MT 0x4)
    /// packet family per `protocol`, scaling values with the Min-Center-Max
    /// rule where the native resolution differs. Events whose MIDI 1.0
    /// spelling is a CC transaction produce one MT 0x2 packet per CC.
    pub fn ump_words(&self, protocol: Protocol) -> Result<SmallVec<[u32; 4]>> {
        let mut out = SmallVec::new();
        match self {
            Self::ChannelVoice {
                group,
                channel,
                msg,
            } => match protocol {
                Protocol::Midi1 => encode_midi1_voice(*group, *channel, msg, &mut out)?,
                Protocol::Midi2 => encode_midi2_voice(*group, *channel, msg, &mut out),
            },
            Self::SystemCommon { group, msg } => {
                let (status, d1, d2) = match msg {
                    SystemCommonMsg::TimecodeQuarterFrame { data } => (0xF1, data.get(), 0),
                    SystemCommonMsg::SongPositionPointer { beat } => {
                        let (msb, lsb) = beat.into_pair();
                        (0xF2, lsb.get(), msb.get())
                    }
                    SystemCommonMsg::SongSelect { number } => (0xF3, number.get(), 0),
                    SystemCommonMsg::TuneRequest => (0xF6, 0, 0),
                };
                out.push(pack(0x1, *group, status, d1, d2));
            }
            Self::SystemRealTime { group, msg } => {
                out.push(pack(0x1, *group, msg.status(), 0, 0));
            }
            Self::Utility { group, msg } => {
                let (status, time) = match msg {
                    UtilityMsg::NoOp => (0x0u32, 0),
                    UtilityMsg::JrClock { time } => (0x1, time.as_u32()),
                    UtilityMsg::JrTimestamp { time } => (0x2, time.as_u32()),
                };
                out.push(((group.get() as u32) << 24) | (status << 20) | time);
            }
            Self::SysEx(msg) => encode_sysex(msg, &mut out),
            Self::Unrecognized { words, .. } => out.extend_from_slice(words),
        }
        Ok(out)
    }
}

/// One MT 0x2 packet per MIDI 1.0 message of the event.
fn encode_midi1_voice(
    group: U4,
    channel: U4,
    msg: &ChannelVoiceMsg,
    out: &mut SmallVec<[u32; 4]>,
) -> Result<()> {
    let event = MidiEvent::ChannelVoice {
        group,
        channel,
        msg: *msg,
    };
    let mut bytes = Vec::new();
    crate::midi1::encode(&event, &mut bytes)?;
    // The byte encoder emits complete status+data messages back to back;
    // repackage each as one word.
    let mut pos = 0;
    while pos < bytes.len() {
        let status = bytes[pos];
        let len = midi1_voice_data_len(status);
        let d1 = if len >= 1 { bytes[pos + 1] } else { 0 };
        let d2 = if len >= 2 { bytes[pos + 2] } else { 0 };
        out.push(pack(0x2, group, status, d1, d2));
        pos += 1 + len;
    }
    Ok(())
}

const fn midi1_voice_data_len(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 1,
        _ => 2,
    }
}

fn encode_midi2_voice(group: U4, channel: U4, msg: &ChannelVoiceMsg, out: &mut SmallVec<[u32; 4]>) {
    let op = |opcode: u8| (opcode << 4) | channel.get();
    let (w0, w1) = match msg {
        ChannelVoiceMsg::NoteOff {
            note,
            velocity,
            attribute,
        }
        | ChannelVoiceMsg::NoteOn {
            note,
            velocity,
            attribute,
        } => {
            let opcode = if matches!(msg, ChannelVoiceMsg::NoteOn { .. }) {
                0x9
            } else {
                0x8
            };
            let (attr_type, attr_data) = match attribute {
                Some(attr) => (attr.attr_type(), attr.data().as_u32()),
                None => (0, 0),
            };
            (
                pack(0x4, group, op(opcode), note.get(), attr_type),
                (velocity.midi2().as_u32() << 16) | attr_data,
            )
        }
        ChannelVoiceMsg::NotePressure { note, amount } => (
            pack(0x4, group, op(0xA), note.get(), 0),
            amount.midi2().get(),
        ),
        ChannelVoiceMsg::NoteCc {
            note,
            controller,
            value,
        } => {
            let (opcode, index) = match controller {
                PerNoteController::Registered(index) => (0x0, index.get()),
                PerNoteController::Assignable(index) => (0x1, index.get()),
            };
            (pack(0x4, group, op(opcode), note.get(), index), value.get())
        }
        ChannelVoiceMsg::NotePitchBend { note, value } => {
            (pack(0x4, group, op(0x6), note.get(), 0), value.get())
        }
        ChannelVoiceMsg::NoteManagement {
            note,
            detach,
            reset,
        } => {
            let flags = ((*detach as u8) << 1) | *reset as u8;
            (pack(0x4, group, op(0xF), note.get(), flags), 0)
        }
        ChannelVoiceMsg::ControlChange { controller, value } => (
            pack(0x4, group, op(0xB), controller.number().get(), 0),
            value.midi2().get(),
        ),
        ChannelVoiceMsg::ProgramChange { program, bank } => {
            let flags = bank.is_some() as u8;
            let (msb, lsb) = match bank {
                Some(bank) => {
                    let (msb, lsb) = bank.into_pair();
                    (msb.get(), lsb.get())
                }
                None => (0, 0),
            };
            (
                pack(0x4, group, op(0xC), 0, flags),
                ((program.get() as u32) << 24) | ((msb as u32) << 8) | lsb as u32,
            )
        }
        ChannelVoiceMsg::ChannelPressure { amount } => {
            (pack(0x4, group, op(0xD), 0, 0), amount.midi2().get())
        }
        ChannelVoiceMsg::PitchBend { value } => {
            (pack(0x4, group, op(0xE), 0, 0), value.midi2().get())
        }
        ChannelVoiceMsg::Rpn {
            parameter,
            value,
            change,
        } => {
            let opcode = match change {
                ParamChange::Absolute => 0x2,
                ParamChange::Relative => 0x4,
            };
            let (msb, lsb) = parameter.number().into_pair();
            (
                pack(0x4, group, op(opcode), msb.get(), lsb.get()),
                value.midi2().get(),
            )
        }
        ChannelVoiceMsg::Nrpn {
            parameter,
            value,
            change,
        } => {
            let opcode = match change {
                ParamChange::Absolute => 0x3,
                ParamChange::Relative => 0x5,
            };
            let (msb, lsb) = parameter.into_pair();
            (
                pack(0x4, group, op(opcode), msb.get(), lsb.get()),
                value.midi2().get(),
            )
        }
    };
    out.push(w0);
    out.push(w1);
}

fn encode_sysex(msg: &SysExMsg, out: &mut SmallVec<[u32; 4]>) {
    match msg {
        SysExMsg::SysEx7 {
            group,
            manufacturer,
            data,
        } => {
            let mut body: Vec<u8> = manufacturer.to_bytes().to_vec();
            body.extend_from_slice(data);
            encode_sysex7_packets(*group, &body, out);
        }
        SysExMsg::UniversalSysEx7 {
            group,
            kind,
            device_id,
            sub_id1,
            sub_id2,
            data,
        } => {
            let mut body = vec![
                kind.prefix(),
                device_id.get(),
                sub_id1.get(),
                sub_id2.get(),
            ];
            body.extend_from_slice(data);
            encode_sysex7_packets(*group, &body, out);
        }
        SysExMsg::SysEx8 {
            group,
            stream_id,
            manufacturer,
            data,
        } => {
            let mut body: Vec<u8> = manufacturer.to_bytes().to_vec();
            body.extend_from_slice(data);
            encode_sysex8_packets(*group, *stream_id, &body, out);
        }
        SysExMsg::UniversalSysEx8 {
            group,
            stream_id,
            kind,
            device_id,
            sub_id1,
            sub_id2,
            data,
        } => {
            let mut body = vec![
                kind.prefix(),
                device_id.get(),
                sub_id1.get(),
                sub_id2.get(),
            ];
            body.extend_from_slice(data);
            encode_sysex8_packets(*group, *stream_id, &body, out);
        }
    }
}

/// Stream-format nibbles shared by SysEx7 and SysEx8 packets.
mod stream_format {
    pub const COMPLETE: u8 = 0x0;
    pub const START: u8 = 0x1;
    pub const CONTINUE: u8 = 0x2;
    pub const END: u8 = 0x3;
}

fn sysex7_format(index: usize, chunks: usize) -> u8 {
    if chunks == 1 {
        stream_format::COMPLETE
    } else if index == 0 {
        stream_format::START
    } else if index == chunks - 1 {
        stream_format::END
    } else {
        stream_format::CONTINUE
    }
}

fn encode_sysex7_packets(group: U4, body: &[u8], out: &mut SmallVec<[u32; 4]>) {
    let chunks = body.chunks(6).len().max(1);
    for (index, chunk) in body.chunks(6).chain(body.is_empty().then_some(&[][..])).enumerate() {
        let format = sysex7_format(index, chunks);
        let mut bytes = [0u8; 6];
        bytes[..chunk.len()].copy_from_slice(chunk);
        out.push(pack(
            0x3,
            group,
            (format << 4) | chunk.len() as u8,
            bytes[0],
            bytes[1],
        ));
        out.push(u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]));
    }
}

fn encode_sysex8_packets(group: U4, stream_id: u8, body: &[u8], out: &mut SmallVec<[u32; 4]>) {
    let chunks = body.chunks(13).len().max(1);
    for (index, chunk) in body.chunks(13).chain(body.is_empty().then_some(&[][..])).enumerate() {
        let format = sysex7_format(index, chunks);
        let mut bytes = [0u8; 13];
        bytes[..chunk.len()].copy_from_slice(chunk);
        // Byte count includes the stream id.
        out.push(
            ((0x5u32) << 28)
                | ((group.get() as u32) << 24)
                | ((((format << 4) | (chunk.len() as u8 + 1)) as u32) << 16)
                | ((stream_id as u32) << 8)
                | bytes[0] as u32,
        );
        out.push(u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]));
        out.push(u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]));
        out.push(u32::from_be_bytes([
            bytes[9], bytes[10], bytes[11], bytes[12],
        ]));
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Options for the UMP decoder.
#[derive(Debug, Clone, Copy)]
pub struct UmpParseOptions {
    /// Per-group cap on a reassembled SysEx stream.
    pub sysex_cap: usize,
    /// Translate MT 0x2 note-on with velocity 0 into note-off.
    pub translate_zero_velocity_note_on: bool,
}

impl Default for UmpParseOptions {
    fn default() -> Self {
        Self {
            sysex_cap: DEFAULT_SYSEX_CAP,
            translate_zero_velocity_note_on: true,
        }
    }
}

#[derive(Debug)]
struct Assembly {
    eight_bit: bool,
    stream_id: u8,
    buf: Vec<u8>,
}

/// Decodes a UMP word stream into events.
pub fn decode_ump(words: &[u32]) -> UmpDecoder<'_> {
    UmpDecoder {
        words,
        pos: 0,
        finished: false,
        options: UmpParseOptions::default(),
        assembly: Default::default(),
    }
}

/// Iterator returned by [`decode_ump`].
#[derive(Debug)]
pub struct UmpDecoder<'a> {
    words: &'a [u32],
    pos: usize,
    finished: bool,
    options: UmpParseOptions,
    /// In-flight SysEx reassembly, per UMP group.
    assembly: [Option<Assembly>; 16],
}

impl UmpDecoder<'_> {
    /// Replaces the decoder options (affects packets not yet consumed).
    pub fn with_options(mut self, options: UmpParseOptions) -> Self {
        self.options = options;
        self
    }

    fn decode_packet(&mut self, index: usize) -> Result<Option<MidiEvent>> {
        let words = self.words;
        let w0 = words[self.pos];
        let mt = (w0 >> 28) as u8;
        let needed = word_count(mt);
        if words.len() - self.pos < needed {
            self.pos = words.len();
            return Err(Error::malformed(index, "truncated packet"));
        }
        let packet = &words[self.pos..self.pos + needed];
        self.pos += needed;

        let group = U4::new(((w0 >> 24) & 0x0F) as u8);
        match mt {
            0x0 => decode_utility(group, w0, index).map(Some),
            0x1 => decode_system(group, w0, index).map(Some),
            0x2 => decode_midi1_voice(group, w0, index, &self.options).map(Some),
            0x3 => self.decode_sysex7(group, packet, index),
            0x4 => decode_midi2_voice(group, packet, index).map(Some),
            0x5 => self.decode_data128(group, packet, index),
            0xD | 0xF => Ok(Some(MidiEvent::Unrecognized {
                group,
                words: SmallVec::from_slice(packet),
            })),
            _ => Err(Error::Unsupported {
                what: "reserved ump message type",
            }),
        }
    }

    fn decode_sysex7(
        &mut self,
        group: U4,
        packet: &[u32],
        index: usize,
    ) -> Result<Option<MidiEvent>> {
        let w0 = packet[0];
        let format = ((w0 >> 20) & 0x0F) as u8;
        let count = ((w0 >> 16) & 0x0F) as usize;
        if count > 6 {
            return Err(Error::malformed(index, "sysex7 byte count exceeds 6"));
        }
        let w1 = packet[1].to_be_bytes();
        let bytes = [
            ((w0 >> 8) & 0xFF) as u8,
            (w0 & 0xFF) as u8,
            w1[0],
            w1[1],
            w1[2],
            w1[3],
        ];
        for &byte in &bytes[..count] {
            // F0/F7 framing embedded by MIDI 1.0-era senders is tolerated
            // and stripped during reassembly.
            if byte > 0x7F && byte != 0xF0 && byte != 0xF7 {
                return Err(Error::malformed(index, "sysex7 data byte exceeds 7 bits"));
            }
        }
        self.accumulate(group, false, 0, &bytes[..count], format, index)
    }

    fn decode_data128(
        &mut self,
        group: U4,
        packet: &[u32],
        index: usize,
    ) -> Result<Option<MidiEvent>> {
        let w0 = packet[0];
        let format = ((w0 >> 20) & 0x0F) as u8;
        if format == 0x8 || format == 0x9 {
            return Err(Error::Unsupported {
                what: "mixed data set",
            });
        }
        if format > stream_format::END {
            return Err(Error::malformed(index, "unknown sysex stream format"));
        }
        let count = ((w0 >> 16) & 0x0F) as usize;
        if !(1..=14).contains(&count) {
            return Err(Error::malformed(index, "sysex8 byte count out of range"));
        }
        let stream_id = ((w0 >> 8) & 0xFF) as u8;
        let w1 = packet[1].to_be_bytes();
        let w2 = packet[2].to_be_bytes();
        let w3 = packet[3].to_be_bytes();
        let bytes = [
            (w0 & 0xFF) as u8,
            w1[0], w1[1], w1[2], w1[3],
            w2[0], w2[1], w2[2], w2[3],
            w3[0], w3[1], w3[2], w3[3],
        ];
        // The count includes the stream id byte.
        self.accumulate(group, true, stream_id, &bytes[..count - 1], format, index)
    }

    fn accumulate(
        &mut self,
        group: U4,
        eight_bit: bool,
        stream_id: u8,
        bytes: &[u8],
        format: u8,
        index: usize,
    ) -> Result<Option<MidiEvent>> {
        let slot = &mut self.assembly[group.get() as usize];
        match format {
            stream_format::COMPLETE => {
                *slot = None;
                finish_sysex(group, eight_bit, stream_id, bytes, index).map(Some)
            }
            stream_format::START => {
                if slot.is_some() {
                    *slot = None;
                    return Err(Error::malformed(index, "sysex start interrupts open stream"));
                }
                *slot = Some(Assembly {
                    eight_bit,
                    stream_id,
                    buf: bytes.to_vec(),
                });
                Ok(None)
            }
            stream_format::CONTINUE | stream_format::END => {
                let Some(mut assembly) = slot.take() else {
                    return Err(Error::malformed(index, "sysex continue without start"));
                };
                if assembly.eight_bit != eight_bit {
                    return Err(Error::malformed(index, "sysex stream width mismatch"));
                }
                if assembly.buf.len() + bytes.len() > self.options.sysex_cap {
                    return Err(Error::malformed(index, "sysex stream exceeds byte cap"));
                }
                assembly.buf.extend_from_slice(bytes);
                if format == stream_format::CONTINUE {
                    *slot = Some(assembly);
                    Ok(None)
                } else {
                    finish_sysex(
                        group,
                        assembly.eight_bit,
                        assembly.stream_id,
                        &assembly.buf,
                        index,
                    )
                    .map(Some)
                }
            }
            _ => Err(Error::malformed(index, "unknown sysex stream format")),
        }
    }
}

/// Builds the event for a completed SysEx body.
fn finish_sysex(
    group: U4,
    eight_bit: bool,
    stream_id: u8,
    body: &[u8],
    index: usize,
) -> Result<MidiEvent> {
    // Tolerate framing bytes embedded by MIDI 1.0-era senders.
    let mut body = body;
    if body.first() == Some(&0xF0) {
        body = &body[1..];
    }
    if body.last() == Some(&0xF7) {
        body = &body[..body.len() - 1];
    }

    match body.first() {
        None => Err(Error::malformed(index, "empty system exclusive stream")),
        Some(&prefix @ (0x7E | 0x7F)) => {
            if body.len() < 4 {
                return Err(Error::malformed(index, "truncated universal sysex header"));
            }
            let kind = if prefix == 0x7E {
                UniversalKind::NonRealtime
            } else {
                UniversalKind::Realtime
            };
            let (device_id, sub_id1, sub_id2) =
                (U7::new(body[1]), U7::new(body[2]), U7::new(body[3]));
            let data = body[4..].to_vec();
            Ok(MidiEvent::SysEx(if eight_bit {
                SysExMsg::UniversalSysEx8 {
                    group,
                    stream_id,
                    kind,
                    device_id,
                    sub_id1,
                    sub_id2,
                    data,
                }
            } else {
                SysExMsg::UniversalSysEx7 {
                    group,
                    kind,
                    device_id,
                    sub_id1,
                    sub_id2,
                    data,
                }
            }))
        }
        Some(_) => {
            let (manufacturer, consumed) = ManufacturerId::parse(body)
                .map_err(|_| Error::malformed(index, "invalid manufacturer id"))?;
            let data = body[consumed..].to_vec();
            Ok(MidiEvent::SysEx(if eight_bit {
                SysExMsg::SysEx8 {
                    group,
                    stream_id,
                    manufacturer,
                    data,
                }
            } else {
                SysExMsg::SysEx7 {
                    group,
                    manufacturer,
                    data,
                }
            }))
        }
    }
}

fn decode_utility(group: U4, w0: u32, _index: usize) -> Result<MidiEvent> {
    let status = ((w0 >> 20) & 0x0F) as u8;
    let time = U16::new((w0 & 0xFFFF) as u16);
    let msg = match status {
        0x0 => UtilityMsg::NoOp,
        0x1 => UtilityMsg::JrClock { time },
        0x2 => UtilityMsg::JrTimestamp { time },
        _ => {
            return Err(Error::Unsupported {
                what: "reserved utility status",
            })
        }
    };
    Ok(MidiEvent::Utility { group, msg })
}

fn decode_system(group: U4, w0: u32, index: usize) -> Result<MidiEvent> {
    let status = ((w0 >> 16) & 0xFF) as u8;
    let d1 = ((w0 >> 8) & 0xFF) as u8;
    let d2 = (w0 & 0xFF) as u8;
    if d1 > 0x7F || d2 > 0x7F {
        return Err(Error::malformed(index, "system data byte exceeds 7 bits"));
    }
    if let Some(msg) = SystemRealTimeMsg::from_status(status) {
        return Ok(MidiEvent::SystemRealTime { group, msg });
    }
    let msg = match status {
        0xF1 => SystemCommonMsg::TimecodeQuarterFrame { data: U7::new(d1) },
        0xF2 => SystemCommonMsg::SongPositionPointer {
            beat: U14::from_pair(U7::new(d2), U7::new(d1)),
        },
        0xF3 => SystemCommonMsg::SongSelect {
            number: U7::new(d1),
        },
        0xF6 => SystemCommonMsg::TuneRequest,
        _ => return Err(Error::malformed(index, "undefined system status byte")),
    };
    Ok(MidiEvent::SystemCommon { group, msg })
}

fn decode_midi1_voice(
    group: U4,
    w0: u32,
    index: usize,
    options: &UmpParseOptions,
) -> Result<MidiEvent> {
    let status = ((w0 >> 16) & 0xFF) as u8;
    if !(0x80..=0xEF).contains(&status) {
        return Err(Error::malformed(index, "invalid midi1 channel voice status"));
    }
    let d1 = ((w0 >> 8) & 0xFF) as u8;
    let d2 = (w0 & 0xFF) as u8;
    if d1 > 0x7F || d2 > 0x7F {
        return Err(Error::malformed(index, "data byte exceeds 7 bits"));
    }
    let event = crate::midi1::channel_voice_from_bytes(
        status,
        d1,
        d2,
        options.translate_zero_velocity_note_on,
    )?;
    Ok(event.with_group(group))
}

fn decode_midi2_voice(group: U4, packet: &[u32], index: usize) -> Result<MidiEvent> {
    let w0 = packet[0];
    let w1 = packet[1];
    let opcode = ((w0 >> 20) & 0x0F) as u8;
    let channel = U4::new(((w0 >> 16) & 0x0F) as u8);
    let b2 = ((w0 >> 8) & 0xFF) as u8;
    let b3 = (w0 & 0xFF) as u8;
    let note7 = || -> Result<U7> {
        U7::try_new(b2).ok_or(Error::malformed(index, "note number exceeds 7 bits"))
    };

    let msg = match opcode {
        0x0 | 0x1 => {
            let controller_index =
                U7::try_new(b3).ok_or(Error::malformed(index, "controller index exceeds 7 bits"))?;
            ChannelVoiceMsg::NoteCc {
                note: note7()?,
                controller: if opcode == 0x0 {
                    PerNoteController::Registered(controller_index)
                } else {
                    PerNoteController::Assignable(controller_index)
                },
                value: U32::new(w1),
            }
        }
        0x2 | 0x4 => ChannelVoiceMsg::Rpn {
            parameter: RegisteredParameter::from_number(U14::from_pair(
                U7::try_new(b2).ok_or(Error::malformed(index, "parameter msb exceeds 7 bits"))?,
                U7::try_new(b3).ok_or(Error::malformed(index, "parameter lsb exceeds 7 bits"))?,
            )),
            value: ParamValue::Midi2(U32::new(w1)),
            change: if opcode == 0x2 {
                ParamChange::Absolute
            } else {
                ParamChange::Relative
            },
        },
        0x3 | 0x5 => ChannelVoiceMsg::Nrpn {
            parameter: U14::from_pair(
                U7::try_new(b2).ok_or(Error::malformed(index, "parameter msb exceeds 7 bits"))?,
                U7::try_new(b3).ok_or(Error::malformed(index, "parameter lsb exceeds 7 bits"))?,
            ),
            value: ParamValue::Midi2(U32::new(w1)),
            change: if opcode == 0x3 {
                ParamChange::Absolute
            } else {
                ParamChange::Relative
            },
        },
        0x6 => ChannelVoiceMsg::NotePitchBend {
            note: note7()?,
            value: U32::new(w1),
        },
        0x8 | 0x9 => {
            let velocity = Velocity::Midi2(U16::new((w1 >> 16) as u16));
            let attribute = NoteAttribute::from_wire(b3, U16::new((w1 & 0xFFFF) as u16));
            if opcode == 0x9 {
                ChannelVoiceMsg::NoteOn {
                    note: note7()?,
                    velocity,
                    attribute,
                }
            } else {
                ChannelVoiceMsg::NoteOff {
                    note: note7()?,
                    velocity,
                    attribute,
                }
            }
        }
        0xA => ChannelVoiceMsg::NotePressure {
            note: note7()?,
            amount: ControlValue::Midi2(U32::new(w1)),
        },
        0xB => ChannelVoiceMsg::ControlChange {
            controller: crate::controller::Controller::from_number(
                U7::try_new(b2)
                    .ok_or(Error::malformed(index, "controller number exceeds 7 bits"))?,
            ),
            value: ControlValue::Midi2(U32::new(w1)),
        },
        0xC => {
            let bank = if w0 & 0x1 != 0 {
                Some(U14::from_pair(
                    U7::new(((w1 >> 8) & 0x7F) as u8),
                    U7::new((w1 & 0x7F) as u8),
                ))
            } else {
                None
            };
            ChannelVoiceMsg::ProgramChange {
                program: U7::new(((w1 >> 24) & 0x7F) as u8),
                bank,
            }
        }
        0xD => ChannelVoiceMsg::ChannelPressure {
            amount: ControlValue::Midi2(U32::new(w1)),
        },
        0xE => ChannelVoiceMsg::PitchBend {
            value: BendValue::Midi2(U32::new(w1)),
        },
        0xF => ChannelVoiceMsg::NoteManagement {
            note: note7()?,
            detach: b3 & 0x02 != 0,
            reset: b3 & 0x01 != 0,
        },
        _ => {
            return Err(Error::Unsupported {
                what: "reserved midi2 channel voice opcode",
            })
        }
    };
    Ok(MidiEvent::ChannelVoice {
        group,
        channel,
        msg,
    })
}

impl Iterator for UmpDecoder<'_> {
    type Item = Result<MidiEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.words.len() {
            let index = self.pos;
            match self.decode_packet(index) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        if !self.finished {
            self.finished = true;
            // An unterminated Start/Continue stream is an error once input
            // ends; the group state is cleared for reuse.
            for slot in &mut self.assembly {
                if slot.take().is_some() {
                    return Some(Err(Error::malformed(
                        self.words.len(),
                        "unterminated sysex stream",
                    )));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;

    fn decode_all(words: &[u32]) -> Vec<MidiEvent> {
        decode_ump(words).map(|r| r.unwrap()).collect()
    }

    fn roundtrip(event: &MidiEvent, protocol: Protocol) {
        let words = event.ump_words(protocol).unwrap();
        let decoded = decode_all(&words);
        assert_eq!(decoded.len(), 1, "words {words:08X?}");
        assert_eq!(&decoded[0], event, "words {words:08X?}");
    }

    #[test]
    fn test_word_count_table() {
        assert_eq!(word_count(0x0), 1);
        assert_eq!(word_count(0x1), 1);
        assert_eq!(word_count(0x2), 1);
        assert_eq!(word_count(0x3), 2);
        assert_eq!(word_count(0x4), 2);
        assert_eq!(word_count(0x5), 4);
        assert_eq!(word_count(0xD), 4);
        assert_eq!(word_count(0xF), 4);
    }

    #[test]
    fn test_midi2_note_on_known_words() {
        // Group 1, channel 1, note 60, velocity 0xC000.
        let event = MidiEvent::ChannelVoice {
            group: U4::new(1),
            channel: U4::new(1),
            msg: ChannelVoiceMsg::NoteOn {
                note: U7::new(60),
                velocity: Velocity::Midi2(U16::new(0xC000)),
                attribute: None,
            },
        };
        let words = event.ump_words(Protocol::Midi2).unwrap();
        assert_eq!(&words[..], &[0x4191_3C00, 0xC000_0000]);
        roundtrip(&event, Protocol::Midi2);
    }

    #[test]
    fn test_midi1_voice_roundtrip() {
        let events = [
            MidiEvent::note_on(U4::new(4), U7::new(72), Velocity::Midi1(U7::new(99))),
            MidiEvent::control_change(
                U4::new(0),
                Controller::Volume,
                ControlValue::Midi1(U7::new(100)),
            ),
            MidiEvent::pitch_bend(U4::new(2), BendValue::Midi1(U14::new(0x2000))),
            MidiEvent::program_change(U4::new(3), U7::new(12)),
        ];
        for event in events {
            roundtrip(&event.with_group(U4::new(2)), Protocol::Midi1);
        }
    }

    #[test]
    fn test_midi2_voice_roundtrip() {
        let group = U4::new(0);
        let channel = U4::new(7);
        let msgs = [
            ChannelVoiceMsg::NoteOff {
                note: U7::new(61),
                velocity: Velocity::Midi2(U16::new(0x1234)),
                attribute: Some(NoteAttribute::Pitch7_9 {
                    note: U7::new(61),
                    fraction: 300,
                }),
            },
            ChannelVoiceMsg::NoteCc {
                note: U7::new(10),
                controller: PerNoteController::Assignable(U7::new(33)),
                value: U32::new(0xDEAD_BEEF),
            },
            ChannelVoiceMsg::NotePitchBend {
                note: U7::new(64),
                value: U32::new(0x8000_0001),
            },
            ChannelVoiceMsg::NoteManagement {
                note: U7::new(64),
                detach: true,
                reset: false,
            },
            ChannelVoiceMsg::ControlChange {
                controller: Controller::Brightness,
                value: ControlValue::Midi2(U32::new(42)),
            },
            ChannelVoiceMsg::ProgramChange {
                program: U7::new(81),
                bank: Some(U14::new(0x0203)),
            },
            ChannelVoiceMsg::ChannelPressure {
                amount: ControlValue::Midi2(U32::new(7)),
            },
            ChannelVoiceMsg::PitchBend {
                value: BendValue::Midi2(U32::CENTER),
            },
            ChannelVoiceMsg::Rpn {
                parameter: RegisteredParameter::PitchBendSensitivity,
                value: ParamValue::Midi2(U32::new(0x0200_0000)),
                change: ParamChange::Absolute,
            },
            ChannelVoiceMsg::Rpn {
                parameter: RegisteredParameter::Raw(U14::new(0x0123)),
                value: ParamValue::Midi2(U32::new(5)),
                change: ParamChange::Relative,
            },
            ChannelVoiceMsg::Nrpn {
                parameter: U14::new(0x1234),
                value: ParamValue::Midi2(U32::new(0xFFFF_FFFF)),
                change: ParamChange::Absolute,
            },
        ];
        for msg in msgs {
            roundtrip(
                &MidiEvent::ChannelVoice {
                    group,
                    channel,
                    msg,
                },
                Protocol::Midi2,
            );
        }
    }

    #[test]
    fn test_rpn_relative_bit_preserved() {
        let event = MidiEvent::ChannelVoice {
            group: U4::MIN,
            channel: U4::MIN,
            msg: ChannelVoiceMsg::Rpn {
                parameter: RegisteredParameter::PitchBendSensitivity,
                value: ParamValue::Midi2(U32::new(1)),
                change: ParamChange::Relative,
            },
        };
        let words = event.ump_words(Protocol::Midi2).unwrap();
        assert_eq!((words[0] >> 20) & 0xF, 0x4, "relative rpn opcode");
        roundtrip(&event, Protocol::Midi2);
    }

    #[test]
    fn test_system_and_utility_roundtrip() {
        let events = [
            MidiEvent::SystemCommon {
                group: U4::new(3),
                msg: SystemCommonMsg::SongPositionPointer {
                    beat: U14::new(0x1FFF),
                },
            },
            MidiEvent::SystemRealTime {
                group: U4::new(0),
                msg: SystemRealTimeMsg::Stop,
            },
            MidiEvent::Utility {
                group: U4::new(1),
                msg: UtilityMsg::NoOp,
            },
            MidiEvent::Utility {
                group: U4::new(1),
                msg: UtilityMsg::JrClock {
                    time: U16::new(0xABCD),
                },
            },
            MidiEvent::Utility {
                group: U4::new(2),
                msg: UtilityMsg::JrTimestamp {
                    time: U16::new(1),
                },
            },
        ];
        for event in events {
            roundtrip(&event, Protocol::Midi2);
            roundtrip(&event, Protocol::Midi1);
        }
    }

    #[test]
    fn test_protocol_translation_midi1_to_midi2() {
        let event = MidiEvent::note_on(U4::new(0), U7::new(60), Velocity::Midi1(U7::new(64)));
        let words = event.ump_words(Protocol::Midi2).unwrap();
        let decoded = decode_all(&words);
        // Velocity 64 is the center and must upscale to the 16-bit center.
        assert!(matches!(
            decoded[0],
            MidiEvent::ChannelVoice {
                msg: ChannelVoiceMsg::NoteOn {
                    velocity: Velocity::Midi2(v),
                    ..
                },
                ..
            } if v == U16::CENTER
        ));
    }

    #[test]
    fn test_sysex7_multi_packet_reassembly() {
        // A 13-byte universal body splits into start + continue + end.
        let event = MidiEvent::SysEx(SysExMsg::UniversalSysEx7 {
            group: U4::new(0),
            kind: UniversalKind::NonRealtime,
            device_id: U7::new(0),
            sub_id1: U7::new(6),
            sub_id2: U7::new(1),
            data: vec![2, 3, 4, 5, 6, 7, 8, 9, 10],
        });
        let words = event.ump_words(Protocol::Midi2).unwrap();
        assert_eq!(words.len(), 6, "three two-word packets");
        assert_eq!((words[0] >> 20) & 0xF, 0x1, "start");
        assert_eq!((words[2] >> 20) & 0xF, 0x2, "continue");
        assert_eq!((words[4] >> 20) & 0xF, 0x3, "end");
        let decoded = decode_all(&words);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0], event);
    }

    #[test]
    fn test_sysex7_tolerates_embedded_framing() {
        // Start [F0 7E 00 06 01], continue [02 03 04 05 06], end [07 F7].
        let words = [
            0x3015_F07E, 0x0006_0100,
            0x3025_0203, 0x0405_0600,
            0x3032_07F7, 0x0000_0000,
        ];
        let decoded = decode_all(&words);
        assert_eq!(decoded.len(), 1);
        assert_eq!(
            decoded[0],
            MidiEvent::SysEx(SysExMsg::UniversalSysEx7 {
                group: U4::new(0),
                kind: UniversalKind::NonRealtime,
                device_id: U7::new(0),
                sub_id1: U7::new(6),
                sub_id2: U7::new(1),
                data: vec![2, 3, 4, 5, 6, 7],
            })
        );
    }

    #[test]
    fn test_sysex8_roundtrip() {
        let event = MidiEvent::SysEx(SysExMsg::SysEx8 {
            group: U4::new(5),
            stream_id: 0x2A,
            manufacturer: ManufacturerId::Extended(0x21, 0x09),
            data: (0u8..40).map(|b| b.wrapping_mul(7)).collect(),
        });
        let words = event.ump_words(Protocol::Midi2).unwrap();
        let decoded = decode_all(&words);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0], event);
    }

    #[test]
    fn test_continue_without_start_is_malformed() {
        let words = [0x3025_0203, 0x0405_0600];
        let results: Vec<_> = decode_ump(&words).collect();
        assert!(results[0].is_err());
    }

    #[test]
    fn test_unterminated_start_is_malformed() {
        let words = [0x3015_F07E, 0x0006_0100];
        let results: Vec<_> = decode_ump(&words).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_reassembly_recovers_after_error() {
        // Continue-without-start error, then a valid complete packet.
        let words = [
            0x3025_0203, 0x0405_0600,          // bad continue
            0x3003_410A, 0x0B00_0000,          // complete, Roland, 2 data bytes
        ];
        let results: Vec<_> = decode_ump(&words).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(
            *results[1].as_ref().unwrap(),
            MidiEvent::SysEx(SysExMsg::SysEx7 {
                group: U4::new(0),
                manufacturer: ManufacturerId::Standard(0x41),
                data: vec![0x0A, 0x0B],
            })
        );
    }

    #[test]
    fn test_sysex_cap_enforced() {
        let event = MidiEvent::SysEx(SysExMsg::SysEx7 {
            group: U4::new(0),
            manufacturer: ManufacturerId::Standard(0x41),
            data: vec![0x55; 100],
        });
        let words = event.ump_words(Protocol::Midi2).unwrap();
        let results: Vec<_> = decode_ump(&words)
            .with_options(UmpParseOptions {
                sysex_cap: 16,
                ..Default::default()
            })
            .collect();
        assert!(results.iter().any(|r| matches!(
            r,
            Err(Error::Malformed {
                reason: "sysex stream exceeds byte cap",
                ..
            })
        )));
    }

    #[test]
    fn test_flex_and_stream_pass_through() {
        let words = [0xD010_0000, 1, 2, 3, 0xF000_0005, 4, 5, 6];
        let decoded = decode_all(&words);
        assert_eq!(decoded.len(), 2);
        assert!(matches!(&decoded[0], MidiEvent::Unrecognized { words, .. } if words.len() == 4));
        // Pass-through re-encodes verbatim.
        assert_eq!(
            decoded[0].ump_words(Protocol::Midi2).unwrap().as_slice(),
            &words[..4]
        );
    }

    #[test]
    fn test_reserved_mt_unsupported() {
        let results: Vec<_> = decode_ump(&[0x6000_0000]).collect();
        assert!(matches!(results[0], Err(Error::Unsupported { .. })));
    }

    #[test]
    fn test_truncated_packet() {
        let results: Vec<_> = decode_ump(&[0x4090_3C00]).collect();
        assert!(matches!(results[0], Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_zero_velocity_translation_mt2_only() {
        // MT 0x2 note-on velocity 0 becomes note-off.
        let decoded = decode_all(&[0x2090_3C00]);
        assert!(decoded[0].is_note_off());
        // MT 0x4 note-on velocity 0 stays a note-on.
        let decoded = decode_all(&[0x4090_3C00, 0x0000_0000]);
        assert!(matches!(
            decoded[0],
            MidiEvent::ChannelVoice {
                msg: ChannelVoiceMsg::NoteOn { .. },
                ..
            }
        ));
    }
}
