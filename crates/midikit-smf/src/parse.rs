//! SMF parsing.

use crate::error::{Result, SmfError};
use crate::file::{Chunk, MidiFile, SmfEvent, SmfFormat, SmpteFps, TimeBase, TrackEvent};
use crate::meta::MetaEvent;
use crate::vlq::decode_vlq;
use midikit_core::midi1::{channel_voice_data_len, channel_voice_from_bytes};

/// Default cap on a declared chunk length.
pub const DEFAULT_CHUNK_CAP: usize = 65_536;

/// Options for [`parse_smf_with`].
#[derive(Debug, Clone, Copy)]
pub struct SmfParseOptions {
    /// Maximum accepted declared chunk length.
    pub max_chunk_len: usize,
    /// Translate note-on velocity 0 to note-off. Off by default so that
    /// `encode(parse(bytes))` reproduces third-party files byte-exactly.
    pub translate_zero_velocity_note_on: bool,
}

impl Default for SmfParseOptions {
    fn default() -> Self {
        Self {
            max_chunk_len: DEFAULT_CHUNK_CAP,
            translate_zero_velocity_note_on: false,
        }
    }
}

/// Parses a Standard MIDI File with default options.
pub fn parse_smf(bytes: &[u8]) -> Result<MidiFile> {
    parse_smf_with(bytes, SmfParseOptions::default())
}

/// Parses a Standard MIDI File.
pub fn parse_smf_with(bytes: &[u8], options: SmfParseOptions) -> Result<MidiFile> {
    let mut pos = 0;

    let magic = take(bytes, &mut pos, 4, "truncated header")?;
    if magic != b"MThd" {
        return Err(SmfError::malformed(0, "missing MThd magic"));
    }
    let header_len = read_u32(bytes, &mut pos, "truncated header")?;
    if header_len != 6 {
        return Err(SmfError::malformed(pos - 4, "header length must be 6"));
    }
    let format_raw = read_u16(bytes, &mut pos, "truncated header")?;
    let format = SmfFormat::from_u16(format_raw)
        .ok_or(SmfError::malformed(pos - 2, "unknown format"))?;
    let declared_tracks = read_u16(bytes, &mut pos, "truncated header")?;
    let division = read_u16(bytes, &mut pos, "truncated header")?;
    let time_base = if division & 0x8000 != 0 {
        let fps = SmpteFps::from_division_byte((division >> 8) as u8 as i8)
            .ok_or(SmfError::malformed(pos - 2, "invalid smpte division"))?;
        TimeBase::Timecode {
            fps,
            ticks_per_frame: (division & 0xFF) as u8,
        }
    } else {
        TimeBase::Musical {
            ticks_per_quarter: division,
        }
    };

    let mut chunks = Vec::new();
    while pos < bytes.len() {
        let id_offset = pos;
        let id_slice = take(bytes, &mut pos, 4, "truncated chunk header")?;
        let id = [id_slice[0], id_slice[1], id_slice[2], id_slice[3]];
        let len = read_u32(bytes, &mut pos, "truncated chunk header")? as usize;
        if len > options.max_chunk_len {
            return Err(SmfError::malformed(id_offset + 4, "chunk exceeds length cap"));
        }
        let payload_offset = pos;
        let payload = take(bytes, &mut pos, len, "truncated chunk")?;
        if &id == b"MTrk" {
            chunks.push(Chunk::Track(parse_track(
                bytes,
                payload_offset,
                payload_offset + len,
                options,
            )?));
        } else {
            chunks.push(Chunk::Unrecognized {
                id,
                data: payload.to_vec(),
            });
        }
    }

    let file = MidiFile {
        format,
        time_base,
        chunks,
    };
    if file.track_count() != declared_tracks as usize {
        return Err(SmfError::malformed(8, "track count does not match header"));
    }
    if format == SmfFormat::SingleTrack && file.track_count() != 1 {
        return Err(SmfError::malformed(8, "format 0 requires exactly one track"));
    }
    Ok(file)
}

/// Parses the events of one `MTrk` payload, `bytes[start..end]`.
fn parse_track(
    bytes: &[u8],
    start: usize,
    end: usize,
    options: SmfParseOptions,
) -> Result<Vec<TrackEvent>> {
    let mut pos = start;
    let mut events = Vec::new();
    let mut running_status: Option<u8> = None;
    let mut ended = false;

    while pos < end {
        if ended {
            return Err(SmfError::malformed(pos, "event after end of track"));
        }
        let delta = decode_vlq(&bytes[..end], &mut pos)?;
        if pos >= end {
            return Err(SmfError::malformed(pos, "truncated track event"));
        }
        let first = bytes[pos];

        let event = match first {
            0xFF => {
                pos += 1;
                let meta_type = read_u8(bytes, &mut pos, end)?;
                let len = decode_vlq(&bytes[..end], &mut pos)? as usize;
                let data_offset = pos;
                let data = take_track(bytes, &mut pos, end, len)?;
                running_status = None;
                let meta = MetaEvent::decode(meta_type, data, data_offset)?;
                if meta == MetaEvent::EndOfTrack {
                    ended = true;
                }
                SmfEvent::Meta(meta)
            }
            0xF0 => {
                pos += 1;
                let len = decode_vlq(&bytes[..end], &mut pos)? as usize;
                let data = take_track(bytes, &mut pos, end, len)?;
                running_status = None;
                SmfEvent::SysEx {
                    data: data.to_vec(),
                }
            }
            0xF7 => {
                pos += 1;
                let len = decode_vlq(&bytes[..end], &mut pos)? as usize;
                let data = take_track(bytes, &mut pos, end, len)?;
                running_status = None;
                SmfEvent::Escape {
                    data: data.to_vec(),
                }
            }
            0x80..=0xEF => {
                pos += 1;
                running_status = Some(first);
                SmfEvent::Channel(read_channel_event(bytes, &mut pos, end, first, options)?)
            }
            0x00..=0x7F => {
                let status = running_status
                    .ok_or(SmfError::malformed(pos, "data byte without running status"))?;
                SmfEvent::Channel(read_channel_event(bytes, &mut pos, end, status, options)?)
            }
            _ => return Err(SmfError::malformed(pos, "invalid status byte in track")),
        };
        events.push(TrackEvent::new(delta, event));
    }

    if !ended {
        return Err(SmfError::malformed(end, "missing end of track"));
    }
    Ok(events)
}

fn read_channel_event(
    bytes: &[u8],
    pos: &mut usize,
    end: usize,
    status: u8,
    options: SmfParseOptions,
) -> Result<midikit_core::MidiEvent> {
    let len = channel_voice_data_len(status);
    let data1 = read_u8(bytes, pos, end)?;
    let data2 = if len == 2 { read_u8(bytes, pos, end)? } else { 0 };
    if data1 > 0x7F || data2 > 0x7F {
        return Err(SmfError::malformed(*pos - 1, "data byte out of range"));
    }
    Ok(channel_voice_from_bytes(
        status,
        data1,
        data2,
        options.translate_zero_velocity_note_on,
    )?)
}

fn read_u8(bytes: &[u8], pos: &mut usize, end: usize) -> Result<u8> {
    if *pos >= end {
        return Err(SmfError::malformed(*pos, "truncated track event"));
    }
    let byte = bytes[*pos];
    *pos += 1;
    Ok(byte)
}

fn take_track<'a>(bytes: &'a [u8], pos: &mut usize, end: usize, len: usize) -> Result<&'a [u8]> {
    if end - *pos < len {
        return Err(SmfError::malformed(*pos, "event data exceeds chunk"));
    }
    let slice = &bytes[*pos..*pos + len];
    *pos += len;
    Ok(slice)
}

fn take<'a>(
    bytes: &'a [u8],
    pos: &mut usize,
    len: usize,
    reason: &'static str,
) -> Result<&'a [u8]> {
    if bytes.len() - *pos < len {
        return Err(SmfError::malformed(*pos, reason));
    }
    let slice = &bytes[*pos..*pos + len];
    *pos += len;
    Ok(slice)
}

fn read_u16(bytes: &[u8], pos: &mut usize, reason: &'static str) -> Result<u16> {
    let slice = take(bytes, pos, 2, reason)?;
    Ok(u16::from_be_bytes([slice[0], slice[1]]))
}

fn read_u32(bytes: &[u8], pos: &mut usize, reason: &'static str) -> Result<u32> {
    let slice = take(bytes, pos, 4, reason)?;
    Ok(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}
