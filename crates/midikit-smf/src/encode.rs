//! SMF encoding.

use crate::error::{Result, SmfError};
use crate::file::{Chunk, MidiFile, SmfEvent, TrackEvent};
use crate::meta::MetaEvent;
use crate::vlq::encode_vlq;

/// Options for [`encode_smf_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SmfEncodeOptions {
    /// Omit repeated channel status bytes. Off by default; when on, the
    /// output is still deterministic.
    pub running_status: bool,
}

/// Encodes a file with default options (no running status).
pub fn encode_smf(file: &MidiFile) -> Result<Vec<u8>> {
    encode_smf_with(file, SmfEncodeOptions::default())
}

/// Encodes a file.
///
/// Every track is terminated: if a track's last event is not
/// [`MetaEvent::EndOfTrack`], one is appended at delta 0.
pub fn encode_smf_with(file: &MidiFile, options: SmfEncodeOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&file.format.as_u16().to_be_bytes());
    out.extend_from_slice(&(file.track_count() as u16).to_be_bytes());
    out.extend_from_slice(&file.time_base.as_u16().to_be_bytes());

    for chunk in &file.chunks {
        match chunk {
            Chunk::Track(events) => {
                let payload = encode_track(events, options)?;
                out.extend_from_slice(b"MTrk");
                out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
                out.extend_from_slice(&payload);
            }
            Chunk::Unrecognized { id, data } => {
                out.extend_from_slice(id);
                out.extend_from_slice(&(data.len() as u32).to_be_bytes());
                out.extend_from_slice(data);
            }
        }
    }
    Ok(out)
}

fn encode_track(events: &[TrackEvent], options: SmfEncodeOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut running_status: Option<u8> = None;

    for (index, track_event) in events.iter().enumerate() {
        let is_last = index == events.len() - 1;
        if track_event.event == SmfEvent::Meta(MetaEvent::EndOfTrack) && !is_last {
            return Err(SmfError::Unsupported {
                what: "end-of-track before the final event",
            });
        }
        encode_vlq(track_event.delta, &mut out);
        match &track_event.event {
            SmfEvent::Channel(event) => {
                let (Some(status), Some(data)) =
                    (event.raw_status_byte(), event.raw_data_bytes())
                else {
                    return Err(SmfError::Unsupported {
                        what: "channel event with no single-message MIDI 1.0 form",
                    });
                };
                if !(options.running_status && running_status == Some(status)) {
                    out.push(status);
                }
                running_status = Some(status);
                out.extend_from_slice(&data);
            }
            SmfEvent::Meta(meta) => {
                running_status = None;
                meta.encode(&mut out);
            }
            SmfEvent::SysEx { data } => {
                running_status = None;
                out.push(0xF0);
                encode_vlq(data.len() as u32, &mut out);
                out.extend_from_slice(data);
            }
            SmfEvent::Escape { data } => {
                running_status = None;
                out.push(0xF7);
                encode_vlq(data.len() as u32, &mut out);
                out.extend_from_slice(data);
            }
        }
    }

    if events.last().map(|e| &e.event) != Some(&SmfEvent::Meta(MetaEvent::EndOfTrack)) {
        encode_vlq(0, &mut out);
        MetaEvent::EndOfTrack.encode(&mut out);
    }
    Ok(out)
}
