//! The meta-event catalogue (`FF type length data`).

use crate::error::{Result, SmfError};
use crate::file::SmpteFps;
use crate::vlq;

/// Text-bearing meta-event types (`FF 01` through `FF 09`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextKind {
    Text,
    Copyright,
    TrackName,
    InstrumentName,
    Lyric,
    Marker,
    CuePoint,
    ProgramName,
    DeviceName,
}

impl TextKind {
    pub const fn meta_type(self) -> u8 {
        match self {
            Self::Text => 0x01,
            Self::Copyright => 0x02,
            Self::TrackName => 0x03,
            Self::InstrumentName => 0x04,
            Self::Lyric => 0x05,
            Self::Marker => 0x06,
            Self::CuePoint => 0x07,
            Self::ProgramName => 0x08,
            Self::DeviceName => 0x09,
        }
    }

    pub const fn from_meta_type(meta_type: u8) -> Option<Self> {
        match meta_type {
            0x01 => Some(Self::Text),
            0x02 => Some(Self::Copyright),
            0x03 => Some(Self::TrackName),
            0x04 => Some(Self::InstrumentName),
            0x05 => Some(Self::Lyric),
            0x06 => Some(Self::Marker),
            0x07 => Some(Self::CuePoint),
            0x08 => Some(Self::ProgramName),
            0x09 => Some(Self::DeviceName),
            _ => None,
        }
    }
}

/// SMPTE offset meta event (`FF 54`).
///
/// Decoded verbatim: files in the wild carry frame counts beyond the
/// carried rate's range, so validity is a query
/// ([`SmpteOffset::is_frames_in_range`]), not a parse failure, and the
/// encoder never repairs the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmpteOffset {
    pub fps: SmpteFps,
    /// 0-23.
    pub hours: u8,
    /// 0-59.
    pub minutes: u8,
    /// 0-59.
    pub seconds: u8,
    pub frames: u8,
    /// Fractional frames in 1/100ths.
    pub subframes: u8,
}

impl SmpteOffset {
    /// Whether `frames` is valid for the carried rate.
    pub const fn is_frames_in_range(&self) -> bool {
        self.frames < self.fps.nominal()
    }
}

/// A decoded meta event. Unknown types round-trip verbatim through
/// [`MetaEvent::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaEvent {
    /// `FF 00 02`.
    SequenceNumber(u16),
    /// `FF 01`..`FF 09`. Text is raw bytes; SMF predates a mandated
    /// encoding.
    Text { kind: TextKind, text: Vec<u8> },
    /// `FF 20 01`.
    ChannelPrefix(u8),
    /// `FF 21 01`.
    PortPrefix(u8),
    /// `FF 2F 00`. Must terminate every track.
    EndOfTrack,
    /// `FF 51 03`, microseconds per quarter note (24-bit).
    Tempo { micros_per_quarter: u32 },
    /// `FF 54 05`.
    SmpteOffset(SmpteOffset),
    /// `FF 58 04`.
    TimeSignature {
        numerator: u8,
        /// Denominator as a power of two (2 = quarter notes).
        denominator_pow2: u8,
        /// MIDI clocks per metronome click.
        clocks_per_click: u8,
        /// Notated 32nd notes per MIDI quarter note.
        thirty_seconds_per_quarter: u8,
    },
    /// `FF 59 02`.
    KeySignature {
        /// Sharps (positive) or flats (negative), -7..=7.
        sharps_flats: i8,
        minor: bool,
    },
    /// `FF 60 01` (XMF patch type prefix).
    XmfPatchTypePrefix(u8),
    /// `FF 7F`.
    SequencerSpecific { data: Vec<u8> },
    /// Any other type, preserved byte-for-byte.
    Unrecognized { meta_type: u8, data: Vec<u8> },
}

impl MetaEvent {
    /// The wire type byte.
    pub fn meta_type(&self) -> u8 {
        match self {
            Self::SequenceNumber(_) => 0x00,
            Self::Text { kind, .. } => kind.meta_type(),
            Self::ChannelPrefix(_) => 0x20,
            Self::PortPrefix(_) => 0x21,
            Self::EndOfTrack => 0x2F,
            Self::Tempo { .. } => 0x51,
            Self::SmpteOffset(_) => 0x54,
            Self::TimeSignature { .. } => 0x58,
            Self::KeySignature { .. } => 0x59,
            Self::XmfPatchTypePrefix(_) => 0x60,
            Self::SequencerSpecific { .. } => 0x7F,
            Self::Unrecognized { meta_type, .. } => *meta_type,
        }
    }

    /// Decodes the payload of a meta event. `offset` locates the payload
    /// in the input for diagnostics.
    pub fn decode(meta_type: u8, data: &[u8], offset: usize) -> Result<Self> {
        let expect_len = |len: usize| -> Result<()> {
            if data.len() == len {
                Ok(())
            } else {
                Err(SmfError::malformed(offset, "meta event length mismatch"))
            }
        };

        if let Some(kind) = TextKind::from_meta_type(meta_type) {
            return Ok(Self::Text {
                kind,
                text: data.to_vec(),
            });
        }
        match meta_type {
            0x00 => {
                expect_len(2)?;
                Ok(Self::SequenceNumber(u16::from_be_bytes([data[0], data[1]])))
            }
            0x20 => {
                expect_len(1)?;
                Ok(Self::ChannelPrefix(data[0]))
            }
            0x21 => {
                expect_len(1)?;
                Ok(Self::PortPrefix(data[0]))
            }
            0x2F => {
                expect_len(0)?;
                Ok(Self::EndOfTrack)
            }
            0x51 => {
                expect_len(3)?;
                Ok(Self::Tempo {
                    micros_per_quarter: u32::from_be_bytes([0, data[0], data[1], data[2]]),
                })
            }
            0x54 => {
                expect_len(5)?;
                let fps = SmpteFps::from_code((data[0] >> 5) & 0x03)
                    .ok_or(SmfError::malformed(offset, "invalid smpte rate code"))?;
                Ok(Self::SmpteOffset(SmpteOffset {
                    fps,
                    hours: data[0] & 0x1F,
                    minutes: data[1],
                    seconds: data[2],
                    frames: data[3],
                    subframes: data[4],
                }))
            }
            0x58 => {
                expect_len(4)?;
                Ok(Self::TimeSignature {
                    numerator: data[0],
                    denominator_pow2: data[1],
                    clocks_per_click: data[2],
                    thirty_seconds_per_quarter: data[3],
                })
            }
            0x59 => {
                expect_len(2)?;
                Ok(Self::KeySignature {
                    sharps_flats: data[0] as i8,
                    minor: data[1] != 0,
                })
            }
            0x60 => {
                expect_len(1)?;
                Ok(Self::XmfPatchTypePrefix(data[0]))
            }
            0x7F => Ok(Self::SequencerSpecific {
                data: data.to_vec(),
            }),
            _ => Ok(Self::Unrecognized {
                meta_type,
                data: data.to_vec(),
            }),
        }
    }

    /// Appends the full wire form (`FF type len data`) to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(0xFF);
        out.push(self.meta_type());
        match self {
            Self::SequenceNumber(n) => {
                vlq::encode_vlq(2, out);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Self::Text { text, .. } => {
                vlq::encode_vlq(text.len() as u32, out);
                out.extend_from_slice(text);
            }
            Self::ChannelPrefix(v) | Self::PortPrefix(v) | Self::XmfPatchTypePrefix(v) => {
                vlq::encode_vlq(1, out);
                out.push(*v);
            }
            Self::EndOfTrack => vlq::encode_vlq(0, out),
            Self::Tempo { micros_per_quarter } => {
                vlq::encode_vlq(3, out);
                out.extend_from_slice(&micros_per_quarter.to_be_bytes()[1..]);
            }
            Self::SmpteOffset(smpte) => {
                vlq::encode_vlq(5, out);
                out.push((smpte.fps.code() << 5) | (smpte.hours & 0x1F));
                out.extend_from_slice(&[
                    smpte.minutes,
                    smpte.seconds,
                    smpte.frames,
                    smpte.subframes,
                ]);
            }
            Self::TimeSignature {
                numerator,
                denominator_pow2,
                clocks_per_click,
                thirty_seconds_per_quarter,
            } => {
                vlq::encode_vlq(4, out);
                out.extend_from_slice(&[
                    *numerator,
                    *denominator_pow2,
                    *clocks_per_click,
                    *thirty_seconds_per_quarter,
                ]);
            }
            Self::KeySignature {
                sharps_flats,
                minor,
            } => {
                vlq::encode_vlq(2, out);
                out.extend_from_slice(&[*sharps_flats as u8, *minor as u8]);
            }
            Self::SequencerSpecific { data } | Self::Unrecognized { data, .. } => {
                vlq::encode_vlq(data.len() as u32, out);
                out.extend_from_slice(data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(meta: MetaEvent) {
        let mut bytes = Vec::new();
        meta.encode(&mut bytes);
        assert_eq!(bytes[0], 0xFF);
        let meta_type = bytes[1];
        let mut pos = 2;
        let len = vlq::decode_vlq(&bytes, &mut pos).unwrap() as usize;
        assert_eq!(bytes.len(), pos + len);
        let decoded = MetaEvent::decode(meta_type, &bytes[pos..], 0).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_catalogue_roundtrip() {
        roundtrip(MetaEvent::SequenceNumber(0x0102));
        roundtrip(MetaEvent::Text {
            kind: TextKind::TrackName,
            text: b"Lead".to_vec(),
        });
        roundtrip(MetaEvent::ChannelPrefix(9));
        roundtrip(MetaEvent::PortPrefix(1));
        roundtrip(MetaEvent::EndOfTrack);
        roundtrip(MetaEvent::Tempo {
            micros_per_quarter: 500_000,
        });
        roundtrip(MetaEvent::SmpteOffset(SmpteOffset {
            fps: SmpteFps::Fps25,
            hours: 1,
            minutes: 2,
            seconds: 3,
            frames: 4,
            subframes: 50,
        }));
        roundtrip(MetaEvent::TimeSignature {
            numerator: 6,
            denominator_pow2: 3,
            clocks_per_click: 24,
            thirty_seconds_per_quarter: 8,
        });
        roundtrip(MetaEvent::KeySignature {
            sharps_flats: -3,
            minor: true,
        });
        roundtrip(MetaEvent::XmfPatchTypePrefix(2));
        roundtrip(MetaEvent::SequencerSpecific {
            data: vec![0x41, 0x01, 0x02],
        });
        roundtrip(MetaEvent::Unrecognized {
            meta_type: 0x4B,
            data: vec![9, 9, 9],
        });
    }

    #[test]
    fn test_tempo_wire_bytes() {
        let mut bytes = Vec::new();
        MetaEvent::Tempo {
            micros_per_quarter: 500_000,
        }
        .encode(&mut bytes);
        assert_eq!(bytes, vec![0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(MetaEvent::decode(0x51, &[0x07, 0xA1], 0).is_err());
        assert!(MetaEvent::decode(0x2F, &[0x00], 0).is_err());
    }

    #[test]
    fn test_smpte_offset_out_of_range_flagged_not_repaired() {
        // 28 frames at 25 fps: decodes fine, flagged invalid, re-encodes
        // verbatim.
        let data = [(1 << 5) | 2, 0, 0, 28, 0];
        let meta = MetaEvent::decode(0x54, &data, 0).unwrap();
        let MetaEvent::SmpteOffset(offset) = meta else {
            panic!("expected smpte offset");
        };
        assert!(!offset.is_frames_in_range());
        let mut bytes = Vec::new();
        MetaEvent::SmpteOffset(offset).encode(&mut bytes);
        assert_eq!(&bytes[3..], &data);
    }

    #[test]
    fn test_key_signature_negative_sharps() {
        let meta = MetaEvent::decode(0x59, &[0xFD, 0x01], 0).unwrap();
        assert_eq!(
            meta,
            MetaEvent::KeySignature {
                sharps_flats: -3,
                minor: true
            }
        );
    }
}
