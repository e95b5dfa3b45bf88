//! System-exclusive manufacturer IDs.

use crate::error::{Error, Result};
use smallvec::SmallVec;

/// A MIDI Manufacturers Association system-exclusive ID.
///
/// Either a single byte in `0x01..=0x7D` or a three-byte extended ID
/// (`0x00 msb lsb`). `0x7E`/`0x7F` are the universal SysEx prefixes and are
/// not manufacturer IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ManufacturerId {
    /// One-byte ID, `0x01..=0x7D`.
    Standard(u8),
    /// Three-byte ID: `0x00` followed by these two bytes.
    Extended(u8, u8),
}

/// `(id, name)` pairs for IDs this library knows by name. Immutable static
/// data; completeness is not a goal.
static NAMES: &[(ManufacturerId, &str)] = &[
    (ManufacturerId::Standard(0x01), "Sequential Circuits"),
    (ManufacturerId::Standard(0x04), "Moog"),
    (ManufacturerId::Standard(0x06), "Lexicon"),
    (ManufacturerId::Standard(0x07), "Kurzweil"),
    (ManufacturerId::Standard(0x0F), "Ensoniq"),
    (ManufacturerId::Standard(0x10), "Oberheim"),
    (ManufacturerId::Standard(0x18), "E-mu"),
    (ManufacturerId::Standard(0x40), "Kawai"),
    (ManufacturerId::Standard(0x41), "Roland"),
    (ManufacturerId::Standard(0x42), "Korg"),
    (ManufacturerId::Standard(0x43), "Yamaha"),
    (ManufacturerId::Standard(0x44), "Casio"),
    (ManufacturerId::Standard(0x47), "Akai"),
    (ManufacturerId::Extended(0x00, 0x0E), "Alesis"),
    (ManufacturerId::Extended(0x00, 0x66), "Mackie"),
    (ManufacturerId::Extended(0x01, 0x05), "M-Audio"),
    (ManufacturerId::Extended(0x20, 0x32), "Behringer"),
    (ManufacturerId::Extended(0x21, 0x09), "Native Instruments"),
];

impl ManufacturerId {
    /// Validates a one-byte ID.
    pub const fn standard(byte: u8) -> Result<Self> {
        match byte {
            0x01..=0x7D => Ok(Self::Standard(byte)),
            _ => Err(Error::OutOfRange {
                field: "manufacturer id",
                value: byte as u32,
                bound: 0x7D,
            }),
        }
    }

    /// Validates a three-byte ID from its two payload bytes.
    pub const fn extended(msb: u8, lsb: u8) -> Result<Self> {
        if msb > 0x7F || lsb > 0x7F {
            return Err(Error::OutOfRange {
                field: "manufacturer id",
                value: ((msb as u32) << 8) | lsb as u32,
                bound: 0x7F7F,
            });
        }
        Ok(Self::Extended(msb, lsb))
    }

    /// Parses the ID at the start of a SysEx body, returning the ID and the
    /// number of bytes consumed (1 or 3).
    pub fn parse(body: &[u8]) -> Result<(Self, usize)> {
        match body {
            [] => Err(Error::malformed(0, "empty system exclusive body")),
            [0x00, msb, lsb, ..] => Ok((Self::extended(*msb, *lsb)?, 3)),
            [0x00, ..] => Err(Error::malformed(0, "truncated extended manufacturer id")),
            [byte, ..] => Ok((Self::standard(*byte)?, 1)),
        }
    }

    /// The wire bytes (1 or 3).
    pub fn to_bytes(self) -> SmallVec<[u8; 3]> {
        match self {
            Self::Standard(byte) => SmallVec::from_slice(&[byte]),
            Self::Extended(msb, lsb) => SmallVec::from_slice(&[0x00, msb, lsb]),
        }
    }

    /// The registered company name, if this library knows it.
    pub fn name(self) -> Option<&'static str> {
        NAMES
            .iter()
            .find(|(id, _)| *id == self)
            .map(|(_, name)| *name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_validation() {
        assert!(ManufacturerId::standard(0x41).is_ok());
        assert!(ManufacturerId::standard(0x00).is_err());
        assert!(ManufacturerId::standard(0x7E).is_err());
        assert!(ManufacturerId::standard(0x7F).is_err());
    }

    #[test]
    fn test_extended_validation() {
        assert!(ManufacturerId::extended(0x00, 0x66).is_ok());
        assert!(ManufacturerId::extended(0x80, 0x00).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            ManufacturerId::parse(&[0x41, 0x10]).unwrap(),
            (ManufacturerId::Standard(0x41), 1)
        );
        assert_eq!(
            ManufacturerId::parse(&[0x00, 0x00, 0x66, 0x05]).unwrap(),
            (ManufacturerId::Extended(0x00, 0x66), 3)
        );
        assert!(ManufacturerId::parse(&[]).is_err());
        assert!(ManufacturerId::parse(&[0x00, 0x12]).is_err());
    }

    #[test]
    fn test_bytes_roundtrip() {
        for id in [
            ManufacturerId::Standard(0x43),
            ManufacturerId::Extended(0x21, 0x09),
        ] {
            let bytes = id.to_bytes();
            let (parsed, len) = ManufacturerId::parse(&bytes).unwrap();
            assert_eq!(parsed, id);
            assert_eq!(len, bytes.len());
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(ManufacturerId::Standard(0x41).name(), Some("Roland"));
        assert_eq!(
            ManufacturerId::Extended(0x00, 0x66).name(),
            Some("Mackie")
        );
        assert_eq!(ManufacturerId::Standard(0x55).name(), None);
    }
}
