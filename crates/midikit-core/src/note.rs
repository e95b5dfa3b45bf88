//! MIDI note numbers and names.
//!
//! Notes use scientific pitch notation: letter, `s` for sharp, octave
//! (`m1` spells octave -1). Middle C (MIDI 60) is `C4`; concert A
//! (440 Hz, MIDI 69) is `A4`.

use crate::num::U7;

/// One of the 128 MIDI note numbers, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Note {
    // Octave -1 (MIDI 0-11)
    Cm1 = 0,
    Csm1 = 1,
    Dm1 = 2,
    Dsm1 = 3,
    Em1 = 4,
    Fm1 = 5,
    Fsm1 = 6,
    Gm1 = 7,
    Gsm1 = 8,
    Am1 = 9,
    Asm1 = 10,
    Bm1 = 11,

    // Octave 0 (MIDI 12-23)
    C0 = 12,
    Cs0 = 13,
    D0 = 14,
    Ds0 = 15,
    E0 = 16,
    F0 = 17,
    Fs0 = 18,
    G0 = 19,
    Gs0 = 20,
    A0 = 21,
    As0 = 22,
    B0 = 23,

    // Octave 1 (MIDI 24-35)
    C1 = 24,
    Cs1 = 25,
    D1 = 26,
    Ds1 = 27,
    E1 = 28,
    F1 = 29,
    Fs1 = 30,
    G1 = 31,
    Gs1 = 32,
    A1 = 33,
    As1 = 34,
    B1 = 35,

    // Octave 2 (MIDI 36-47)
    C2 = 36,
    Cs2 = 37,
    D2 = 38,
    Ds2 = 39,
    E2 = 40,
    F2 = 41,
    Fs2 = 42,
    G2 = 43,
    Gs2 = 44,
    A2 = 45,
    As2 = 46,
    B2 = 47,

    // Octave 3 (MIDI 48-59)
    C3 = 48,
    Cs3 = 49,
    D3 = 50,
    Ds3 = 51,
    E3 = 52,
    F3 = 53,
    Fs3 = 54,
    G3 = 55,
    Gs3 = 56,
    A3 = 57,
    As3 = 58,
    B3 = 59,

    // Octave 4 (MIDI 60-71) - Middle C octave
    C4 = 60,
    Cs4 = 61,
    D4 = 62,
    Ds4 = 63,
    E4 = 64,
    F4 = 65,
    Fs4 = 66,
    G4 = 67,
    Gs4 = 68,
    A4 = 69,
    As4 = 70,
    B4 = 71,

    // Octave 5 (MIDI 72-83)
    C5 = 72,
    Cs5 = 73,
    D5 = 74,
    Ds5 = 75,
    E5 = 76,
    F5 = 77,
    Fs5 = 78,
    G5 = 79,
    Gs5 = 80,
    A5 = 81,
    As5 = 82,
    B5 = 83,

    // Octave 6 (MIDI 84-95)
    C6 = 84,
    Cs6 = 85,
    D6 = 86,
    Ds6 = 87,
    E6 = 88,
    F6 = 89,
    Fs6 = 90,
    G6 = 91,
    Gs6 = 92,
    A6 = 93,
    As6 = 94,
    B6 = 95,

    // Octave 7 (MIDI 96-107)
    C7 = 96,
    Cs7 = 97,
    D7 = 98,
    Ds7 = 99,
    E7 = 100,
    F7 = 101,
    Fs7 = 102,
    G7 = 103,
    Gs7 = 104,
    A7 = 105,
    As7 = 106,
    B7 = 107,

    // Octave 8 (MIDI 108-119)
    C8 = 108,
    Cs8 = 109,
    D8 = 110,
    Ds8 = 111,
    E8 = 112,
    F8 = 113,
    Fs8 = 114,
    G8 = 115,
    Gs8 = 116,
    A8 = 117,
    As8 = 118,
    B8 = 119,

    // Octave 9 (MIDI 120-127, ends at G9)
    C9 = 120,
    Cs9 = 121,
    D9 = 122,
    Ds9 = 123,
    E9 = 124,
    F9 = 125,
    Fs9 = 126,
    G9 = 127,
}

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Note {
    /// The note for a MIDI note number.
    #[inline]
    pub const fn from_number(number: U7) -> Self {
        // Every 0..=127 value is a valid discriminant.
        unsafe { core::mem::transmute::<u8, Note>(number.get()) }
    }

    /// The MIDI note number.
    #[inline]
    pub const fn number(self) -> U7 {
        U7::new(self as u8)
    }

    /// Chromatic pitch class, `0` (C) through `11` (B).
    #[inline]
    pub const fn pitch_class(self) -> u8 {
        self as u8 % 12
    }

    /// Octave in scientific pitch notation, `-1..=9`.
    #[inline]
    pub const fn octave(self) -> i8 {
        (self as u8 / 12) as i8 - 1
    }

    /// Equal-tempered frequency in Hz, A4 = 440 Hz.
    #[inline]
    pub fn frequency(self) -> f64 {
        440.0 * 2f64.powf((self as u8 as f64 - 69.0) / 12.0)
    }

    /// The nearest note for a frequency in Hz, clamped to the MIDI range.
    pub fn from_frequency(hz: f64) -> Self {
        let number = 69.0 + 12.0 * (hz / 440.0).log2();
        Self::from_number(U7::new_clamping(number.round().clamp(0.0, 127.0) as u8))
    }
}

impl From<Note> for U7 {
    #[inline]
    fn from(note: Note) -> U7 {
        note.number()
    }
}

impl From<U7> for Note {
    #[inline]
    fn from(number: U7) -> Note {
        Note::from_number(number)
    }
}

impl core::fmt::Display for Note {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", NAMES[self.pitch_class() as usize], self.octave())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_notes() {
        assert_eq!(Note::C4.number().get(), 60);
        assert_eq!(Note::A4.number().get(), 69);
        assert_eq!(Note::Cm1.number().get(), 0);
        assert_eq!(Note::G9.number().get(), 127);
    }

    #[test]
    fn test_number_roundtrip() {
        for n in 0..=127u8 {
            let note = Note::from_number(U7::new(n));
            assert_eq!(note.number().get(), n);
        }
    }

    #[test]
    fn test_pitch_class_and_octave() {
        assert_eq!(Note::C4.pitch_class(), 0);
        assert_eq!(Note::C4.octave(), 4);
        assert_eq!(Note::Bm1.octave(), -1);
        assert_eq!(Note::As2.pitch_class(), 10);
    }

    #[test]
    fn test_display() {
        assert_eq!(Note::C4.to_string(), "C4");
        assert_eq!(Note::Cs4.to_string(), "C#4");
        assert_eq!(Note::Am1.to_string(), "A-1");
    }

    #[test]
    fn test_frequency() {
        assert!((Note::A4.frequency() - 440.0).abs() < 1e-9);
        assert!((Note::A5.frequency() - 880.0).abs() < 1e-9);
        assert_eq!(Note::from_frequency(440.0), Note::A4);
        assert_eq!(Note::from_frequency(261.63), Note::C4);
        assert_eq!(Note::from_frequency(20_000.0), Note::G9);
    }
}
