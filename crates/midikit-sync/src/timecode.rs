//! SMPTE timecode values and frame rates.

use core::fmt;

/// The four frame rates MTC can carry, as its 2-bit rate code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MtcRate {
    Fps24,
    Fps25,
    /// 29.97 fps drop-frame.
    Fps2997Drop,
    #[default]
    Fps30,
}

impl MtcRate {
    /// Whole frames per second (29.97 drop counts 30 frame numbers).
    pub const fn nominal(self) -> u8 {
        match self {
            Self::Fps24 => 24,
            Self::Fps25 => 25,
            Self::Fps2997Drop | Self::Fps30 => 30,
        }
    }

    /// The 2-bit wire code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Fps24 => 0,
            Self::Fps25 => 1,
            Self::Fps2997Drop => 2,
            Self::Fps30 => 3,
        }
    }

    pub const fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => Self::Fps24,
            1 => Self::Fps25,
            2 => Self::Fps2997Drop,
            _ => Self::Fps30,
        }
    }
}

/// A frame rate the host may want timecode scaled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocalRate {
    Fps24,
    Fps25,
    Fps2997Drop,
    Fps30,
    Fps48,
    Fps50,
    Fps60,
}

impl LocalRate {
    /// Whole frames per second.
    pub const fn nominal(self) -> u8 {
        match self {
            Self::Fps24 => 24,
            Self::Fps25 => 25,
            Self::Fps2997Drop | Self::Fps30 => 30,
            Self::Fps48 => 48,
            Self::Fps50 => 50,
            Self::Fps60 => 60,
        }
    }

    /// The frame multiplier relative to an MTC rate, when this rate is an
    /// exact multiple of it (1x or 2x). `None` means incompatible.
    pub const fn multiplier_of(self, mtc: MtcRate) -> Option<u8> {
        let local = self.nominal();
        let base = mtc.nominal();
        if local == base {
            Some(1)
        } else if local == base * 2 {
            Some(2)
        } else {
            None
        }
    }
}

/// An SMPTE timecode with subframes on a 1/100-frame base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timecode {
    /// 0-23.
    pub hours: u8,
    /// 0-59.
    pub minutes: u8,
    /// 0-59.
    pub seconds: u8,
    pub frames: u8,
    /// 1/100ths of a frame, 0-99.
    pub subframes: u8,
}

impl Timecode {
    pub const ZERO: Self = Self {
        hours: 0,
        minutes: 0,
        seconds: 0,
        frames: 0,
        subframes: 0,
    };

    #[inline]
    pub const fn new(hours: u8, minutes: u8, seconds: u8, frames: u8) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            frames,
            subframes: 0,
        }
    }

    /// Total subframe units since 00:00:00:00.00 at the given whole-frame
    /// rate.
    pub const fn total_subframes(&self, fps: u8) -> u64 {
        let seconds =
            self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64;
        (seconds * fps as u64 + self.frames as u64) * 100 + self.subframes as u64
    }

    /// Rebuilds a timecode from subframe units, wrapping at 24 hours.
    pub const fn from_total_subframes(total: u64, fps: u8) -> Self {
        let day = 24 * 3600 * fps as u64 * 100;
        let total = total % day;
        let subframes = (total % 100) as u8;
        let frames_total = total / 100;
        let frames = (frames_total % fps as u64) as u8;
        let seconds_total = frames_total / fps as u64;
        Self {
            hours: (seconds_total / 3600) as u8,
            minutes: ((seconds_total / 60) % 60) as u8,
            seconds: (seconds_total % 60) as u8,
            frames,
            subframes,
        }
    }

    /// Offsets by a signed number of whole frames, wrapping modulo 24
    /// hours.
    #[must_use]
    pub const fn offset_frames(&self, delta: i64, fps: u8) -> Self {
        let day = (24 * 3600 * fps as u64 * 100) as i64;
        let mut total = self.total_subframes(fps) as i64 + delta * 100;
        total = total.rem_euclid(day);
        Self::from_total_subframes(total as u64, fps)
    }

    /// The same moment expressed with frames and subframes multiplied by
    /// `k` (for scaling MTC rates to 2x local rates).
    #[must_use]
    pub const fn scale_frames(&self, k: u8) -> Self {
        let scaled = (self.frames as u16 * 100 + self.subframes as u16) * k as u16;
        Self {
            frames: (scaled / 100) as u8,
            subframes: (scaled % 100) as u8,
            ..*self
        }
    }

    /// Whether all fields are in range for the rate.
    pub const fn is_valid(&self, fps: u8) -> bool {
        self.hours < 24
            && self.minutes < 60
            && self.seconds < 60
            && self.frames < fps
            && self.subframes < 100
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}.{:02}",
            self.hours, self.minutes, self.seconds, self.frames, self.subframes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_codes() {
        for rate in [
            MtcRate::Fps24,
            MtcRate::Fps25,
            MtcRate::Fps2997Drop,
            MtcRate::Fps30,
        ] {
            assert_eq!(MtcRate::from_code(rate.code()), rate);
        }
    }

    #[test]
    fn test_multipliers() {
        assert_eq!(LocalRate::Fps30.multiplier_of(MtcRate::Fps30), Some(1));
        assert_eq!(LocalRate::Fps60.multiplier_of(MtcRate::Fps30), Some(2));
        assert_eq!(LocalRate::Fps48.multiplier_of(MtcRate::Fps24), Some(2));
        assert_eq!(LocalRate::Fps50.multiplier_of(MtcRate::Fps25), Some(2));
        assert_eq!(LocalRate::Fps25.multiplier_of(MtcRate::Fps24), None);
        assert_eq!(LocalRate::Fps60.multiplier_of(MtcRate::Fps25), None);
    }

    #[test]
    fn test_offset_frames() {
        let tc = Timecode::new(2, 22, 34, 1);
        assert_eq!(tc.offset_frames(2, 30), Timecode::new(2, 22, 34, 3));
        assert_eq!(tc.offset_frames(-2, 30), Timecode::new(2, 22, 33, 29));
        assert_eq!(
            Timecode::new(0, 0, 0, 0).offset_frames(-1, 25),
            Timecode::new(23, 59, 59, 24)
        );
        assert_eq!(
            Timecode::new(23, 59, 59, 29).offset_frames(1, 30),
            Timecode::ZERO
        );
    }

    #[test]
    fn test_total_subframes_roundtrip() {
        for tc in [
            Timecode::ZERO,
            Timecode::new(1, 2, 3, 4),
            Timecode {
                subframes: 75,
                ..Timecode::new(23, 59, 59, 29)
            },
        ] {
            assert_eq!(
                Timecode::from_total_subframes(tc.total_subframes(30), 30),
                tc
            );
        }
    }

    #[test]
    fn test_scale_frames() {
        let tc = Timecode {
            subframes: 50,
            ..Timecode::new(0, 0, 1, 10)
        };
        let scaled = tc.scale_frames(2);
        assert_eq!(scaled.frames, 21);
        assert_eq!(scaled.subframes, 0);
        assert_eq!(scaled.seconds, 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Timecode::new(2, 22, 34, 3).to_string(), "02:22:34:03.00");
    }
}
