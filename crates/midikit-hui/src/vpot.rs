//! V-Pot addressing and LED-ring display encoding.

use midikit_core::num::U4;

/// A rotary encoder address. Indices 0x0-0x7 are the channel-strip
/// V-Pots, 0x8-0xB the four parameter-edit pots, 0xC the input-only
/// scroll encoder (no LED ring).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VPot {
    /// Strip V-Pot, 0-7.
    Channel(U4),
    /// Parameter-edit pot, 1-4.
    Param(u8),
    /// The scroll wheel; rotation only.
    Scroll,
}

impl VPot {
    /// The wire index (0x0-0xC).
    pub const fn index(self) -> u8 {
        match self {
            Self::Channel(strip) => strip.get(),
            Self::Param(n) => 0x07 + n,
            Self::Scroll => 0x0C,
        }
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0x00..=0x07 => Some(Self::Channel(U4::new(index))),
            0x08..=0x0B => Some(Self::Param(index - 0x07)),
            0x0C => Some(Self::Scroll),
            _ => None,
        }
    }

    /// Whether this pot has an LED ring to display on.
    pub const fn has_leds(self) -> bool {
        !matches!(self, Self::Scroll)
    }
}

/// How the 11-LED ring renders a unit-interval value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VPotMode {
    /// All ring LEDs dark.
    AllOff,
    /// One LED at the value's position.
    Single(f64),
    /// LEDs fill from the left edge up to the value.
    LeftAnchor(f64),
    /// LEDs fill from the center towards the value (boost/cut).
    CenterAnchor(f64),
    /// LEDs spread symmetrically from the center (width).
    CenterRadius(f64),
}

/// A complete ring state: mode plus the separate lower LED.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VPotDisplay {
    pub mode: VPotMode,
    pub lower_led: bool,
}

impl Default for VPotDisplay {
    fn default() -> Self {
        Self {
            mode: VPotMode::AllOff,
            lower_led: false,
        }
    }
}

/// Monotone unit-interval to LED-position mapping (1-11).
fn unit_to_led(unit: f64) -> u8 {
    1 + (unit.clamp(0.0, 1.0) * 10.0).round() as u8
}

fn led_to_unit(led: u8) -> f64 {
    (led - 1) as f64 / 10.0
}

impl VPotDisplay {
    #[inline]
    pub const fn new(mode: VPotMode, lower_led: bool) -> Self {
        Self { mode, lower_led }
    }

    /// Encodes to the 7-bit display byte: bit 6 the lower LED, bits 4-5
    /// the mode, bits 0-3 the LED position (0 = all off).
    pub fn encode(&self) -> u8 {
        let (mode_bits, led) = match self.mode {
            VPotMode::AllOff => (0, 0),
            VPotMode::Single(unit) => (0, unit_to_led(unit)),
            VPotMode::CenterAnchor(unit) => (1, unit_to_led(unit)),
            VPotMode::LeftAnchor(unit) => (2, unit_to_led(unit)),
            VPotMode::CenterRadius(unit) => (3, unit_to_led(unit)),
        };
        ((self.lower_led as u8) << 6) | (mode_bits << 4) | led
    }

    /// Decodes a display byte. Positions beyond 11 clamp to the last LED.
    pub fn decode(byte: u8) -> Self {
        let lower_led = byte & 0x40 != 0;
        let led = (byte & 0x0F).min(11);
        let mode = if led == 0 {
            VPotMode::AllOff
        } else {
            let unit = led_to_unit(led);
            match (byte >> 4) & 0x03 {
                0 => VPotMode::Single(unit),
                1 => VPotMode::CenterAnchor(unit),
                2 => VPotMode::LeftAnchor(unit),
                _ => VPotMode::CenterRadius(unit),
            }
        };
        Self { mode, lower_led }
    }

    /// The lit state of the 11 ring LEDs, left to right.
    pub fn led_pattern(&self) -> [bool; 11] {
        let mut leds = [false; 11];
        match self.mode {
            VPotMode::AllOff => {}
            VPotMode::Single(unit) => leds[(unit_to_led(unit) - 1) as usize] = true,
            VPotMode::LeftAnchor(unit) => {
                for led in leds.iter_mut().take(unit_to_led(unit) as usize) {
                    *led = true;
                }
            }
            VPotMode::CenterAnchor(unit) => {
                let position = unit_to_led(unit) as usize;
                let (lo, hi) = if position <= 6 { (position, 6) } else { (6, position) };
                for led in leds.iter_mut().take(hi).skip(lo - 1) {
                    *led = true;
                }
            }
            VPotMode::CenterRadius(unit) => {
                // Value 6 is a lone center LED; each step lights one more
                // LED on each side.
                let radius = (unit_to_led(unit) as i32 - 6).unsigned_abs() as usize;
                for (i, led) in leds.iter_mut().enumerate() {
                    if i.abs_diff(5) <= radius {
                        *led = true;
                    }
                }
            }
        }
        leds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for index in 0x00..=0x0C {
            let pot = VPot::from_index(index).unwrap();
            assert_eq!(pot.index(), index);
        }
        assert_eq!(VPot::from_index(0x0D), None);
        assert!(!VPot::Scroll.has_leds());
        assert!(VPot::Channel(U4::new(3)).has_leds());
    }

    #[test]
    fn test_display_encode_decode() {
        let display = VPotDisplay::new(VPotMode::Single(0.5), false);
        let byte = display.encode();
        assert_eq!(byte, 0x06);
        assert_eq!(VPotDisplay::decode(byte), display);

        let display = VPotDisplay::new(VPotMode::CenterRadius(1.0), true);
        let byte = display.encode();
        assert_eq!(byte, 0x40 | 0x30 | 0x0B);
        assert_eq!(VPotDisplay::decode(byte), display);

        assert_eq!(
            VPotDisplay::decode(0x00),
            VPotDisplay::new(VPotMode::AllOff, false)
        );
    }

    #[test]
    fn test_unit_mapping_monotone() {
        let mut last = 0;
        for step in 0..=100 {
            let led = unit_to_led(step as f64 / 100.0);
            assert!(led >= last);
            assert!((1..=11).contains(&led));
            last = led;
        }
        assert_eq!(unit_to_led(0.0), 1);
        assert_eq!(unit_to_led(0.5), 6);
        assert_eq!(unit_to_led(1.0), 11);
    }

    #[test]
    fn test_single_pattern_center() {
        let pattern = VPotDisplay::new(VPotMode::Single(0.5), false).led_pattern();
        let lit: Vec<usize> = pattern
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
            .collect();
        assert_eq!(lit, vec![5]);
    }

    #[test]
    fn test_left_anchor_fills() {
        let pattern = VPotDisplay::new(VPotMode::LeftAnchor(1.0), false).led_pattern();
        assert!(pattern.iter().all(|&on| on));
        let pattern = VPotDisplay::new(VPotMode::LeftAnchor(0.0), false).led_pattern();
        assert_eq!(pattern.iter().filter(|&&on| on).count(), 1);
    }

    #[test]
    fn test_center_anchor_directions() {
        // Below center lights from the value up to the center.
        let low = VPotDisplay::new(VPotMode::CenterAnchor(0.0), false).led_pattern();
        assert!(low[0] && low[5] && !low[6]);
        // Above center lights from the center up to the value.
        let high = VPotDisplay::new(VPotMode::CenterAnchor(1.0), false).led_pattern();
        assert!(high[5] && high[10] && !high[4]);
    }
}
