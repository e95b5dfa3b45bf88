//! HUI message encoding and decoding over MIDI 1.0 events.
//!
//! The protocol is bidirectional and asymmetric: the two sides use
//! different CC numbers for switch traffic, and the meaning of the shared
//! V-Pot CCs (0x10-0x1C) depends on who is speaking (the surface sends
//! rotation deltas, the host sends LED-ring states).

use crate::error::{HuiError, Result};
use crate::switch::HuiSwitch;
use crate::vpot::{VPot, VPotDisplay};
use midikit_core::controller::Controller;
use midikit_core::event::{BendValue, ChannelVoiceMsg, ControlValue, MidiEvent, SysExMsg, Velocity};
use midikit_core::manufacturer::ManufacturerId;
use midikit_core::num::{U14, U4, U7};

/// Which side of the link is speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HuiRole {
    Host,
    Surface,
}

impl HuiRole {
    /// CC number carrying zone selection for this speaker.
    const fn zone_select_cc(self) -> u8 {
        match self {
            Self::Host => 0x0C,
            Self::Surface => 0x0F,
        }
    }

    /// CC number carrying port + state for this speaker.
    const fn port_cc(self) -> u8 {
        match self {
            Self::Host => 0x2C,
            Self::Surface => 0x2F,
        }
    }
}

/// The Mackie manufacturer prefix and HUI device header carried by every
/// HUI SysEx (`F0 00 00 66 05 00 … F7`).
const MACKIE: ManufacturerId = ManufacturerId::Extended(0x00, 0x66);
const HUI_DEVICE_HEADER: [u8; 2] = [0x05, 0x00];

/// SysEx sub-ids for the displays.
mod sub_id {
    pub const SMALL_DISPLAY: u8 = 0x10;
    pub const TIME_DISPLAY: u8 = 0x11;
    pub const LARGE_DISPLAY: u8 = 0x12;
}

/// Target of a 4-character display write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmallDisplayTarget {
    /// Per-strip scribble display, 0-7.
    Strip(U4),
    /// The select-assign readout.
    SelectAssign,
}

impl SmallDisplayTarget {
    const fn wire(self) -> u8 {
        match self {
            Self::Strip(strip) => strip.get(),
            Self::SelectAssign => 8,
        }
    }

    const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0..=7 => Some(Self::Strip(U4::new(byte))),
            8 => Some(Self::SelectAssign),
            _ => None,
        }
    }
}

/// One digit of the time display: a 4-bit value plus decimal point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeDigit {
    /// 0-15; 0-9 are digits, the rest blank/legend glyphs.
    pub value: u8,
    pub dot: bool,
}

impl TimeDigit {
    const fn wire(self) -> u8 {
        (self.value & 0x0F) | ((self.dot as u8) << 4)
    }

    const fn from_wire(byte: u8) -> Self {
        Self {
            value: byte & 0x0F,
            dot: byte & 0x10 != 0,
        }
    }
}

/// A decoded HUI protocol message.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HuiMessage {
    /// Host keep-alive, sent once a second.
    Ping,
    /// Surface response to a ping (also sent once on connect).
    PingReply,
    /// A switch changed state.
    Switch { switch: HuiSwitch, state: bool },
    /// A fader moved; 14-bit level on the strip's pitch-bend channel.
    Fader { channel: U4, level: U14 },
    /// Surface-side encoder rotation, signed detent count.
    VPotRotation { vpot: VPot, delta: i8 },
    /// Host-side LED ring update.
    VPotDisplay { vpot: VPot, display: VPotDisplay },
    /// 4-character display write.
    SmallDisplay {
        target: SmallDisplayTarget,
        text: [u8; 4],
    },
    /// The 8-digit time display, rightmost digit first.
    TimeDisplay { digits: [TimeDigit; 8] },
    /// One 10-character cell of the large 2x40 display, 0-3 top row,
    /// 4-7 bottom row.
    LargeDisplay { zone: u8, text: [u8; 10] },
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes a HUI message as spoken by `role` into MIDI events.
pub fn encode(message: &HuiMessage, role: HuiRole) -> Result<Vec<MidiEvent>> {
    let events = match message {
        HuiMessage::Ping => vec![ping_event(false)],
        HuiMessage::PingReply => vec![ping_event(true)],
        HuiMessage::Switch { switch, state } => {
            let (zone, port) = switch.zone_port();
            vec![
                cc_event(role.zone_select_cc(), zone.get()),
                cc_event(role.port_cc(), port.get() | ((*state as u8) << 6)),
            ]
        }
        HuiMessage::Fader { channel, level } => {
            vec![MidiEvent::pitch_bend(*channel, BendValue::Midi1(*level))]
        }
        HuiMessage::VPotRotation { vpot, delta } => {
            if *delta == 0 || delta.unsigned_abs() > 0x3F {
                return Err(HuiError::Unsupported {
                    what: "rotation delta out of sign/magnitude range",
                });
            }
            let value = if *delta < 0 {
                0x40 | delta.unsigned_abs()
            } else {
                *delta as u8
            };
            vec![cc_event(0x10 + vpot.index(), value)]
        }
        HuiMessage::VPotDisplay { vpot, display } => {
            if !vpot.has_leds() {
                return Err(HuiError::Unsupported {
                    what: "scroll encoder has no led ring",
                });
            }
            vec![cc_event(0x10 + vpot.index(), display.encode())]
        }
        HuiMessage::SmallDisplay { target, text } => {
            let mut data = vec![sub_id::SMALL_DISPLAY, target.wire()];
            data.extend_from_slice(text);
            vec![hui_sysex(data)?]
        }
        HuiMessage::TimeDisplay { digits } => {
            let mut data = vec![sub_id::TIME_DISPLAY];
            data.extend(digits.iter().map(|digit| digit.wire()));
            vec![hui_sysex(data)?]
        }
        HuiMessage::LargeDisplay { zone, text } => {
            if *zone > 7 {
                return Err(HuiError::Unsupported {
                    what: "large display zone out of range",
                });
            }
            let mut data = vec![sub_id::LARGE_DISPLAY, *zone];
            data.extend_from_slice(text);
            vec![hui_sysex(data)?]
        }
    };
    Ok(events)
}

fn ping_event(reply: bool) -> MidiEvent {
    // On the wire this is note-on 0 with velocity 0 (ping) or 0x7F
    // (reply).
    MidiEvent::ChannelVoice {
        group: U4::MIN,
        channel: U4::MIN,
        msg: ChannelVoiceMsg::NoteOn {
            note: U7::MIN,
            velocity: Velocity::Midi1(if reply { U7::MAX } else { U7::MIN }),
            attribute: None,
        },
    }
}

fn cc_event(cc: u8, value: u8) -> MidiEvent {
    MidiEvent::control_change(
        U4::MIN,
        Controller::from_number(U7::new(cc)),
        ControlValue::Midi1(U7::new(value)),
    )
}

fn hui_sysex(data: Vec<u8>) -> Result<MidiEvent> {
    let mut body = HUI_DEVICE_HEADER.to_vec();
    body.extend_from_slice(&data);
    if body.iter().any(|&byte| byte > 0x7F) {
        return Err(HuiError::Unsupported {
            what: "display byte exceeds 7 bits",
        });
    }
    Ok(MidiEvent::SysEx(SysExMsg::SysEx7 {
        group: U4::MIN,
        manufacturer: MACKIE,
        data: body,
    }))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Streaming HUI decoder for one direction of the link.
///
/// Switch traffic is stateful on the wire (zone select followed by a
/// port/state byte), so the decoder holds the selected zone between
/// events.
#[derive(Debug)]
pub struct HuiDecoder {
    /// The role of the *sender* whose stream this decoder reads.
    sender: HuiRole,
    selected_zone: Option<u8>,
}

impl HuiDecoder {
    pub fn new(sender: HuiRole) -> Self {
        Self {
            sender,
            selected_zone: None,
        }
    }

    /// Consumes one MIDI event. `Ok(None)` means the event either only
    /// advanced internal state (zone select) or is not HUI traffic.
    pub fn decode(&mut self, event: &MidiEvent) -> Result<Option<HuiMessage>> {
        match event {
            MidiEvent::ChannelVoice { channel, msg, .. } => {
                self.decode_channel_voice(*channel, msg)
            }
            MidiEvent::SysEx(SysExMsg::SysEx7 {
                manufacturer, data, ..
            }) if *manufacturer == MACKIE => decode_sysex(data).map(Some),
            _ => Ok(None),
        }
    }

    fn decode_channel_voice(
        &mut self,
        channel: U4,
        msg: &ChannelVoiceMsg,
    ) -> Result<Option<HuiMessage>> {
        match msg {
            // Ping arrives as note-on 0 (or note-off after zero-velocity
            // translation).
            ChannelVoiceMsg::NoteOn { note, velocity, .. }
            | ChannelVoiceMsg::NoteOff { note, velocity, .. }
                if note.get() == 0 && channel.get() == 0 =>
            {
                Ok(Some(if velocity.is_zero() {
                    HuiMessage::Ping
                } else {
                    HuiMessage::PingReply
                }))
            }
            ChannelVoiceMsg::ControlChange { controller, value } => {
                self.decode_cc(controller.number().get(), value.midi1().get())
            }
            // Faders live on the first eight channels; bends elsewhere are
            // not HUI traffic.
            ChannelVoiceMsg::PitchBend { value } if channel.get() < 8 => {
                Ok(Some(HuiMessage::Fader {
                    channel,
                    level: value.midi1(),
                }))
            }
            _ => Ok(None),
        }
    }

    fn decode_cc(&mut self, cc: u8, value: u8) -> Result<Option<HuiMessage>> {
        if cc == self.sender.zone_select_cc() {
            self.selected_zone = Some(value);
            return Ok(None);
        }
        if cc == self.sender.port_cc() {
            // Tolerate a port byte with no preceding zone select; it maps
            // to an undefined coordinate rather than failing.
            let zone = match self.selected_zone {
                Some(zone) => U7::new(zone),
                None => {
                    tracing::debug!(value, "port/state byte without zone select");
                    U7::MAX
                }
            };
            let port = U4::new(value & 0x0F);
            let state = value & 0x40 != 0;
            return Ok(Some(HuiMessage::Switch {
                switch: HuiSwitch::from_zone_port(zone, port),
                state,
            }));
        }
        if (0x10..=0x1C).contains(&cc) {
            let Some(vpot) = VPot::from_index(cc - 0x10) else {
                return Ok(None);
            };
            return match self.sender {
                HuiRole::Surface => {
                    let magnitude = (value & 0x3F) as i8;
                    let delta = if value & 0x40 != 0 { -magnitude } else { magnitude };
                    Ok(Some(HuiMessage::VPotRotation { vpot, delta }))
                }
                HuiRole::Host => {
                    if !vpot.has_leds() {
                        return Err(HuiError::malformed(
                            "led ring update addressed to the scroll encoder",
                        ));
                    }
                    Ok(Some(HuiMessage::VPotDisplay {
                        vpot,
                        display: VPotDisplay::decode(value),
                    }))
                }
            };
        }
        Ok(None)
    }
}

fn decode_sysex(body: &[u8]) -> Result<HuiMessage> {
    let Some(payload) = body.strip_prefix(&HUI_DEVICE_HEADER) else {
        return Err(HuiError::malformed("missing hui device header"));
    };
    let Some((&sub, rest)) = payload.split_first() else {
        return Err(HuiError::malformed("empty hui sysex payload"));
    };
    match sub {
        sub_id::SMALL_DISPLAY => {
            let [target, text @ ..] = rest else {
                return Err(HuiError::malformed("truncated small display payload"));
            };
            let target = SmallDisplayTarget::from_wire(*target)
                .ok_or(HuiError::malformed("small display target out of range"))?;
            let text: [u8; 4] = text
                .try_into()
                .map_err(|_| HuiError::malformed("small display text must be 4 bytes"))?;
            Ok(HuiMessage::SmallDisplay { target, text })
        }
        sub_id::TIME_DISPLAY => {
            let bytes: [u8; 8] = rest
                .try_into()
                .map_err(|_| HuiError::malformed("time display needs 8 digit bytes"))?;
            let mut digits = [TimeDigit::default(); 8];
            for (digit, byte) in digits.iter_mut().zip(bytes) {
                *digit = TimeDigit::from_wire(byte);
            }
            Ok(HuiMessage::TimeDisplay { digits })
        }
        sub_id::LARGE_DISPLAY => {
            let [zone, text @ ..] = rest else {
                return Err(HuiError::malformed("truncated large display payload"));
            };
            if *zone > 7 {
                return Err(HuiError::malformed("large display zone out of range"));
            }
            let text: [u8; 10] = text
                .try_into()
                .map_err(|_| HuiError::malformed("large display text must be 10 bytes"))?;
            Ok(HuiMessage::LargeDisplay { zone: *zone, text })
        }
        _ => Err(HuiError::malformed("unknown hui sysex sub-id")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch::{StripSwitch, TransportSwitch};
    use crate::vpot::VPotMode;

    fn roundtrip(message: HuiMessage, role: HuiRole) {
        let events = encode(&message, role).unwrap();
        let mut decoder = HuiDecoder::new(role);
        let mut decoded = Vec::new();
        for event in &events {
            if let Some(msg) = decoder.decode(event).unwrap() {
                decoded.push(msg);
            }
        }
        assert_eq!(decoded, vec![message]);
    }

    #[test]
    fn test_ping_roundtrip() {
        roundtrip(HuiMessage::Ping, HuiRole::Host);
        roundtrip(HuiMessage::PingReply, HuiRole::Surface);
    }

    #[test]
    fn test_ping_survives_zero_velocity_translation() {
        // A ping decoded through the MIDI 1.0 layer arrives as note-off.
        let bytes = encode(&HuiMessage::Ping, HuiRole::Host).unwrap()[0]
            .to_midi1_bytes()
            .unwrap();
        assert_eq!(bytes, vec![0x90, 0x00, 0x00]);
        let event = midikit_core::midi1::decode_midi1(&bytes)
            .next()
            .unwrap()
            .unwrap();
        assert!(event.is_note_off());
        let mut decoder = HuiDecoder::new(HuiRole::Host);
        assert_eq!(decoder.decode(&event).unwrap(), Some(HuiMessage::Ping));
    }

    #[test]
    fn test_switch_roundtrip_both_roles() {
        let message = HuiMessage::Switch {
            switch: HuiSwitch::Transport(TransportSwitch::Play),
            state: true,
        };
        roundtrip(message, HuiRole::Host);
        roundtrip(message, HuiRole::Surface);

        roundtrip(
            HuiMessage::Switch {
                switch: HuiSwitch::ChannelStrip(U4::new(5), StripSwitch::Solo),
                state: false,
            },
            HuiRole::Surface,
        );
    }

    #[test]
    fn test_switch_wire_bytes() {
        let events = encode(
            &HuiMessage::Switch {
                switch: HuiSwitch::Transport(TransportSwitch::Play),
                state: true,
            },
            HuiRole::Surface,
        )
        .unwrap();
        let bytes: Vec<u8> = events
            .iter()
            .flat_map(|e| e.to_midi1_bytes().unwrap())
            .collect();
        assert_eq!(bytes, vec![0xB0, 0x0F, 0x0E, 0xB0, 0x2F, 0x44]);
    }

    #[test]
    fn test_zone_select_persists_across_ports() {
        // One zone select, two port messages in the same zone.
        let mut decoder = HuiDecoder::new(HuiRole::Surface);
        let zone = cc_event(0x0F, 0x00);
        let press = cc_event(0x2F, 0x42);
        let release = cc_event(0x2F, 0x02);
        assert_eq!(decoder.decode(&zone).unwrap(), None);
        assert_eq!(
            decoder.decode(&press).unwrap(),
            Some(HuiMessage::Switch {
                switch: HuiSwitch::ChannelStrip(U4::MIN, StripSwitch::Mute),
                state: true,
            })
        );
        assert_eq!(
            decoder.decode(&release).unwrap(),
            Some(HuiMessage::Switch {
                switch: HuiSwitch::ChannelStrip(U4::MIN, StripSwitch::Mute),
                state: false,
            })
        );
    }

    #[test]
    fn test_port_without_zone_is_tolerated() {
        let mut decoder = HuiDecoder::new(HuiRole::Surface);
        let message = decoder.decode(&cc_event(0x2F, 0x41)).unwrap();
        assert!(matches!(
            message,
            Some(HuiMessage::Switch {
                switch: HuiSwitch::Undefined { .. },
                state: true,
            })
        ));
    }

    #[test]
    fn test_fader_roundtrip() {
        roundtrip(
            HuiMessage::Fader {
                channel: U4::new(3),
                level: U14::new(0x1FFF),
            },
            HuiRole::Surface,
        );
    }

    #[test]
    fn test_vpot_rotation_roundtrip() {
        roundtrip(
            HuiMessage::VPotRotation {
                vpot: VPot::Channel(U4::new(2)),
                delta: 5,
            },
            HuiRole::Surface,
        );
        roundtrip(
            HuiMessage::VPotRotation {
                vpot: VPot::Scroll,
                delta: -3,
            },
            HuiRole::Surface,
        );
    }

    #[test]
    fn test_vpot_display_roundtrip() {
        roundtrip(
            HuiMessage::VPotDisplay {
                vpot: VPot::Channel(U4::new(3)),
                display: VPotDisplay::new(VPotMode::Single(0.5), false),
            },
            HuiRole::Host,
        );
    }

    #[test]
    fn test_scroll_display_rejected() {
        let result = encode(
            &HuiMessage::VPotDisplay {
                vpot: VPot::Scroll,
                display: VPotDisplay::default(),
            },
            HuiRole::Host,
        );
        assert!(matches!(result, Err(HuiError::Unsupported { .. })));
    }

    #[test]
    fn test_display_roundtrips() {
        roundtrip(
            HuiMessage::SmallDisplay {
                target: SmallDisplayTarget::Strip(U4::new(2)),
                text: *b"Kick",
            },
            HuiRole::Host,
        );
        roundtrip(
            HuiMessage::SmallDisplay {
                target: SmallDisplayTarget::SelectAssign,
                text: *b"PAN ",
            },
            HuiRole::Host,
        );
        let mut digits = [TimeDigit::default(); 8];
        digits[0] = TimeDigit {
            value: 3,
            dot: true,
        };
        roundtrip(HuiMessage::TimeDisplay { digits }, HuiRole::Host);
        roundtrip(
            HuiMessage::LargeDisplay {
                zone: 4,
                text: *b"MIX WINDOW",
            },
            HuiRole::Host,
        );
    }

    #[test]
    fn test_bad_sysex_sub_id_rejected() {
        let event = hui_sysex(vec![0x5A, 0x00]).unwrap();
        let mut decoder = HuiDecoder::new(HuiRole::Host);
        assert!(matches!(
            decoder.decode(&event),
            Err(HuiError::Malformed { .. })
        ));
    }

    #[test]
    fn test_non_hui_traffic_passes() {
        let mut decoder = HuiDecoder::new(HuiRole::Surface);
        let note = MidiEvent::note_on(U4::new(1), U7::new(60), Velocity::Midi1(U7::new(10)));
        assert_eq!(decoder.decode(&note).unwrap(), None);
    }
}
