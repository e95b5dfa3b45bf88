//! Stateful combiners for MIDI 1.0 multi-message idioms.
//!
//! Both combiners are opt-in stream processors layered over the byte
//! decoder: [`Cc14Combiner`] pairs CC 0-31 MSBs with their CC 32-63 LSBs,
//! and [`RpnCombiner`] folds a registered/non-registered parameter CC
//! transaction into a single [`ChannelVoiceMsg::Rpn`]/
//! [`ChannelVoiceMsg::Nrpn`] event.
//!
//! System real-time and common events, and channel voice events on other
//! channels, pass through without disturbing an open transaction.

use crate::controller::{Controller, ParamChange, RegisteredParameter};
use crate::event::{ChannelVoiceMsg, ControlValue, MidiEvent, ParamValue};
use crate::num::{U14, U32, U4, U7};

/// A logical 14-bit control change assembled from an MSB/LSB CC pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cc14Event {
    pub group: U4,
    pub channel: U4,
    /// The MSB controller number (0-31).
    pub controller: U7,
    pub value: U14,
}

/// Output of [`Cc14Combiner`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombinedEvent {
    /// Passed through unchanged.
    Event(MidiEvent),
    /// An MSB/LSB pair coalesced into one 14-bit value.
    Cc14(Cc14Event),
}

struct PendingMsb {
    group: U4,
    channel: U4,
    /// MSB controller number, 0-31.
    controller: U7,
    value: U7,
    /// Qualifying events seen since the MSB arrived.
    age: usize,
}

/// Coalesces CC 0-31 / CC 32-63 MSB+LSB pairs on the same channel into
/// [`Cc14Event`]s when the LSB arrives within the configured window of
/// intervening channel events.
pub struct Cc14Combiner {
    window: usize,
    pending: Option<PendingMsb>,
}

impl Default for Cc14Combiner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cc14Combiner {
    /// Window of 1: the LSB must be the next channel event.
    pub fn new() -> Self {
        Self::with_window(1)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Feeds one event; completed output is appended to `out`.
    pub fn process(&mut self, event: MidiEvent, out: &mut Vec<CombinedEvent>) {
        // Transparent to non-channel traffic.
        if event.channel().is_none() {
            out.push(CombinedEvent::Event(event));
            return;
        }

        if let MidiEvent::ChannelVoice {
            group,
            channel,
            msg:
                ChannelVoiceMsg::ControlChange {
                    controller,
                    value: ControlValue::Midi1(value),
                },
        } = &event
        {
            let number = controller.number().get();
            if number < 32 {
                self.flush_pending(out);
                self.pending = Some(PendingMsb {
                    group: *group,
                    channel: *channel,
                    controller: U7::new(number),
                    value: *value,
                    age: 0,
                });
                return;
            }
            if number < 64 {
                if let Some(pending) = self.pending.take() {
                    if pending.channel == *channel
                        && pending.group == *group
                        && pending.controller.get() + 32 == number
                        && pending.age < self.window
                    {
                        out.push(CombinedEvent::Cc14(Cc14Event {
                            group: *group,
                            channel: *channel,
                            controller: pending.controller,
                            value: U14::from_pair(pending.value, *value),
                        }));
                        return;
                    }
                    self.pending = Some(pending);
                }
            }
        }

        self.bump_age(out);
        out.push(CombinedEvent::Event(event));
    }

    /// Emits any held MSB as a plain event.
    pub fn flush(&mut self, out: &mut Vec<CombinedEvent>) {
        self.flush_pending(out);
    }

    fn bump_age(&mut self, out: &mut Vec<CombinedEvent>) {
        if let Some(pending) = self.pending.as_mut() {
            pending.age += 1;
            if pending.age >= self.window {
                self.flush_pending(out);
            }
        }
    }

    fn flush_pending(&mut self, out: &mut Vec<CombinedEvent>) {
        if let Some(pending) = self.pending.take() {
            out.push(CombinedEvent::Event(MidiEvent::control_change(
                pending.channel,
                Controller::from_number(pending.controller),
                ControlValue::Midi1(pending.value),
            ).with_group(pending.group)));
        }
    }
}

/// Which parameter family a transaction addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    Rpn,
    Nrpn,
}

#[derive(Default)]
struct RpnChannelState {
    kind: Option<ParamKind>,
    param_msb: Option<U7>,
    param_lsb: Option<U7>,
    /// Selection / data-entry CCs held while the transaction may complete.
    held: Vec<MidiEvent>,
    /// Data-entry MSB awaiting an optional LSB.
    data_msb: Option<U7>,
    /// MSB of the last emitted absolute value, for bare LSB updates.
    last_data_msb: Option<U7>,
}

impl RpnChannelState {
    fn selected(&self) -> Option<(ParamKind, U14)> {
        match (self.kind, self.param_msb, self.param_lsb) {
            (Some(kind), Some(msb), Some(lsb)) => Some((kind, U14::from_pair(msb, lsb))),
            _ => None,
        }
    }
}

/// Folds MIDI 1.0 RPN/NRPN CC transactions (CC 101/100 or 99/98 parameter
/// selection followed by CC 6/38 data entry or CC 96/97 increment) into
/// single parameter events. One transaction maps to exactly one event.
#[derive(Default)]
pub struct RpnCombiner {
    channels: [RpnChannelState; 16],
}

impl RpnCombiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one event; output is appended to `out`.
    pub fn process(&mut self, event: MidiEvent, out: &mut Vec<MidiEvent>) {
        let Some(channel) = event.channel() else {
            // System traffic interleaves freely.
            out.push(event);
            return;
        };
        let MidiEvent::ChannelVoice {
            group,
            msg:
                ChannelVoiceMsg::ControlChange {
                    controller,
                    value: ControlValue::Midi1(value),
                },
            ..
        } = &event
        else {
            // Other voice messages on this channel end an open transaction.
            self.finish_channel(channel, out);
            out.push(event);
            return;
        };
        let group = *group;
        let value = *value;

        let state = &mut self.channels[channel.get() as usize];
        match controller.number().get() {
            101 | 100 | 99 | 98 => {
                let (kind, is_msb) = match controller.number().get() {
                    101 => (ParamKind::Rpn, true),
                    100 => (ParamKind::Rpn, false),
                    99 => (ParamKind::Nrpn, true),
                    _ => (ParamKind::Nrpn, false),
                };
                if state.kind.is_some() && state.kind != Some(kind) {
                    // Switching families mid-selection abandons the old one.
                    Self::abort_channel(state, out);
                }
                if state.data_msb.is_some() {
                    Self::emit_pending_data(state, group, channel, out);
                }
                state.kind = Some(kind);
                if is_msb {
                    state.param_msb = Some(value);
                } else {
                    state.param_lsb = Some(value);
                }
                state.held.push(event.clone());
            }
            6 => match state.selected() {
                Some((_, param)) if !Self::is_null(param) => {
                    if state.data_msb.is_some() {
                        Self::emit_pending_data(state, group, channel, out);
                    }
                    state.data_msb = Some(value);
                    state.held.push(event.clone());
                }
                _ => {
                    Self::abort_channel(state, out);
                    out.push(event);
                }
            },
            38 => {
                if let Some(msb) = state.data_msb.take() {
                    // Completes the held data-entry pair.
                    Self::emit(state, group, channel, ParamValue::Midi1(U14::from_pair(msb, value)), ParamChange::Absolute, out);
                    state.last_data_msb = Some(msb);
                } else if let (Some((_, param)), Some(msb)) = (state.selected(), state.last_data_msb)
                {
                    if Self::is_null(param) {
                        out.push(event);
                        return;
                    }
                    // Bare LSB refines the previous absolute value.
                    Self::emit(state, group, channel, ParamValue::Midi1(U14::from_pair(msb, value)), ParamChange::Absolute, out);
                } else {
                    Self::abort_channel(state, out);
                    out.push(event);
                }
            }
            96 | 97 => match state.selected() {
                Some((_, param)) if !Self::is_null(param) => {
                    if state.data_msb.is_some() {
                        Self::emit_pending_data(state, group, channel, out);
                    }
                    let magnitude = value.as_u32() as i32;
                    let delta = if controller.number().get() == 96 {
                        magnitude
                    } else {
                        -magnitude
                    };
                    Self::emit(state, group, channel, ParamValue::Midi2(U32::new(delta as u32)), ParamChange::Relative, out);
                }
                _ => {
                    Self::abort_channel(state, out);
                    out.push(event);
                }
            },
            _ => {
                self.finish_channel(channel, out);
                out.push(event);
            }
        }
    }

    /// Flushes every open transaction.
    pub fn flush(&mut self, out: &mut Vec<MidiEvent>) {
        for channel in 0..16 {
            self.finish_channel(U4::new(channel), out);
        }
    }

    fn is_null(param: U14) -> bool {
        param == U14::new(0x3FFF)
    }

    /// Ends whatever is open on a channel: pending data emits, an unused
    /// selection replays raw.
    fn finish_channel(&mut self, channel: U4, out: &mut Vec<MidiEvent>) {
        let state = &mut self.channels[channel.get() as usize];
        if state.data_msb.is_some() {
            // Group of the held CCs; they all share one.
            let group = state
                .held
                .first()
                .map(MidiEvent::group)
                .unwrap_or(U4::MIN);
            Self::emit_pending_data(state, group, channel, out);
        } else {
            Self::abort_channel(state, out);
        }
    }

    /// Emits the held data-entry MSB as an absolute event with LSB zero.
    fn emit_pending_data(state: &mut RpnChannelState, group: U4, channel: U4, out: &mut Vec<MidiEvent>) {
        if let Some(msb) = state.data_msb.take() {
            Self::emit(
                state,
                group,
                channel,
                ParamValue::Midi1(U14::from_pair(msb, U7::MIN)),
                ParamChange::Absolute,
                out,
            );
            state.last_data_msb = Some(msb);
        }
    }

    fn emit(
        state: &mut RpnChannelState,
        group: U4,
        channel: U4,
        value: ParamValue,
        change: ParamChange,
        out: &mut Vec<MidiEvent>,
    ) {
        let Some((kind, param)) = state.selected() else {
            return;
        };
        let msg = match kind {
            ParamKind::Rpn => ChannelVoiceMsg::Rpn {
                parameter: RegisteredParameter::from_number(param),
                value,
                change,
            },
            ParamKind::Nrpn => ChannelVoiceMsg::Nrpn {
                parameter: param,
                value,
                change,
            },
        };
        state.held.clear();
        out.push(MidiEvent::ChannelVoice {
            group,
            channel,
            msg,
        });
    }

    /// Replays held raw CCs and clears all transaction state.
    fn abort_channel(state: &mut RpnChannelState, out: &mut Vec<MidiEvent>) {
        out.append(&mut state.held);
        state.kind = None;
        state.param_msb = None;
        state.param_lsb = None;
        state.data_msb = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::LsbController;
    use crate::midi1::decode_midi1;

    fn cc(channel: u8, controller: u8, value: u8) -> MidiEvent {
        MidiEvent::control_change(
            U4::new(channel),
            Controller::from_number(U7::new(controller)),
            ControlValue::Midi1(U7::new(value)),
        )
    }

    #[test]
    fn test_cc14_pair_combines() {
        // Scenario: B0 01 40 then B0 21 00 -> 14-bit mod wheel 0x2000.
        let mut combiner = Cc14Combiner::new();
        let mut out = Vec::new();
        combiner.process(cc(0, 0x01, 0x40), &mut out);
        combiner.process(cc(0, 0x21, 0x00), &mut out);
        combiner.flush(&mut out);
        assert_eq!(
            out,
            vec![CombinedEvent::Cc14(Cc14Event {
                group: U4::MIN,
                channel: U4::MIN,
                controller: U7::new(1),
                value: U14::new(0x2000),
            })]
        );
    }

    #[test]
    fn test_cc14_without_combiner_stays_separate() {
        let events: Vec<_> = decode_midi1(&[0xB0, 0x01, 0x40, 0xB0, 0x21, 0x00])
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_cc14_mismatched_lsb_passes_through() {
        let mut combiner = Cc14Combiner::new();
        let mut out = Vec::new();
        combiner.process(cc(0, 0x01, 0x40), &mut out);
        // LSB for a different MSB controller.
        combiner.process(cc(0, 0x22, 0x10), &mut out);
        combiner.flush(&mut out);
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], CombinedEvent::Event(_)));
        assert!(matches!(out[1], CombinedEvent::Event(_)));
    }

    #[test]
    fn test_cc14_window_expiry() {
        let mut combiner = Cc14Combiner::new();
        let mut out = Vec::new();
        combiner.process(cc(0, 0x01, 0x40), &mut out);
        combiner.process(cc(0, 0x07, 0x50), &mut out); // intervening event
        combiner.process(cc(0, 0x21, 0x00), &mut out); // LSB now too late
        combiner.flush(&mut out);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|e| matches!(e, CombinedEvent::Event(_))));
    }

    #[test]
    fn test_rpn_transaction_combines() {
        // Pitch bend sensitivity = 2 semitones 0 cents.
        let mut combiner = RpnCombiner::new();
        let mut out = Vec::new();
        for event in [cc(0, 101, 0), cc(0, 100, 0), cc(0, 6, 2), cc(0, 38, 0)] {
            combiner.process(event, &mut out);
        }
        combiner.flush(&mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0],
            MidiEvent::ChannelVoice {
                group: U4::MIN,
                channel: U4::MIN,
                msg: ChannelVoiceMsg::Rpn {
                    parameter: RegisteredParameter::PitchBendSensitivity,
                    value: ParamValue::Midi1(U14::from_pair(U7::new(2), U7::MIN)),
                    change: ParamChange::Absolute,
                },
            }
        );
    }

    #[test]
    fn test_rpn_roundtrip_through_wire() {
        let event = MidiEvent::ChannelVoice {
            group: U4::MIN,
            channel: U4::new(3),
            msg: ChannelVoiceMsg::Rpn {
                parameter: RegisteredParameter::ChannelFineTuning,
                value: ParamValue::Midi1(U14::new(0x1234)),
                change: ParamChange::Absolute,
            },
        };
        let bytes = event.to_midi1_bytes().unwrap();
        let mut combiner = RpnCombiner::new();
        let mut out = Vec::new();
        for decoded in decode_midi1(&bytes) {
            combiner.process(decoded.unwrap(), &mut out);
        }
        combiner.flush(&mut out);
        assert_eq!(out, vec![event]);
    }

    #[test]
    fn test_nrpn_transaction_combines() {
        let mut combiner = RpnCombiner::new();
        let mut out = Vec::new();
        for event in [cc(2, 99, 0x10), cc(2, 98, 0x20), cc(2, 6, 0x7F), cc(2, 38, 0x01)] {
            combiner.process(event, &mut out);
        }
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0],
            MidiEvent::ChannelVoice {
                group: U4::MIN,
                channel: U4::new(2),
                msg: ChannelVoiceMsg::Nrpn {
                    parameter: U14::from_pair(U7::new(0x10), U7::new(0x20)),
                    value: ParamValue::Midi1(U14::from_pair(U7::new(0x7F), U7::new(0x01))),
                    change: ParamChange::Absolute,
                },
            }
        );
    }

    #[test]
    fn test_rpn_relative_increment() {
        let mut combiner = RpnCombiner::new();
        let mut out = Vec::new();
        for event in [cc(0, 101, 0), cc(0, 100, 0), cc(0, 96, 1)] {
            combiner.process(event, &mut out);
        }
        assert_eq!(out.len(), 1);
        assert!(matches!(
            &out[0],
            MidiEvent::ChannelVoice {
                msg: ChannelVoiceMsg::Rpn {
                    change: ParamChange::Relative,
                    value,
                    ..
                },
                ..
            } if value.as_relative() == 1
        ));

        let mut out2 = Vec::new();
        let mut combiner = RpnCombiner::new();
        for event in [cc(0, 101, 0), cc(0, 100, 0), cc(0, 97, 3)] {
            combiner.process(event, &mut out2);
        }
        assert!(matches!(
            &out2[0],
            MidiEvent::ChannelVoice {
                msg: ChannelVoiceMsg::Rpn { value, .. },
                ..
            } if value.as_relative() == -3
        ));
    }

    #[test]
    fn test_data_entry_without_selection_passes_raw() {
        let mut combiner = RpnCombiner::new();
        let mut out = Vec::new();
        combiner.process(cc(0, 6, 42), &mut out);
        combiner.flush(&mut out);
        assert_eq!(out, vec![cc(0, 6, 42)]);
    }

    #[test]
    fn test_abandoned_selection_replays_raw() {
        let mut combiner = RpnCombiner::new();
        let mut out = Vec::new();
        combiner.process(cc(0, 101, 0), &mut out);
        combiner.process(cc(0, 100, 0), &mut out);
        // A plain CC ends the transaction before any data entry.
        combiner.process(cc(0, 7, 100), &mut out);
        combiner.flush(&mut out);
        assert_eq!(out, vec![cc(0, 101, 0), cc(0, 100, 0), cc(0, 7, 100)]);
    }

    #[test]
    fn test_data_entry_without_lsb_emits_on_next_event() {
        let mut combiner = RpnCombiner::new();
        let mut out = Vec::new();
        for event in [cc(0, 101, 0), cc(0, 100, 0), cc(0, 6, 2), cc(0, 7, 100)] {
            combiner.process(event, &mut out);
        }
        assert_eq!(out.len(), 2);
        assert!(matches!(
            &out[0],
            MidiEvent::ChannelVoice {
                msg: ChannelVoiceMsg::Rpn { value, .. },
                ..
            } if value.midi1() == U14::from_pair(U7::new(2), U7::MIN)
        ));
        assert_eq!(out[1], cc(0, 7, 100));
    }

    #[test]
    fn test_realtime_interleaves_transparently() {
        let clock = MidiEvent::SystemRealTime {
            group: U4::MIN,
            msg: crate::event::SystemRealTimeMsg::TimingClock,
        };
        let mut combiner = RpnCombiner::new();
        let mut out = Vec::new();
        for event in [
            cc(0, 101, 0),
            clock.clone(),
            cc(0, 100, 0),
            cc(0, 6, 2),
            cc(0, 38, 0),
        ] {
            combiner.process(event, &mut out);
        }
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], clock);
        assert!(matches!(
            out[1],
            MidiEvent::ChannelVoice {
                msg: ChannelVoiceMsg::Rpn { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_null_parameter_deselects() {
        let mut combiner = RpnCombiner::new();
        let mut out = Vec::new();
        for event in [cc(0, 101, 0x7F), cc(0, 100, 0x7F), cc(0, 6, 5)] {
            combiner.process(event, &mut out);
        }
        combiner.flush(&mut out);
        // Selection CCs replay raw; data entry after null is raw too.
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|e| matches!(
            e,
            MidiEvent::ChannelVoice {
                msg: ChannelVoiceMsg::ControlChange { .. },
                ..
            }
        )));
    }

    #[test]
    fn test_lsb_controller_names_in_pairs() {
        // The LSB half of the pair carries an LSB controller name when
        // decoded standalone.
        assert_eq!(
            Controller::from_number(U7::new(0x21)),
            Controller::Lsb(LsbController::ModWheel)
        );
    }
}
