//! Predicate filters over event streams.
//!
//! Filters are pure: they preserve order and never combine or split
//! events. A filter either keeps or drops the events a criterion applies
//! to; events outside the criterion's domain (e.g. system events under a
//! channel criterion) always pass through.

use crate::event::{ChannelVoiceMsg, MidiEvent, SysExMsg, SystemCommonMsg, SystemRealTimeMsg, UtilityMsg};
use crate::num::{U4, U7};

/// Discriminant of a [`MidiEvent`], for type-based filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EventKind {
    NoteOff,
    NoteOn,
    NotePressure,
    NoteCc,
    NotePitchBend,
    NoteManagement,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    Rpn,
    Nrpn,
    TimecodeQuarterFrame,
    SongPositionPointer,
    SongSelect,
    TuneRequest,
    TimingClock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
    SystemReset,
    SysEx7,
    UniversalSysEx7,
    SysEx8,
    UniversalSysEx8,
    NoOp,
    JrClock,
    JrTimestamp,
    Unrecognized,
}

impl MidiEvent {
    /// This event's discriminant.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ChannelVoice { msg, .. } => match msg {
                ChannelVoiceMsg::NoteOff { .. } => EventKind::NoteOff,
                ChannelVoiceMsg::NoteOn { .. } => EventKind::NoteOn,
                ChannelVoiceMsg::NotePressure { .. } => EventKind::NotePressure,
                ChannelVoiceMsg::NoteCc { .. } => EventKind::NoteCc,
                ChannelVoiceMsg::NotePitchBend { .. } => EventKind::NotePitchBend,
                ChannelVoiceMsg::NoteManagement { .. } => EventKind::NoteManagement,
                ChannelVoiceMsg::ControlChange { .. } => EventKind::ControlChange,
                ChannelVoiceMsg::ProgramChange { .. } => EventKind::ProgramChange,
                ChannelVoiceMsg::ChannelPressure { .. } => EventKind::ChannelPressure,
                ChannelVoiceMsg::PitchBend { .. } => EventKind::PitchBend,
                ChannelVoiceMsg::Rpn { .. } => EventKind::Rpn,
                ChannelVoiceMsg::Nrpn { .. } => EventKind::Nrpn,
            },
            Self::SystemCommon { msg, .. } => match msg {
                SystemCommonMsg::TimecodeQuarterFrame { .. } => EventKind::TimecodeQuarterFrame,
                SystemCommonMsg::SongPositionPointer { .. } => EventKind::SongPositionPointer,
                SystemCommonMsg::SongSelect { .. } => EventKind::SongSelect,
                SystemCommonMsg::TuneRequest => EventKind::TuneRequest,
            },
            Self::SystemRealTime { msg, .. } => match msg {
                SystemRealTimeMsg::TimingClock => EventKind::TimingClock,
                SystemRealTimeMsg::Start => EventKind::Start,
                SystemRealTimeMsg::Continue => EventKind::Continue,
                SystemRealTimeMsg::Stop => EventKind::Stop,
                SystemRealTimeMsg::ActiveSensing => EventKind::ActiveSensing,
                SystemRealTimeMsg::SystemReset => EventKind::SystemReset,
            },
            Self::SysEx(msg) => match msg {
                SysExMsg::SysEx7 { .. } => EventKind::SysEx7,
                SysExMsg::UniversalSysEx7 { .. } => EventKind::UniversalSysEx7,
                SysExMsg::SysEx8 { .. } => EventKind::SysEx8,
                SysExMsg::UniversalSysEx8 { .. } => EventKind::UniversalSysEx8,
            },
            Self::Utility { msg, .. } => match msg {
                UtilityMsg::NoOp => EventKind::NoOp,
                UtilityMsg::JrClock { .. } => EventKind::JrClock,
                UtilityMsg::JrTimestamp { .. } => EventKind::JrTimestamp,
            },
            Self::Unrecognized { .. } => EventKind::Unrecognized,
        }
    }
}

/// A set of [`EventKind`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KindSet(u64);

impl KindSet {
    pub const EMPTY: Self = Self(0);

    pub fn of(kinds: &[EventKind]) -> Self {
        kinds.iter().fold(Self::EMPTY, |set, &kind| set.with(kind))
    }

    #[must_use]
    pub const fn with(self, kind: EventKind) -> Self {
        Self(self.0 | (1 << kind as u8))
    }

    pub const fn contains(self, kind: EventKind) -> bool {
        self.0 & (1 << kind as u8) != 0
    }
}

/// A set of channels or groups (0-15), as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NibbleSet(u16);

impl NibbleSet {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(u16::MAX);

    pub fn of(values: &[U4]) -> Self {
        Self(values.iter().fold(0, |mask, v| mask | (1 << v.get())))
    }

    pub const fn contains(self, value: U4) -> bool {
        self.0 & (1 << value.get()) != 0
    }
}

/// A set of 7-bit numbers (CC numbers, note numbers), as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SevenBitSet([u64; 2]);

impl SevenBitSet {
    pub const EMPTY: Self = Self([0; 2]);

    pub fn of(values: &[U7]) -> Self {
        let mut mask = [0u64; 2];
        for v in values {
            mask[(v.get() / 64) as usize] |= 1 << (v.get() % 64);
        }
        Self(mask)
    }

    /// All numbers in `lo..=hi`.
    pub fn range(lo: U7, hi: U7) -> Self {
        let mut mask = [0u64; 2];
        for v in lo.get()..=hi.get() {
            mask[(v / 64) as usize] |= 1 << (v % 64);
        }
        Self(mask)
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self([self.0[0] | other.0[0], self.0[1] | other.0[1]])
    }

    pub const fn contains(self, value: U7) -> bool {
        self.0[(value.get() / 64) as usize] & (1 << (value.get() % 64)) != 0
    }
}

/// What a filter selects on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterKind {
    /// Every event.
    All,
    /// Events of the given kinds.
    Types(KindSet),
    /// Channel voice events on the given channels.
    Channels(NibbleSet),
    /// Control change events with the given CC numbers.
    CcNumbers(SevenBitSet),
    /// Per-note events whose note is in the set.
    NoteRange(SevenBitSet),
    /// Events on the given UMP groups.
    Groups(NibbleSet),
}

/// Keep or drop the selected events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterAction {
    Keep,
    Drop,
}

/// A composable stream filter. Events outside the criterion's domain pass
/// through untouched under either action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MidiFilter {
    pub action: FilterAction,
    pub kind: FilterKind,
}

impl MidiFilter {
    /// Keeps only the selected events (of those the criterion applies to).
    pub const fn keep(kind: FilterKind) -> Self {
        Self {
            action: FilterAction::Keep,
            kind,
        }
    }

    /// Drops the selected events.
    pub const fn drop(kind: FilterKind) -> Self {
        Self {
            action: FilterAction::Drop,
            kind,
        }
    }

    /// Whether the criterion applies to this event, and whether the event
    /// is selected by it.
    fn applies_and_matches(&self, event: &MidiEvent) -> (bool, bool) {
        match &self.kind {
            FilterKind::All => (true, true),
            FilterKind::Types(set) => (true, set.contains(event.kind())),
            FilterKind::Channels(set) => match event.channel() {
                Some(channel) => (true, set.contains(channel)),
                None => (false, false),
            },
            FilterKind::CcNumbers(set) => match event {
                MidiEvent::ChannelVoice {
                    msg: ChannelVoiceMsg::ControlChange { controller, .. },
                    ..
                } => (true, set.contains(controller.number())),
                _ => (false, false),
            },
            FilterKind::NoteRange(set) => match event.note() {
                Some(note) => (true, set.contains(note)),
                None => (false, false),
            },
            FilterKind::Groups(set) => (true, set.contains(event.group())),
        }
    }

    /// Whether `event` survives this filter.
    pub fn retains(&self, event: &MidiEvent) -> bool {
        let (applies, matches) = self.applies_and_matches(event);
        if !applies {
            return true;
        }
        match self.action {
            FilterAction::Keep => matches,
            FilterAction::Drop => !matches,
        }
    }

    /// Filters an event stream, preserving order.
    pub fn apply<I>(&self, events: I) -> impl Iterator<Item = MidiEvent>
    where
        I: IntoIterator<Item = MidiEvent>,
    {
        let filter = *self;
        events.into_iter().filter(move |e| filter.retains(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use crate::event::{ControlValue, Velocity};

    fn sample_events() -> Vec<MidiEvent> {
        vec![
            MidiEvent::note_on(U4::new(0), U7::new(60), Velocity::Midi1(U7::new(1))),
            MidiEvent::note_on(U4::new(1), U7::new(72), Velocity::Midi1(U7::new(1))),
            MidiEvent::control_change(
                U4::new(0),
                Controller::ModWheel,
                ControlValue::Midi1(U7::new(10)),
            ),
            MidiEvent::SystemRealTime {
                group: U4::MIN,
                msg: SystemRealTimeMsg::TimingClock,
            },
        ]
    }

    #[test]
    fn test_keep_all_is_identity() {
        let events = sample_events();
        let filtered: Vec<_> = MidiFilter::keep(FilterKind::All)
            .apply(events.clone())
            .collect();
        assert_eq!(filtered, events);
    }

    #[test]
    fn test_drop_empty_type_set_is_identity() {
        let events = sample_events();
        let filtered: Vec<_> = MidiFilter::drop(FilterKind::Types(KindSet::EMPTY))
            .apply(events.clone())
            .collect();
        assert_eq!(filtered, events);
    }

    #[test]
    fn test_filter_by_type() {
        let filtered: Vec<_> = MidiFilter::keep(FilterKind::Types(KindSet::of(&[
            EventKind::NoteOn,
        ])))
        .apply(sample_events())
        .collect();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|e| e.kind() == EventKind::NoteOn));
    }

    #[test]
    fn test_channel_filter_passes_system_events() {
        let filtered: Vec<_> =
            MidiFilter::keep(FilterKind::Channels(NibbleSet::of(&[U4::new(1)])))
                .apply(sample_events())
                .collect();
        // Note-on on channel 1 plus the channel-less clock.
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].channel(), Some(U4::new(1)));
        assert_eq!(filtered[1].kind(), EventKind::TimingClock);
    }

    #[test]
    fn test_drop_by_channel() {
        let filtered: Vec<_> =
            MidiFilter::drop(FilterKind::Channels(NibbleSet::of(&[U4::new(0)])))
                .apply(sample_events())
                .collect();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|e| e.channel() != Some(U4::new(0))));
    }

    #[test]
    fn test_cc_number_filter() {
        let filtered: Vec<_> =
            MidiFilter::drop(FilterKind::CcNumbers(SevenBitSet::of(&[U7::new(1)])))
                .apply(sample_events())
                .collect();
        assert_eq!(filtered.len(), 3);
        assert!(filtered
            .iter()
            .all(|e| e.kind() != EventKind::ControlChange));
    }

    #[test]
    fn test_note_range_filter() {
        let filtered: Vec<_> = MidiFilter::keep(FilterKind::NoteRange(SevenBitSet::range(
            U7::new(60),
            U7::new(64),
        )))
        .apply(sample_events())
        .collect();
        // Note 72 dropped, note 60 kept, non-note events pass.
        assert_eq!(filtered.len(), 3);
        assert!(!filtered.iter().any(|e| e.note() == Some(U7::new(72))));
    }

    #[test]
    fn test_group_filter() {
        let events = vec![
            sample_events()[0].clone().with_group(U4::new(2)),
            sample_events()[1].clone(),
        ];
        let filtered: Vec<_> =
            MidiFilter::keep(FilterKind::Groups(NibbleSet::of(&[U4::new(2)])))
                .apply(events)
                .collect();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].group(), U4::new(2));
    }

    #[test]
    fn test_order_preserved() {
        let events = sample_events();
        let filtered: Vec<_> = MidiFilter::drop(FilterKind::Types(KindSet::of(&[
            EventKind::ControlChange,
        ])))
        .apply(events.clone())
        .collect();
        assert_eq!(filtered, vec![
            events[0].clone(),
            events[1].clone(),
            events[3].clone(),
        ]);
    }

    #[test]
    fn test_seven_bit_set() {
        let set = SevenBitSet::range(U7::new(0), U7::new(31))
            .union(SevenBitSet::of(&[U7::new(100)]));
        assert!(set.contains(U7::new(0)));
        assert!(set.contains(U7::new(31)));
        assert!(set.contains(U7::new(100)));
        assert!(!set.contains(U7::new(32)));
        assert!(!set.contains(U7::new(127)));
    }
}
