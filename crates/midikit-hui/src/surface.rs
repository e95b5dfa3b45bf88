//! The surface-model state store.
//!
//! [`HuiSurfaceModel`] aggregates every controllable element of a HUI
//! surface. Applying a decoded message mutates exactly one slot and
//! reports whether anything actually changed, so observers can tell a
//! confirmation (idempotent replay, `changed == false`) from a real
//! change. Single-writer, multi-reader: feed from one thread, read
//! published snapshots from any number of others.

use crate::message::{HuiMessage, SmallDisplayTarget, TimeDigit};
use crate::switch::{
    AssignSwitch, AutoEnableSwitch, AutoModeSwitch, BankMoveSwitch, ControlRoomSwitch,
    CursorSwitch, EditSwitch, FunctionKeySwitch, HotKeySwitch, HuiSwitch, NumPadSwitch,
    ParamEditSwitch, StatusGroupSwitch, StripSwitch, TransportSwitch, WindowSwitch,
};
use crate::vpot::{VPot, VPotDisplay};
use arc_swap::ArcSwap;
use midikit_core::num::{U14, U4, U7};
use std::sync::Arc;

/// State of one channel strip.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelStripState {
    pub fader: U14,
    pub fader_touched: bool,
    pub select: bool,
    pub mute: bool,
    pub solo: bool,
    pub auto: bool,
    pub v_sel: bool,
    pub insert: bool,
    pub record_ready: bool,
    pub vpot: VPotDisplay,
    pub display: [u8; 4],
}

/// The complete surface state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceState {
    pub strips: [ChannelStripState; 8],
    /// Parameter-edit pot rings, pots 1-4.
    pub param_vpots: [VPotDisplay; 4],
    /// Time display digits, rightmost first.
    pub time_display: [TimeDigit; 8],
    /// The 2x40 large display as eight 10-character cells.
    pub large_display: [[u8; 10]; 8],
    /// Select-assign 4-character readout.
    pub select_assign: [u8; 4],
    /// Switch states for the non-strip sections, one port bitmask per
    /// zone (unknown coordinates included, so refreshes round-trip).
    #[cfg_attr(feature = "serde", serde(with = "serde_zone_bits"))]
    zone_bits: [u16; 128],
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            strips: Default::default(),
            param_vpots: Default::default(),
            time_display: Default::default(),
            large_display: [[0; 10]; 8],
            select_assign: [0; 4],
            zone_bits: [0; 128],
        }
    }
}

#[cfg(feature = "serde")]
mod serde_zone_bits {
    pub fn serialize<S: serde::Serializer>(
        bits: &[u16; 128],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(bits.as_slice(), serializer)
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[u16; 128], D::Error> {
        let values: Vec<u16> = serde::Deserialize::deserialize(deserializer)?;
        values
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 128 zone masks"))
    }
}

impl SurfaceState {
    /// Whether a non-strip switch is currently on.
    pub fn switch_state(&self, switch: &HuiSwitch) -> bool {
        let (zone, port) = switch.zone_port();
        self.zone_bits[zone.get() as usize] & (1 << port.get()) != 0
    }

    fn set_zone_bit(&mut self, zone: U7, port: U4, state: bool) -> bool {
        let mask = &mut self.zone_bits[zone.get() as usize];
        let bit = 1 << port.get();
        let old = *mask & bit != 0;
        if state {
            *mask |= bit;
        } else {
            *mask &= !bit;
        }
        old != state
    }
}

/// One element of a channel strip, with its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StripElement {
    FaderLevel(U14),
    FaderTouch(bool),
    Select(bool),
    Mute(bool),
    Solo(bool),
    Auto(bool),
    VSel(bool),
    Insert(bool),
    RecordReady(bool),
    VPotDisplay(VPotDisplay),
    /// Transient rotation delta; not a stored slot.
    VPotRotation(i8),
    SmallDisplay([u8; 4]),
}

/// Parameter-edit section activity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamEditNotification {
    Switch { switch: ParamEditSwitch, state: bool },
    VPotDisplay { index: u8, display: VPotDisplay },
    VPotRotation { index: u8, delta: i8 },
}

/// What a surface update touched; mirrors the addressing sections.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HuiNotification {
    Ping { reply: bool },
    ChannelStrip { channel: U4, element: StripElement },
    HotKey { switch: HotKeySwitch, state: bool },
    Window { switch: WindowSwitch, state: bool },
    BankMove { switch: BankMoveSwitch, state: bool },
    Assign { switch: AssignSwitch, state: bool },
    Cursor { switch: CursorSwitch, state: bool },
    Transport { switch: TransportSwitch, state: bool },
    AutoEnable { switch: AutoEnableSwitch, state: bool },
    AutoMode { switch: AutoModeSwitch, state: bool },
    StatusAndGroup { switch: StatusGroupSwitch, state: bool },
    Edit { switch: EditSwitch, state: bool },
    FunctionKey { switch: FunctionKeySwitch, state: bool },
    ParamEdit(ParamEditNotification),
    NumPad { switch: NumPadSwitch, state: bool },
    ControlRoom { switch: ControlRoomSwitch, state: bool },
    ScrollWheel { delta: i8 },
    TimeDisplay { digits: [TimeDigit; 8] },
    LargeDisplay { zone: u8, text: [u8; 10] },
    SelectAssignDisplay { text: [u8; 4] },
    UndefinedSwitch { zone: U7, port: U4, state: bool },
}

/// Result of applying one message to the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateResult {
    /// `false` for idempotent replays (and transient messages).
    pub changed: bool,
    pub notification: HuiNotification,
}

/// Cloneable cross-thread read handle onto the published state.
#[derive(Clone)]
pub struct SurfaceSnapshotHandle(Arc<ArcSwap<SurfaceState>>);

impl SurfaceSnapshotHandle {
    pub fn load(&self) -> Arc<SurfaceState> {
        self.0.load_full()
    }
}

/// The mutable surface model. See the module docs for the threading
/// contract.
pub struct HuiSurfaceModel {
    state: SurfaceState,
    published: Arc<ArcSwap<SurfaceState>>,
}

impl Default for HuiSurfaceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl HuiSurfaceModel {
    pub fn new() -> Self {
        let state = SurfaceState::default();
        Self {
            published: Arc::new(ArcSwap::from_pointee(state.clone())),
            state,
        }
    }

    /// The current state, for same-thread reads.
    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    /// A cloneable cross-thread read handle.
    pub fn snapshot_handle(&self) -> SurfaceSnapshotHandle {
        SurfaceSnapshotHandle(Arc::clone(&self.published))
    }

    /// Applies one decoded message, mutating at most one slot.
    pub fn apply(&mut self, message: &HuiMessage) -> UpdateResult {
        let result = self.apply_inner(message);
        if result.changed {
            self.published.store(Arc::new(self.state.clone()));
        }
        result
    }

    /// Tolerated no-op for coordinates outside the surface (bad strip or
    /// display indices in hand-built messages).
    fn out_of_range(zone: u8) -> UpdateResult {
        UpdateResult {
            changed: false,
            notification: HuiNotification::UndefinedSwitch {
                zone: U7::new_clamping(zone),
                port: U4::MIN,
                state: false,
            },
        }
    }

    fn apply_inner(&mut self, message: &HuiMessage) -> UpdateResult {
        match message {
            HuiMessage::Ping | HuiMessage::PingReply => UpdateResult {
                changed: false,
                notification: HuiNotification::Ping {
                    reply: matches!(message, HuiMessage::PingReply),
                },
            },
            HuiMessage::Switch { switch, state } => self.apply_switch(switch, *state),
            HuiMessage::Fader { channel, level } => {
                let Some(strip) = self.state.strips.get_mut(channel.get() as usize) else {
                    return Self::out_of_range(channel.get());
                };
                let changed = strip.fader != *level;
                strip.fader = *level;
                UpdateResult {
                    changed,
                    notification: HuiNotification::ChannelStrip {
                        channel: *channel,
                        element: StripElement::FaderLevel(*level),
                    },
                }
            }
            HuiMessage::VPotRotation { vpot, delta } => UpdateResult {
                // Rotation is an edge, not a level; it always "happens".
                changed: true,
                notification: match vpot {
                    VPot::Channel(strip) => HuiNotification::ChannelStrip {
                        channel: *strip,
                        element: StripElement::VPotRotation(*delta),
                    },
                    VPot::Param(index) => HuiNotification::ParamEdit(
                        ParamEditNotification::VPotRotation {
                            index: *index,
                            delta: *delta,
                        },
                    ),
                    VPot::Scroll => HuiNotification::ScrollWheel { delta: *delta },
                },
            },
            HuiMessage::VPotDisplay { vpot, display } => match vpot {
                VPot::Channel(strip_index) => {
                    let Some(strip) = self.state.strips.get_mut(strip_index.get() as usize)
                    else {
                        return Self::out_of_range(strip_index.get());
                    };
                    let changed = strip.vpot != *display;
                    strip.vpot = *display;
                    UpdateResult {
                        changed,
                        notification: HuiNotification::ChannelStrip {
                            channel: *strip_index,
                            element: StripElement::VPotDisplay(*display),
                        },
                    }
                }
                VPot::Param(index) => {
                    let Some(slot) = index
                        .checked_sub(1)
                        .and_then(|i| self.state.param_vpots.get_mut(i as usize))
                    else {
                        return Self::out_of_range(*index);
                    };
                    let changed = *slot != *display;
                    *slot = *display;
                    UpdateResult {
                        changed,
                        notification: HuiNotification::ParamEdit(
                            ParamEditNotification::VPotDisplay {
                                index: *index,
                                display: *display,
                            },
                        ),
                    }
                }
                // The scroll encoder has no ring; nothing to store.
                VPot::Scroll => UpdateResult {
                    changed: false,
                    notification: HuiNotification::ScrollWheel { delta: 0 },
                },
            },
            HuiMessage::SmallDisplay { target, text } => match target {
                SmallDisplayTarget::Strip(strip_index) => {
                    let Some(strip) = self.state.strips.get_mut(strip_index.get() as usize)
                    else {
                        return Self::out_of_range(strip_index.get());
                    };
                    let changed = strip.display != *text;
                    strip.display = *text;
                    UpdateResult {
                        changed,
                        notification: HuiNotification::ChannelStrip {
                            channel: *strip_index,
                            element: StripElement::SmallDisplay(*text),
                        },
                    }
                }
                SmallDisplayTarget::SelectAssign => {
                    let changed = self.state.select_assign != *text;
                    self.state.select_assign = *text;
                    UpdateResult {
                        changed,
                        notification: HuiNotification::SelectAssignDisplay { text: *text },
                    }
                }
            },
            HuiMessage::TimeDisplay { digits } => {
                let changed = self.state.time_display != *digits;
                self.state.time_display = *digits;
                UpdateResult {
                    changed,
                    notification: HuiNotification::TimeDisplay { digits: *digits },
                }
            }
            HuiMessage::LargeDisplay { zone, text } => {
                let Some(slot) = self.state.large_display.get_mut(*zone as usize) else {
                    return Self::out_of_range(*zone);
                };
                let changed = *slot != *text;
                *slot = *text;
                UpdateResult {
                    changed,
                    notification: HuiNotification::LargeDisplay {
                        zone: *zone,
                        text: *text,
                    },
                }
            }
        }
    }

    fn apply_switch(&mut self, switch: &HuiSwitch, state: bool) -> UpdateResult {
        if let HuiSwitch::ChannelStrip(strip_index, strip_switch) = switch {
            let Some(strip) = self.state.strips.get_mut(strip_index.get() as usize) else {
                return Self::out_of_range(strip_index.get());
            };
            let (slot, element) = match strip_switch {
                StripSwitch::FaderTouch => {
                    (&mut strip.fader_touched, StripElement::FaderTouch(state))
                }
                StripSwitch::Select => (&mut strip.select, StripElement::Select(state)),
                StripSwitch::Mute => (&mut strip.mute, StripElement::Mute(state)),
                StripSwitch::Solo => (&mut strip.solo, StripElement::Solo(state)),
                StripSwitch::Auto => (&mut strip.auto, StripElement::Auto(state)),
                StripSwitch::VSel => (&mut strip.v_sel, StripElement::VSel(state)),
                StripSwitch::Insert => (&mut strip.insert, StripElement::Insert(state)),
                StripSwitch::RecordReady => {
                    (&mut strip.record_ready, StripElement::RecordReady(state))
                }
            };
            let changed = *slot != state;
            *slot = state;
            return UpdateResult {
                changed,
                notification: HuiNotification::ChannelStrip {
                    channel: *strip_index,
                    element,
                },
            };
        }

        let (zone, port) = switch.zone_port();
        let changed = self.state.set_zone_bit(zone, port, state);
        let notification = match *switch {
            HuiSwitch::ChannelStrip(..) => unreachable!("handled above"),
            HuiSwitch::HotKey(switch) => HuiNotification::HotKey { switch, state },
            HuiSwitch::Window(switch) => HuiNotification::Window { switch, state },
            HuiSwitch::BankMove(switch) => HuiNotification::BankMove { switch, state },
            HuiSwitch::Assign(switch) => HuiNotification::Assign { switch, state },
            HuiSwitch::Cursor(switch) => HuiNotification::Cursor { switch, state },
            HuiSwitch::Transport(switch) => HuiNotification::Transport { switch, state },
            HuiSwitch::AutoEnable(switch) => HuiNotification::AutoEnable { switch, state },
            HuiSwitch::AutoMode(switch) => HuiNotification::AutoMode { switch, state },
            HuiSwitch::StatusAndGroup(switch) => {
                HuiNotification::StatusAndGroup { switch, state }
            }
            HuiSwitch::Edit(switch) => HuiNotification::Edit { switch, state },
            HuiSwitch::FunctionKey(switch) => HuiNotification::FunctionKey { switch, state },
            HuiSwitch::ParamEdit(switch) => {
                HuiNotification::ParamEdit(ParamEditNotification::Switch { switch, state })
            }
            HuiSwitch::NumPad(switch) => HuiNotification::NumPad { switch, state },
            HuiSwitch::ControlRoom(switch) => HuiNotification::ControlRoom { switch, state },
            HuiSwitch::Undefined { zone, port } => HuiNotification::UndefinedSwitch {
                zone,
                port,
                state,
            },
        };
        UpdateResult {
            changed,
            notification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vpot::VPotMode;

    #[test]
    fn test_vpot_display_update_and_idempotence() {
        let mut model = HuiSurfaceModel::new();
        let message = HuiMessage::VPotDisplay {
            vpot: VPot::Channel(U4::new(3)),
            display: VPotDisplay::new(VPotMode::Single(0.5), false),
        };

        let first = model.apply(&message);
        assert!(first.changed);
        assert_eq!(
            first.notification,
            HuiNotification::ChannelStrip {
                channel: U4::new(3),
                element: StripElement::VPotDisplay(VPotDisplay::new(
                    VPotMode::Single(0.5),
                    false
                )),
            }
        );
        // LED 6 of 11 (0-based index 5) is lit for a centered single dot.
        let pattern = model.state().strips[3].vpot.led_pattern();
        assert!(pattern[5]);
        assert_eq!(pattern.iter().filter(|&&on| on).count(), 1);

        // The identical message again confirms without changing.
        let second = model.apply(&message);
        assert!(!second.changed);
        assert_eq!(second.notification, first.notification);
    }

    #[test]
    fn test_switch_updates_one_slot() {
        let mut model = HuiSurfaceModel::new();
        let result = model.apply(&HuiMessage::Switch {
            switch: HuiSwitch::ChannelStrip(U4::new(2), StripSwitch::Mute),
            state: true,
        });
        assert!(result.changed);
        assert!(model.state().strips[2].mute);
        assert!(!model.state().strips[2].solo);
        assert!(model
            .state()
            .strips
            .iter()
            .enumerate()
            .all(|(i, s)| i == 2 || !s.mute));
    }

    #[test]
    fn test_section_switch_notification() {
        let mut model = HuiSurfaceModel::new();
        let switch = HuiSwitch::Transport(TransportSwitch::Play);
        let result = model.apply(&HuiMessage::Switch {
            switch,
            state: true,
        });
        assert_eq!(
            result.notification,
            HuiNotification::Transport {
                switch: TransportSwitch::Play,
                state: true
            }
        );
        assert!(model.state().switch_state(&switch));

        let off = model.apply(&HuiMessage::Switch {
            switch,
            state: false,
        });
        assert!(off.changed);
        assert!(!model.state().switch_state(&switch));
    }

    #[test]
    fn test_undefined_switch_tolerated() {
        let mut model = HuiSurfaceModel::new();
        let switch = HuiSwitch::Undefined {
            zone: U7::new(0x55),
            port: U4::new(12),
        };
        let result = model.apply(&HuiMessage::Switch {
            switch,
            state: true,
        });
        assert!(result.changed);
        assert_eq!(
            result.notification,
            HuiNotification::UndefinedSwitch {
                zone: U7::new(0x55),
                port: U4::new(12),
                state: true
            }
        );
        assert!(model.state().switch_state(&switch));
    }

    #[test]
    fn test_fader_level() {
        let mut model = HuiSurfaceModel::new();
        let result = model.apply(&HuiMessage::Fader {
            channel: U4::new(0),
            level: U14::new(0x2000),
        });
        assert!(result.changed);
        assert_eq!(model.state().strips[0].fader, U14::new(0x2000));
        // Replay confirms.
        assert!(
            !model
                .apply(&HuiMessage::Fader {
                    channel: U4::new(0),
                    level: U14::new(0x2000),
                })
                .changed
        );
    }

    #[test]
    fn test_rotation_is_transient() {
        let mut model = HuiSurfaceModel::new();
        let before = model.state().clone();
        let result = model.apply(&HuiMessage::VPotRotation {
            vpot: VPot::Scroll,
            delta: -2,
        });
        assert!(result.changed);
        assert_eq!(
            result.notification,
            HuiNotification::ScrollWheel { delta: -2 }
        );
        assert_eq!(*model.state(), before, "rotation stores nothing");
    }

    #[test]
    fn test_displays() {
        let mut model = HuiSurfaceModel::new();
        model.apply(&HuiMessage::SmallDisplay {
            target: SmallDisplayTarget::Strip(U4::new(1)),
            text: *b"Bass",
        });
        assert_eq!(&model.state().strips[1].display, b"Bass");

        model.apply(&HuiMessage::LargeDisplay {
            zone: 0,
            text: *b"0123456789",
        });
        assert_eq!(&model.state().large_display[0], b"0123456789");

        let result = model.apply(&HuiMessage::SmallDisplay {
            target: SmallDisplayTarget::SelectAssign,
            text: *b"SndA",
        });
        assert_eq!(
            result.notification,
            HuiNotification::SelectAssignDisplay { text: *b"SndA" }
        );
    }

    #[test]
    fn test_full_refresh_is_idempotent() {
        let mut model = HuiSurfaceModel::new();
        let refresh = [
            HuiMessage::Fader {
                channel: U4::new(0),
                level: U14::new(100),
            },
            HuiMessage::Switch {
                switch: HuiSwitch::ChannelStrip(U4::new(0), StripSwitch::Select),
                state: true,
            },
            HuiMessage::VPotDisplay {
                vpot: VPot::Param(1),
                display: VPotDisplay::new(VPotMode::LeftAnchor(0.7), true),
            },
        ];
        for message in &refresh {
            model.apply(message);
        }
        let snapshot = model.state().clone();
        for message in &refresh {
            let result = model.apply(message);
            assert!(!result.changed, "{message:?} not idempotent");
        }
        assert_eq!(*model.state(), snapshot);
    }

    #[test]
    fn test_snapshot_handle_cross_thread() {
        let mut model = HuiSurfaceModel::new();
        let handle = model.snapshot_handle();
        model.apply(&HuiMessage::Switch {
            switch: HuiSwitch::Transport(TransportSwitch::Record),
            state: true,
        });
        let reader = std::thread::spawn(move || {
            handle
                .load()
                .switch_state(&HuiSwitch::Transport(TransportSwitch::Record))
        });
        assert!(reader.join().expect("reader thread"));
    }
}
