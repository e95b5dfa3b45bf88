//! The HUI switch address space.
//!
//! A switch is a `(zone, port)` pair. Zones 0x00-0x07 are the eight
//! channel strips; the remaining zones partition into named surface
//! sections. Unknown pairs decode to [`HuiSwitch::Undefined`] rather than
//! fail: surfaces in the wild emit coordinates outside the published map.

use midikit_core::num::{U4, U7};

macro_rules! port_enum {
    ($(#[$attr:meta])* $name:ident { $($variant:ident = $port:expr),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const fn port(self) -> u8 {
                match self {
                    $(Self::$variant => $port),+
                }
            }

            pub const fn from_port(port: u8) -> Option<Self> {
                match port {
                    $($port => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

port_enum!(
    /// Per-strip switches (zones 0x00-0x07).
    StripSwitch {
        FaderTouch = 0,
        Select = 1,
        Mute = 2,
        Solo = 3,
        Auto = 4,
        VSel = 5,
        Insert = 6,
        RecordReady = 7,
    }
);

port_enum!(
    /// Keyboard-shortcut keys (zone 0x08).
    HotKeySwitch {
        Ctrl = 0,
        Shift = 1,
        EditMode = 2,
        Undo = 3,
        Cmd = 4,
        Option = 5,
        EditTool = 6,
        Save = 7,
    }
);

port_enum!(
    /// Window-management keys (zone 0x09).
    WindowSwitch {
        Mix = 0,
        Edit = 1,
        Transport = 2,
        MemLoc = 3,
        Status = 4,
        Alt = 5,
    }
);

port_enum!(
    /// Channel/bank navigation (zone 0x0A).
    BankMoveSwitch {
        ChannelLeft = 0,
        BankLeft = 1,
        ChannelRight = 2,
        BankRight = 3,
    }
);

/// Assignment section (zones 0x0B-0x0C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssignSwitch {
    Output,
    Input,
    Pan,
    SendE,
    SendD,
    SendC,
    SendB,
    SendA,
    Assign,
    Default,
    Suspend,
    Shift,
    Mute,
    Bypass,
    RecordReadyAll,
}

impl AssignSwitch {
    const fn zone_port(self) -> (u8, u8) {
        match self {
            Self::Output => (0x0B, 0),
            Self::Input => (0x0B, 1),
            Self::Pan => (0x0B, 2),
            Self::SendE => (0x0B, 3),
            Self::SendD => (0x0B, 4),
            Self::SendC => (0x0B, 5),
            Self::SendB => (0x0B, 6),
            Self::SendA => (0x0B, 7),
            Self::Assign => (0x0C, 0),
            Self::Default => (0x0C, 1),
            Self::Suspend => (0x0C, 2),
            Self::Shift => (0x0C, 3),
            Self::Mute => (0x0C, 4),
            Self::Bypass => (0x0C, 5),
            Self::RecordReadyAll => (0x0C, 6),
        }
    }

    const fn from_zone_port(zone: u8, port: u8) -> Option<Self> {
        match (zone, port) {
            (0x0B, 0) => Some(Self::Output),
            (0x0B, 1) => Some(Self::Input),
            (0x0B, 2) => Some(Self::Pan),
            (0x0B, 3) => Some(Self::SendE),
            (0x0B, 4) => Some(Self::SendD),
            (0x0B, 5) => Some(Self::SendC),
            (0x0B, 6) => Some(Self::SendB),
            (0x0B, 7) => Some(Self::SendA),
            (0x0C, 0) => Some(Self::Assign),
            (0x0C, 1) => Some(Self::Default),
            (0x0C, 2) => Some(Self::Suspend),
            (0x0C, 3) => Some(Self::Shift),
            (0x0C, 4) => Some(Self::Mute),
            (0x0C, 5) => Some(Self::Bypass),
            (0x0C, 6) => Some(Self::RecordReadyAll),
            _ => None,
        }
    }
}

port_enum!(
    /// Cursor and jog controls (zone 0x0D).
    CursorSwitch {
        Down = 0,
        Left = 1,
        Mode = 2,
        Right = 3,
        Up = 4,
        Scrub = 5,
        Shuttle = 6,
    }
);

/// Transport section (zones 0x0E-0x10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportSwitch {
    Talkback,
    Rewind,
    FastForward,
    Stop,
    Play,
    Record,
    ReturnToZero,
    ToEnd,
    OnLine,
    LoopCycle,
    QuickPunch,
    Audition,
    PunchPreRoll,
    PunchIn,
    PunchOut,
    PunchPostRoll,
}

impl TransportSwitch {
    const fn zone_port(self) -> (u8, u8) {
        match self {
            Self::Talkback => (0x0E, 0),
            Self::Rewind => (0x0E, 1),
            Self::FastForward => (0x0E, 2),
            Self::Stop => (0x0E, 3),
            Self::Play => (0x0E, 4),
            Self::Record => (0x0E, 5),
            Self::ReturnToZero => (0x0F, 0),
            Self::ToEnd => (0x0F, 1),
            Self::OnLine => (0x0F, 2),
            Self::LoopCycle => (0x0F, 3),
            Self::QuickPunch => (0x0F, 4),
            Self::Audition => (0x0F, 5),
            Self::PunchPreRoll => (0x10, 0),
            Self::PunchIn => (0x10, 1),
            Self::PunchOut => (0x10, 2),
            Self::PunchPostRoll => (0x10, 3),
        }
    }

    const fn from_zone_port(zone: u8, port: u8) -> Option<Self> {
        match (zone, port) {
            (0x0E, 0) => Some(Self::Talkback),
            (0x0E, 1) => Some(Self::Rewind),
            (0x0E, 2) => Some(Self::FastForward),
            (0x0E, 3) => Some(Self::Stop),
            (0x0E, 4) => Some(Self::Play),
            (0x0E, 5) => Some(Self::Record),
            (0x0F, 0) => Some(Self::ReturnToZero),
            (0x0F, 1) => Some(Self::ToEnd),
            (0x0F, 2) => Some(Self::OnLine),
            (0x0F, 3) => Some(Self::LoopCycle),
            (0x0F, 4) => Some(Self::QuickPunch),
            (0x0F, 5) => Some(Self::Audition),
            (0x10, 0) => Some(Self::PunchPreRoll),
            (0x10, 1) => Some(Self::PunchIn),
            (0x10, 2) => Some(Self::PunchOut),
            (0x10, 3) => Some(Self::PunchPostRoll),
            _ => None,
        }
    }
}

port_enum!(
    /// Automation enables (zone 0x11).
    AutoEnableSwitch {
        Fader = 0,
        Pan = 1,
        Plugin = 2,
        Mute = 3,
        Send = 4,
        SendMute = 5,
    }
);

port_enum!(
    /// Automation modes (zone 0x12).
    AutoModeSwitch {
        Read = 0,
        Latch = 1,
        Trim = 2,
        Touch = 3,
        Write = 4,
        Off = 5,
    }
);

port_enum!(
    /// Status and group keys (zone 0x13).
    StatusGroupSwitch {
        Auto = 0,
        Monitor = 1,
        Phase = 2,
        Group = 3,
        Create = 4,
        Suspend = 5,
    }
);

port_enum!(
    /// Edit keys (zone 0x14).
    EditSwitch {
        Capture = 0,
        Cut = 1,
        Paste = 2,
        Separate = 3,
        Copy = 4,
        Delete = 5,
    }
);

port_enum!(
    /// Function keys (zone 0x15).
    FunctionKeySwitch {
        F1 = 0,
        F2 = 1,
        F3 = 2,
        F4 = 3,
        F5 = 4,
        F6 = 5,
        F7 = 6,
        F8 = 7,
    }
);

port_enum!(
    /// Parameter-edit keys (zone 0x16).
    ParamEditSwitch {
        InsertOrParam = 0,
        Assign = 1,
        Select1 = 2,
        Select2 = 3,
        Select3 = 4,
        Select4 = 5,
        Bypass = 6,
        Compare = 7,
    }
);

/// Numeric keypad (zones 0x17-0x18).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumPadSwitch {
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Decimal,
    Enter,
    Plus,
    Minus,
    Clear,
    Equals,
}

impl NumPadSwitch {
    const fn zone_port(self) -> (u8, u8) {
        match self {
            Self::Num0 => (0x17, 0),
            Self::Num1 => (0x17, 1),
            Self::Num2 => (0x17, 2),
            Self::Num3 => (0x17, 3),
            Self::Num4 => (0x17, 4),
            Self::Num5 => (0x17, 5),
            Self::Num6 => (0x17, 6),
            Self::Num7 => (0x17, 7),
            Self::Num8 => (0x18, 0),
            Self::Num9 => (0x18, 1),
            Self::Decimal => (0x18, 2),
            Self::Enter => (0x18, 3),
            Self::Plus => (0x18, 4),
            Self::Minus => (0x18, 5),
            Self::Clear => (0x18, 6),
            Self::Equals => (0x18, 7),
        }
    }

    const fn from_zone_port(zone: u8, port: u8) -> Option<Self> {
        match (zone, port) {
            (0x17, 0) => Some(Self::Num0),
            (0x17, 1) => Some(Self::Num1),
            (0x17, 2) => Some(Self::Num2),
            (0x17, 3) => Some(Self::Num3),
            (0x17, 4) => Some(Self::Num4),
            (0x17, 5) => Some(Self::Num5),
            (0x17, 6) => Some(Self::Num6),
            (0x17, 7) => Some(Self::Num7),
            (0x18, 0) => Some(Self::Num8),
            (0x18, 1) => Some(Self::Num9),
            (0x18, 2) => Some(Self::Decimal),
            (0x18, 3) => Some(Self::Enter),
            (0x18, 4) => Some(Self::Plus),
            (0x18, 5) => Some(Self::Minus),
            (0x18, 6) => Some(Self::Clear),
            (0x18, 7) => Some(Self::Equals),
            _ => None,
        }
    }
}

port_enum!(
    /// Control-room monitoring (zone 0x19).
    ControlRoomSwitch {
        InputMonitorA = 0,
        InputMonitorB = 1,
        InputMonitorC = 2,
        Discrete = 3,
        Mute = 4,
        Dim = 5,
        Mono = 6,
        Phones = 7,
    }
);

/// A fully resolved switch address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HuiSwitch {
    /// A per-strip switch; the first field is the strip (0-7).
    ChannelStrip(U4, StripSwitch),
    HotKey(HotKeySwitch),
    Window(WindowSwitch),
    BankMove(BankMoveSwitch),
    Assign(AssignSwitch),
    Cursor(CursorSwitch),
    Transport(TransportSwitch),
    AutoEnable(AutoEnableSwitch),
    AutoMode(AutoModeSwitch),
    StatusAndGroup(StatusGroupSwitch),
    Edit(EditSwitch),
    FunctionKey(FunctionKeySwitch),
    ParamEdit(ParamEditSwitch),
    NumPad(NumPadSwitch),
    ControlRoom(ControlRoomSwitch),
    /// A coordinate outside the published table, carried verbatim.
    Undefined { zone: U7, port: U4 },
}

impl HuiSwitch {
    /// The wire `(zone, port)` address.
    pub const fn zone_port(&self) -> (U7, U4) {
        let (zone, port) = match self {
            Self::ChannelStrip(strip, switch) => (strip.get(), switch.port()),
            Self::HotKey(switch) => (0x08, switch.port()),
            Self::Window(switch) => (0x09, switch.port()),
            Self::BankMove(switch) => (0x0A, switch.port()),
            Self::Assign(switch) => switch.zone_port(),
            Self::Cursor(switch) => (0x0D, switch.port()),
            Self::Transport(switch) => switch.zone_port(),
            Self::AutoEnable(switch) => (0x11, switch.port()),
            Self::AutoMode(switch) => (0x12, switch.port()),
            Self::StatusAndGroup(switch) => (0x13, switch.port()),
            Self::Edit(switch) => (0x14, switch.port()),
            Self::FunctionKey(switch) => (0x15, switch.port()),
            Self::ParamEdit(switch) => (0x16, switch.port()),
            Self::NumPad(switch) => switch.zone_port(),
            Self::ControlRoom(switch) => (0x19, switch.port()),
            Self::Undefined { zone, port } => return (*zone, *port),
        };
        (U7::new(zone), U4::new(port))
    }

    /// Resolves a wire address. Unknown pairs yield
    /// [`HuiSwitch::Undefined`], never an error.
    pub fn from_zone_port(zone: U7, port: U4) -> Self {
        let z = zone.get();
        let p = port.get();
        let resolved = match z {
            0x00..=0x07 => StripSwitch::from_port(p).map(|s| Self::ChannelStrip(U4::new(z), s)),
            0x08 => HotKeySwitch::from_port(p).map(Self::HotKey),
            0x09 => WindowSwitch::from_port(p).map(Self::Window),
            0x0A => BankMoveSwitch::from_port(p).map(Self::BankMove),
            0x0B | 0x0C => AssignSwitch::from_zone_port(z, p).map(Self::Assign),
            0x0D => CursorSwitch::from_port(p).map(Self::Cursor),
            0x0E..=0x10 => TransportSwitch::from_zone_port(z, p).map(Self::Transport),
            0x11 => AutoEnableSwitch::from_port(p).map(Self::AutoEnable),
            0x12 => AutoModeSwitch::from_port(p).map(Self::AutoMode),
            0x13 => StatusGroupSwitch::from_port(p).map(Self::StatusAndGroup),
            0x14 => EditSwitch::from_port(p).map(Self::Edit),
            0x15 => FunctionKeySwitch::from_port(p).map(Self::FunctionKey),
            0x16 => ParamEditSwitch::from_port(p).map(Self::ParamEdit),
            0x17 | 0x18 => NumPadSwitch::from_zone_port(z, p).map(Self::NumPad),
            0x19 => ControlRoomSwitch::from_port(p).map(Self::ControlRoom),
            _ => None,
        };
        resolved.unwrap_or(Self::Undefined { zone, port })
    }
}
