//! Control change numbers and registered parameter numbers.

use crate::num::{U14, U7};

/// A MIDI controller number, by name.
///
/// Every defined CC 0..=127 has a named case; reserved numbers decode to
/// [`Controller::Undefined`]. [`Controller::Raw`] carries a number verbatim
/// for callers that want to bypass the naming entirely; it encodes to the
/// same byte as the equivalent named case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Controller {
    /// CC 0
    BankSelect,
    /// CC 1
    ModWheel,
    /// CC 2
    Breath,
    /// CC 4
    Foot,
    /// CC 5
    PortamentoTime,
    /// CC 6
    DataEntry,
    /// CC 7
    Volume,
    /// CC 8
    Balance,
    /// CC 10
    Pan,
    /// CC 11
    Expression,
    /// CC 12
    EffectControl1,
    /// CC 13
    EffectControl2,
    /// CC 16
    GeneralPurpose1,
    /// CC 17
    GeneralPurpose2,
    /// CC 18
    GeneralPurpose3,
    /// CC 19
    GeneralPurpose4,
    /// CC 32-63: LSB companion of CC 0-31.
    Lsb(LsbController),
    /// CC 64
    SustainPedal,
    /// CC 65
    Portamento,
    /// CC 66
    Sostenuto,
    /// CC 67
    SoftPedal,
    /// CC 68
    LegatoFootswitch,
    /// CC 69
    Hold2,
    /// CC 70
    SoundVariation,
    /// CC 71
    Timbre,
    /// CC 72
    ReleaseTime,
    /// CC 73
    AttackTime,
    /// CC 74
    Brightness,
    /// CC 75
    DecayTime,
    /// CC 76
    VibratoRate,
    /// CC 77
    VibratoDepth,
    /// CC 78
    VibratoDelay,
    /// CC 79
    SoundController10,
    /// CC 80
    GeneralPurpose5,
    /// CC 81
    GeneralPurpose6,
    /// CC 82
    GeneralPurpose7,
    /// CC 83
    GeneralPurpose8,
    /// CC 84
    PortamentoControl,
    /// CC 88
    HighResVelocityPrefix,
    /// CC 91
    ReverbSendLevel,
    /// CC 92
    TremoloDepth,
    /// CC 93
    ChorusSendLevel,
    /// CC 94
    CelesteDepth,
    /// CC 95
    PhaserDepth,
    /// CC 96
    DataIncrement,
    /// CC 97
    DataDecrement,
    /// CC 98
    NrpnLsb,
    /// CC 99
    NrpnMsb,
    /// CC 100
    RpnLsb,
    /// CC 101
    RpnMsb,
    /// CC 120
    AllSoundOff,
    /// CC 121
    ResetAllControllers,
    /// CC 122
    LocalControl,
    /// CC 123
    AllNotesOff,
    /// CC 124
    OmniModeOff,
    /// CC 125
    OmniModeOn,
    /// CC 126
    MonoModeOn,
    /// CC 127
    PolyModeOn,
    /// A CC number the MIDI spec leaves undefined.
    Undefined(U7),
    /// Verbatim controller number, bypassing naming.
    Raw(U7),
}

impl Controller {
    /// The wire controller number.
    pub const fn number(self) -> U7 {
        use Controller::*;
        let n: u8 = match self {
            BankSelect => 0,
            ModWheel => 1,
            Breath => 2,
            Foot => 4,
            PortamentoTime => 5,
            DataEntry => 6,
            Volume => 7,
            Balance => 8,
            Pan => 10,
            Expression => 11,
            EffectControl1 => 12,
            EffectControl2 => 13,
            GeneralPurpose1 => 16,
            GeneralPurpose2 => 17,
            GeneralPurpose3 => 18,
            GeneralPurpose4 => 19,
            Lsb(lsb) => return lsb.number(),
            SustainPedal => 64,
            Portamento => 65,
            Sostenuto => 66,
            SoftPedal => 67,
            LegatoFootswitch => 68,
            Hold2 => 69,
            SoundVariation => 70,
            Timbre => 71,
            ReleaseTime => 72,
            AttackTime => 73,
            Brightness => 74,
            DecayTime => 75,
            VibratoRate => 76,
            VibratoDepth => 77,
            VibratoDelay => 78,
            SoundController10 => 79,
            GeneralPurpose5 => 80,
            GeneralPurpose6 => 81,
            GeneralPurpose7 => 82,
            GeneralPurpose8 => 83,
            PortamentoControl => 84,
            HighResVelocityPrefix => 88,
            ReverbSendLevel => 91,
            TremoloDepth => 92,
            ChorusSendLevel => 93,
            CelesteDepth => 94,
            PhaserDepth => 95,
            DataIncrement => 96,
            DataDecrement => 97,
            NrpnLsb => 98,
            NrpnMsb => 99,
            RpnLsb => 100,
            RpnMsb => 101,
            AllSoundOff => 120,
            ResetAllControllers => 121,
            LocalControl => 122,
            AllNotesOff => 123,
            OmniModeOff => 124,
            OmniModeOn => 125,
            MonoModeOn => 126,
            PolyModeOn => 127,
            Undefined(n) | Raw(n) => return n,
        };
        U7::new(n)
    }

    /// The named controller for a wire number. Never returns
    /// [`Controller::Raw`].
    pub const fn from_number(number: U7) -> Self {
        use Controller::*;
        match number.get() {
            0 => BankSelect,
            1 => ModWheel,
            2 => Breath,
            4 => Foot,
            5 => PortamentoTime,
            6 => DataEntry,
            7 => Volume,
            8 => Balance,
            10 => Pan,
            11 => Expression,
            12 => EffectControl1,
            13 => EffectControl2,
            16 => GeneralPurpose1,
            17 => GeneralPurpose2,
            18 => GeneralPurpose3,
            19 => GeneralPurpose4,
            32..=63 => Lsb(LsbController::from_number(number)),
            64 => SustainPedal,
            65 => Portamento,
            66 => Sostenuto,
            67 => SoftPedal,
            68 => LegatoFootswitch,
            69 => Hold2,
            70 => SoundVariation,
            71 => Timbre,
            72 => ReleaseTime,
            73 => AttackTime,
            74 => Brightness,
            75 => DecayTime,
            76 => VibratoRate,
            77 => VibratoDepth,
            78 => VibratoDelay,
            79 => SoundController10,
            80 => GeneralPurpose5,
            81 => GeneralPurpose6,
            82 => GeneralPurpose7,
            83 => GeneralPurpose8,
            84 => PortamentoControl,
            88 => HighResVelocityPrefix,
            91 => ReverbSendLevel,
            92 => TremoloDepth,
            93 => ChorusSendLevel,
            94 => CelesteDepth,
            95 => PhaserDepth,
            96 => DataIncrement,
            97 => DataDecrement,
            98 => NrpnLsb,
            99 => NrpnMsb,
            100 => RpnLsb,
            101 => RpnMsb,
            120 => AllSoundOff,
            121 => ResetAllControllers,
            122 => LocalControl,
            123 => AllNotesOff,
            124 => OmniModeOff,
            125 => OmniModeOn,
            126 => MonoModeOn,
            127 => PolyModeOn,
            _ => Undefined(number),
        }
    }

    /// Whether this is a channel-mode controller (CC 120-127).
    #[inline]
    pub const fn is_channel_mode(self) -> bool {
        self.number().get() >= 120
    }
}

/// The LSB companions (CC 32-63) of the CC 0-31 continuous controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LsbController {
    /// CC 32
    BankSelect,
    /// CC 33
    ModWheel,
    /// CC 34
    Breath,
    /// CC 36
    Foot,
    /// CC 37
    PortamentoTime,
    /// CC 38
    DataEntry,
    /// CC 39
    Volume,
    /// CC 40
    Balance,
    /// CC 42
    Pan,
    /// CC 43
    Expression,
    /// CC 44
    EffectControl1,
    /// CC 45
    EffectControl2,
    /// CC 48
    GeneralPurpose1,
    /// CC 49
    GeneralPurpose2,
    /// CC 50
    GeneralPurpose3,
    /// CC 51
    GeneralPurpose4,
    /// An LSB number whose MSB companion is undefined; carries the full CC
    /// number (32-63).
    Undefined(U7),
}

impl LsbController {
    /// The wire controller number (32-63).
    pub const fn number(self) -> U7 {
        use LsbController::*;
        let n: u8 = match self {
            BankSelect => 32,
            ModWheel => 33,
            Breath => 34,
            Foot => 36,
            PortamentoTime => 37,
            DataEntry => 38,
            Volume => 39,
            Balance => 40,
            Pan => 42,
            Expression => 43,
            EffectControl1 => 44,
            EffectControl2 => 45,
            GeneralPurpose1 => 48,
            GeneralPurpose2 => 49,
            GeneralPurpose3 => 50,
            GeneralPurpose4 => 51,
            Undefined(n) => return n,
        };
        U7::new(n)
    }

    /// The named LSB controller for a wire number in 32..=63.
    pub const fn from_number(number: U7) -> Self {
        use LsbController::*;
        match number.get() {
            32 => BankSelect,
            33 => ModWheel,
            34 => Breath,
            36 => Foot,
            37 => PortamentoTime,
            38 => DataEntry,
            39 => Volume,
            40 => Balance,
            42 => Pan,
            43 => Expression,
            44 => EffectControl1,
            45 => EffectControl2,
            48 => GeneralPurpose1,
            49 => GeneralPurpose2,
            50 => GeneralPurpose3,
            51 => GeneralPurpose4,
            _ => Undefined(number),
        }
    }
}

/// MIDI 2.0 per-note controller index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PerNoteController {
    /// Registered per-note controller (UMP opcode 0x0).
    Registered(U7),
    /// Assignable per-note controller (UMP opcode 0x1).
    Assignable(U7),
}

/// Registered parameter number, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegisteredParameter {
    /// RPN 00 00
    PitchBendSensitivity,
    /// RPN 00 01
    ChannelFineTuning,
    /// RPN 00 02
    ChannelCoarseTuning,
    /// RPN 00 03
    TuningProgramChange,
    /// RPN 00 04
    TuningBankSelect,
    /// RPN 00 05
    ModulationDepthRange,
    /// RPN 00 06
    MpeConfiguration,
    /// RPN 7F 7F: deselects the current parameter.
    Null,
    /// Verbatim 14-bit parameter number.
    Raw(U14),
}

impl RegisteredParameter {
    /// The 14-bit parameter number (`(msb << 7) | lsb`).
    pub const fn number(self) -> U14 {
        use RegisteredParameter::*;
        let n: u16 = match self {
            PitchBendSensitivity => 0x0000,
            ChannelFineTuning => 0x0001,
            ChannelCoarseTuning => 0x0002,
            TuningProgramChange => 0x0003,
            TuningBankSelect => 0x0004,
            ModulationDepthRange => 0x0005,
            MpeConfiguration => 0x0006,
            Null => 0x3FFF,
            Raw(n) => return n,
        };
        U14::new(n)
    }

    /// The named parameter for a 14-bit number. Never returns
    /// [`RegisteredParameter::Raw`].
    pub const fn from_number(number: U14) -> Self {
        use RegisteredParameter::*;
        match number.get() {
            0x0000 => PitchBendSensitivity,
            0x0001 => ChannelFineTuning,
            0x0002 => ChannelCoarseTuning,
            0x0003 => TuningProgramChange,
            0x0004 => TuningBankSelect,
            0x0005 => ModulationDepthRange,
            0x0006 => MpeConfiguration,
            0x3FFF => Null,
            _ => Raw(number),
        }
    }
}

/// Whether an RPN/NRPN message carries an absolute value or a signed
/// relative adjustment (MIDI 2.0 carries this as a status bit; preserved
/// verbatim on round-trip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamChange {
    Absolute,
    Relative,
}
