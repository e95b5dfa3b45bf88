//! HUI control-surface protocol.
//!
//! A bidirectional protocol layered on MIDI 1.0 channel voice and SysEx:
//! zone/port switch addressing, per-strip faders on pitch-bend, V-Pot
//! encoders with LED rings, character displays, and a one-second
//! ping/handshake. [`HuiSurfaceModel`] mirrors the surface's state and
//! diffs every applied message into a notification.
//!
//! # Example
//!
//! ```
//! use midikit_core::num::U4;
//! use midikit_hui::prelude::*;
//!
//! // Host tells strip 4 to light the center of its V-Pot ring.
//! let message = HuiMessage::VPotDisplay {
//!     vpot: VPot::Channel(U4::new(3)),
//!     display: VPotDisplay::new(VPotMode::Single(0.5), false),
//! };
//! let events = midikit_hui::encode(&message, HuiRole::Host)?;
//!
//! // The surface side decodes and applies it.
//! let mut decoder = HuiDecoder::new(HuiRole::Host);
//! let mut model = HuiSurfaceModel::new();
//! for event in &events {
//!     if let Some(decoded) = decoder.decode(event)? {
//!         assert!(model.apply(&decoded).changed);
//!     }
//! }
//! # Ok::<(), midikit_hui::HuiError>(())
//! ```

mod error;
mod message;
pub mod ping;
pub mod surface;
pub mod switch;
pub mod vpot;

pub use error::{HuiError, Result};
pub use message::{
    encode, HuiDecoder, HuiMessage, HuiRole, SmallDisplayTarget, TimeDigit,
};
pub use surface::{
    ChannelStripState, HuiNotification, HuiSurfaceModel, ParamEditNotification, StripElement,
    SurfaceSnapshotHandle, SurfaceState, UpdateResult,
};
pub use switch::HuiSwitch;
pub use vpot::{VPot, VPotDisplay, VPotMode};

/// Recommended imports.
pub mod prelude {
    pub use crate::message::{
        encode, HuiDecoder, HuiMessage, HuiRole, SmallDisplayTarget, TimeDigit,
    };
    pub use crate::ping::PingMonitor;
    pub use crate::surface::{
        HuiNotification, HuiSurfaceModel, StripElement, UpdateResult,
    };
    pub use crate::switch::HuiSwitch;
    pub use crate::vpot::{VPot, VPotDisplay, VPotMode};
}
