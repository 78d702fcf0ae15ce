//! Outbound application events.
//!
//! The [`RelayController`](super::service::RelayController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them (serial log, telemetry).

use super::commands::ChangeSource;
use crate::error::RegistrationError;
use crate::registry::{ChannelId, SourceKind};

/// Why an input event was dropped without a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No channel listens on the pin (configuration / dispatch bug).
    NoBinding,
    /// The edge layer reported an event kind the controller ignores.
    UnknownEvent(u8),
}

/// Structured events emitted by the controller core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Startup finished; carries channel count and failed registrations.
    Started { channels: usize, failed_inputs: usize },

    /// A channel's relay and characteristic now read `on`.
    ChannelChanged {
        channel: ChannelId,
        on: bool,
        source: ChangeSource,
    },

    /// A long press on the config button was counted.
    ResetArmed { presses: u8, threshold: u8 },

    /// A short press cleared a pending reset count.
    ResetDisarmed,

    /// Threshold reached: the wipe-and-restart sequence was launched.
    FactoryResetStarted,

    /// The protocol asked the device to identify itself.
    Identify,

    /// An input event was ignored.
    InputDropped {
        pin: u8,
        kind: SourceKind,
        reason: DropReason,
    },

    /// The edge layer refused a pin at startup.
    RegistrationFailed {
        pin: u8,
        kind: SourceKind,
        error: RegistrationError,
    },
}
