//! Inbound input events and channel commands.
//!
//! [`InputEvent`]s arrive from the edge-detection layer; the dispatcher
//! turns them into [`ChannelCommand`]s for the synchroniser or routes
//! them to the factory-reset path.

/// Button gesture as reported by the edge-detection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    SinglePress,
    LongPress,
    /// Anything else the layer reports (raw code kept for logging).
    Unknown(u8),
}

/// One discrete event from a registered input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A maintained toggle changed position.
    Toggle { pin: u8 },
    /// A momentary button produced a gesture.
    Button { pin: u8, event: ButtonEvent },
}

/// Operation applied to one channel inside its critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCommand {
    /// Invert the current state.
    Flip,
    /// Force a state (protocol write).
    Set(bool),
}

/// Who caused a channel change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Toggle,
    Button,
    Protocol,
}
