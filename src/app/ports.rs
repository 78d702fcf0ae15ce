//! Port traits: the hexagonal boundary between the controller core and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RelayController (domain)
//! ```
//!
//! Unlike a single-loop firmware, the controller is driven from several
//! execution contexts at once (input dispatch task, accessory server,
//! detached feedback jobs).  Ports it keeps are therefore shared
//! (`&self`, `Send + Sync`) and held behind `Arc`.

use crate::error::{GpioError, RegistrationError, SpawnError};
use crate::registry::{ChannelId, SourceKind};

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → pins)
// ───────────────────────────────────────────────────────────────

/// Pin direction requested at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Raw pin access.  Levels are electrical (`true` = HIGH); polarity is
/// applied by the caller.
pub trait GpioPort: Send + Sync {
    /// Configure a pin's direction.  Called once per pin at startup.
    fn enable(&self, pin: u8, direction: Direction) -> Result<(), GpioError>;

    /// Drive an output pin.
    fn write(&self, pin: u8, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Edge source (driven adapter: domain → debounce layer)
// ───────────────────────────────────────────────────────────────

/// The edge-detection / debounce layer.
///
/// The controller registers at most one callback per `(pin, kind)`;
/// the source later reports discrete events for that pin.
pub trait EdgeSource {
    fn register(&mut self, pin: u8, kind: SourceKind) -> Result<(), RegistrationError>;
}

// ───────────────────────────────────────────────────────────────
// Accessory protocol (driven adapter: domain → protocol server)
// ───────────────────────────────────────────────────────────────

/// Notification side of a channel's boolean characteristic.
///
/// Called while the channel's critical section is held: implementations
/// must not call back into the controller synchronously.
pub trait CharacteristicNotifier: Send + Sync {
    fn notify(&self, channel: ChannelId, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Maintenance services (driven adapter: domain → provisioning / SoC)
// ───────────────────────────────────────────────────────────────

/// Destructive services used only by the reset sequence.
pub trait MaintenancePort: Send + Sync {
    /// Forget network provisioning (SSID / password).
    fn reset_network_config(&self);

    /// Forget accessory pairings and protocol state.
    fn reset_protocol_config(&self);

    /// Restart the device.  Not expected to return.
    fn restart(&self);
}

// ───────────────────────────────────────────────────────────────
// Task executor (driven adapter: domain → scheduler)
// ───────────────────────────────────────────────────────────────

/// A detached unit of work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fire-and-forget job submission.
///
/// Submitted jobs run to completion on their own.  There is no handle:
/// callers can neither await nor cancel them.
pub trait TaskSpawner: Send + Sync {
    fn spawn(&self, name: &'static str, job: Job) -> Result<(), SpawnError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &super::events::AppEvent);
}
