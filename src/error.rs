//! Error types for the relay controller core.
//!
//! Every subsystem error is a small `Copy` enum so it can be logged,
//! stored in a registration report, or carried through an [`AppEvent`]
//! without allocation.  None of these are fatal: the controller logs
//! them and keeps serving whatever channels remain reachable.
//!
//! [`AppEvent`]: crate::app::events::AppEvent

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Static configuration is malformed or inconsistent.
    Config(ConfigError),
    /// The edge-detection layer refused a pin.
    Registration(RegistrationError),
    /// A GPIO direction or level change failed.
    Gpio(GpioError),
    /// The task executor refused a detached job.
    Spawn(SpawnError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Registration(e) => write!(f, "registration: {e}"),
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Spawn(e) => write!(f, "spawn: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    Parse,
    /// A field failed validation.  The message names the field and rule.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config document is not valid JSON"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Edge-source registration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    /// The pin already has a callback of this kind.
    AlreadyRegistered,
    /// The edge source has no free tracker slots.
    CapacityExhausted,
    /// The driver rejected the pin (raw ESP-IDF return code).
    Driver(i32),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered => write!(f, "pin already registered"),
            Self::CapacityExhausted => write!(f, "no free input slots"),
            Self::Driver(rc) => write!(f, "driver error (rc={rc})"),
        }
    }
}

impl core::error::Error for RegistrationError {}

impl From<RegistrationError> for Error {
    fn from(e: RegistrationError) -> Self {
        Self::Registration(e)
    }
}

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// Raw ESP-IDF return code from `gpio_config` / `gpio_set_level`.
    Driver(i32),
    /// Pin number outside the chip's GPIO range.
    InvalidPin(u8),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(rc) => write!(f, "driver error (rc={rc})"),
            Self::InvalidPin(pin) => write!(f, "no such GPIO ({pin})"),
        }
    }
}

impl core::error::Error for GpioError {}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Task spawning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The executor could not create the task (out of memory, bad config).
    Rejected,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "task creation rejected"),
        }
    }
}

impl core::error::Error for SpawnError {}

impl From<SpawnError> for Error {
    fn from(e: SpawnError) -> Self {
        Self::Spawn(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
