//! GPIO assignments for the reference 4-channel relay board.
//!
//! Single source of truth for [`ControllerConfig::default`](crate::config::ControllerConfig).
//! Deployments with a different layout supply their own channel list
//! instead of editing drivers.

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Highest GPIO number the ESP32 exposes.
pub const MAX_GPIO: u8 = 39;

/// Highest output-capable GPIO; 34..=39 are input-only.
pub const MAX_OUTPUT_GPIO: u8 = 33;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Status LED (active LOW). Kept off the relay lines so feedback blinks
/// never chatter a relay coil.
pub const LED_GPIO: u8 = 25;

// ---------------------------------------------------------------------------
// Configuration button
// ---------------------------------------------------------------------------

/// Dedicated momentary button: repeated long presses trigger factory reset.
pub const CONFIG_BUTTON_GPIO: u8 = 14;

// ---------------------------------------------------------------------------
// Relay channels
// ---------------------------------------------------------------------------

/// Relay coil drivers, one per channel, in channel order.
pub const RELAY_GPIOS: [u8; 4] = [0, 2, 15, 16];

/// Maintained toggle switches, one per channel, in channel order.
pub const TOGGLE_GPIOS: [u8; 4] = [4, 5, 12, 13];
