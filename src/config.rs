//! Controller configuration.
//!
//! Describes the channel layout, output polarities, and the factory-reset
//! policy.  The configuration is static for the lifetime of the process:
//! it is either the built-in reference layout ([`ControllerConfig::default`])
//! or a JSON document baked into the image ([`ControllerConfig::from_json`]).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins;

/// Upper bound on channels per controller.  Sizes the fixed-capacity
/// listener lists in [`PinBinding`](crate::registry::PinBinding).
pub const MAX_CHANNELS: usize = 16;

/// Settle time applied by the on-target edge driver.
pub const DEBOUNCE_MS: u32 = 50;

/// How a logical "on" maps onto the electrical level of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Driving the line HIGH energises the load.
    ActiveHigh,
    /// Driving the line LOW energises the load (typical for relay boards
    /// with PNP drivers and for LEDs wired to VCC).
    ActiveLow,
}

impl Polarity {
    /// Electrical level (true = HIGH) that represents logical `on`.
    pub const fn level(self, on: bool) -> bool {
        match self {
            Self::ActiveHigh => on,
            Self::ActiveLow => !on,
        }
    }
}

/// One relay channel as described in static configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Output driving the relay coil.
    pub relay_pin: u8,
    /// Maintained toggle switch input, if fitted.
    #[serde(default)]
    pub toggle_pin: Option<u8>,
    /// Momentary push-button input, if fitted.
    #[serde(default)]
    pub button_pin: Option<u8>,
    /// Logical state applied at boot.
    #[serde(default)]
    pub default_on: bool,
}

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Channels ---
    /// Ordered channel descriptors; index = channel id.
    pub channels: Vec<ChannelConfig>,
    /// Polarity applied uniformly to every relay write.
    pub relay_polarity: Polarity,

    // --- Status LED ---
    pub led_pin: u8,
    pub led_polarity: Polarity,

    // --- Factory reset ---
    /// Dedicated configuration button.
    pub config_button_pin: u8,
    /// Consecutive long presses required to wipe and restart.
    pub reset_long_presses: u8,
    /// Hold time (ms) after which a press is reported as a long press.
    pub long_press_ms: u32,

    // --- Protocol ---
    /// Re-notify the protocol layer after it wrote a channel itself.
    pub echo_protocol_writes: bool,

    // --- Detached jobs ---
    /// Stack for feedback / reset jobs (KiB).
    pub job_stack_kb: usize,
    /// Scheduler priority for feedback / reset jobs.
    pub job_priority: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let channels = pins::RELAY_GPIOS
            .iter()
            .zip(pins::TOGGLE_GPIOS.iter())
            .map(|(&relay_pin, &toggle_pin)| ChannelConfig {
                relay_pin,
                toggle_pin: Some(toggle_pin),
                button_pin: None,
                default_on: false,
            })
            .collect();

        Self {
            channels,
            relay_polarity: Polarity::ActiveLow,

            led_pin: pins::LED_GPIO,
            led_polarity: Polarity::ActiveLow,

            config_button_pin: pins::CONFIG_BUTTON_GPIO,
            reset_long_presses: 2,
            long_press_ms: 3000,

            echo_protocol_writes: true,

            job_stack_kb: 4,
            job_priority: 2,
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON configuration document.  Does not validate.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(doc).map_err(|e| {
            log::warn!("config: parse error at line {}: {}", e.line(), e);
            ConfigError::Parse
        })
    }

    /// Check structural invariants before the registry is built.
    ///
    /// Rejected layouts are ones where two subsystems would fight over a
    /// line: a relay that doubles as an input, a pin registered as both a
    /// button and a toggle, or a channel input on the configuration
    /// button (which the dispatcher always routes to the reset path).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::ValidationFailed("channels: at least one required"));
        }
        if self.channels.len() > MAX_CHANNELS {
            return Err(ConfigError::ValidationFailed("channels: more than MAX_CHANNELS"));
        }
        if self.reset_long_presses == 0 {
            return Err(ConfigError::ValidationFailed("reset_long_presses: must be >= 1"));
        }
        if self.long_press_ms <= DEBOUNCE_MS {
            return Err(ConfigError::ValidationFailed(
                "long_press_ms: must exceed the debounce window",
            ));
        }
        if self.job_stack_kb == 0 {
            return Err(ConfigError::ValidationFailed("job_stack_kb: must be > 0"));
        }
        if self.led_pin > pins::MAX_OUTPUT_GPIO {
            return Err(ConfigError::ValidationFailed("led_pin: pin out of range"));
        }
        if self.config_button_pin > pins::MAX_GPIO {
            return Err(ConfigError::ValidationFailed("config_button_pin: pin out of range"));
        }
        if self.led_pin == self.config_button_pin {
            return Err(ConfigError::ValidationFailed("led_pin: collides with config button"));
        }

        for (i, ch) in self.channels.iter().enumerate() {
            if ch.relay_pin > pins::MAX_OUTPUT_GPIO {
                return Err(ConfigError::ValidationFailed("relay_pin: pin out of range"));
            }
            if ch.toggle_pin.is_some_and(|p| p > pins::MAX_GPIO) {
                return Err(ConfigError::ValidationFailed("toggle_pin: pin out of range"));
            }
            if ch.button_pin.is_some_and(|p| p > pins::MAX_GPIO) {
                return Err(ConfigError::ValidationFailed("button_pin: pin out of range"));
            }
            if self.channels[..i].iter().any(|o| o.relay_pin == ch.relay_pin) {
                return Err(ConfigError::ValidationFailed("relay_pin: duplicated"));
            }
            if ch.relay_pin == self.led_pin || ch.relay_pin == self.config_button_pin {
                return Err(ConfigError::ValidationFailed(
                    "relay_pin: collides with LED or config button",
                ));
            }
            for input in [ch.toggle_pin, ch.button_pin].into_iter().flatten() {
                if input == self.config_button_pin {
                    return Err(ConfigError::ValidationFailed(
                        "channel input: collides with config button",
                    ));
                }
                if input == self.led_pin {
                    return Err(ConfigError::ValidationFailed("channel input: collides with LED"));
                }
                if self.channels.iter().any(|o| o.relay_pin == input) {
                    return Err(ConfigError::ValidationFailed(
                        "channel input: collides with a relay pin",
                    ));
                }
            }

            // A pin may be shared between channels (including this one), but
            // only with one kind.
            if let Some(toggle) = ch.toggle_pin {
                if self.channels.iter().any(|o| o.button_pin == Some(toggle)) {
                    return Err(ConfigError::ValidationFailed(
                        "toggle_pin: bound as a button elsewhere",
                    ));
                }
            }
        }

        Ok(())
    }
}
