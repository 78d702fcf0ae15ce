//! Channel registry and pin deduplication.
//!
//! The [`Registry`] is built once from [`ControllerConfig`] and never
//! changes shape afterwards: channels are neither added nor removed at
//! runtime.  Each [`Channel`] owns a [`StateCell`], the logical on/off
//! value shared with the accessory protocol.
//!
//! [`PinBindings`] derives from the registry the minimal set of
//! `(pin, kind)` pairs that need an edge-detection callback.  Several
//! channels may listen on one physical input (e.g. a master toggle);
//! the pin is still registered exactly once and the event fans out to
//! every listener.
//!
//! ```text
//!  channels ──▶ PinBindings::resolve ──▶ [(pin 4, Toggle) → {0, 1}]
//!                                        [(pin 12, Toggle) → {2}]
//!                                        [(pin 9, Button) → {3}]
//! ```

use core::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::app::ports::EdgeSource;
use crate::config::{ControllerConfig, MAX_CHANNELS};
use crate::error::RegistrationError;

// ───────────────────────────────────────────────────────────────
// Channel identity and state
// ───────────────────────────────────────────────────────────────

/// Stable channel identifier: the channel's index in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u8);

impl ChannelId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Logical switch state for one channel.
///
/// The mutex is the per-channel critical section: whoever holds the
/// guard owns the relay line and the notification for that channel.
#[derive(Debug)]
pub struct StateCell {
    value: Mutex<bool>,
}

impl StateCell {
    pub fn new(initial: bool) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> bool {
        *self.lock()
    }

    /// Enter the channel's critical section.
    ///
    /// A poisoned lock only means another context panicked mid-update;
    /// the stored bool is still a valid state, so it is recovered.
    pub(crate) fn lock(&self) -> MutexGuard<'_, bool> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One relay channel.
#[derive(Debug)]
pub struct Channel {
    pub id: ChannelId,
    pub relay_pin: u8,
    pub toggle_pin: Option<u8>,
    pub button_pin: Option<u8>,
    pub default_on: bool,
    pub state: StateCell,
}

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

/// Fixed, ordered set of channels.
#[derive(Debug)]
pub struct Registry {
    channels: Vec<Channel>,
}

impl Registry {
    /// Build the registry from (already validated) configuration.
    /// Every cell starts at the channel's default state.
    pub fn from_config(config: &ControllerConfig) -> Self {
        let channels = config
            .channels
            .iter()
            .take(MAX_CHANNELS)
            .enumerate()
            .map(|(i, c)| Channel {
                id: ChannelId(i as u8),
                relay_pin: c.relay_pin,
                toggle_pin: c.toggle_pin,
                button_pin: c.button_pin,
                default_on: c.default_on,
                state: StateCell::new(c.default_on),
            })
            .collect();
        Self { channels }
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Pin bindings (deduplication)
// ───────────────────────────────────────────────────────────────

/// Which kind of physical input a pin carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Momentary push-button (single / long press).
    Button,
    /// Maintained toggle switch (fires once per transition).
    Toggle,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button => write!(f, "button"),
            Self::Toggle => write!(f, "toggle"),
        }
    }
}

/// One edge-detection registration and the channels listening on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinBinding {
    pub pin: u8,
    pub kind: SourceKind,
    /// Listeners in registry order; the first entry is the channel that
    /// claimed the pin.
    pub channels: heapless::Vec<ChannelId, MAX_CHANNELS>,
}

/// Deduplicated input bindings derived from a [`Registry`].
#[derive(Debug, Clone, Default)]
pub struct PinBindings {
    bindings: Vec<PinBinding>,
}

/// Outcome of [`PinBindings::register_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: Vec<(u8, SourceKind)>,
    pub failed: Vec<(u8, SourceKind, RegistrationError)>,
}

impl RegistrationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl PinBindings {
    /// Walk channels in order; the first channel to reference a
    /// `(pin, kind)` claims it, later ones attach as extra listeners.
    pub fn resolve(registry: &Registry) -> Self {
        let mut out = Self::default();
        for ch in registry.iter() {
            if let Some(pin) = ch.toggle_pin {
                out.attach(pin, SourceKind::Toggle, ch.id);
            }
            if let Some(pin) = ch.button_pin {
                out.attach(pin, SourceKind::Button, ch.id);
            }
        }
        out
    }

    fn attach(&mut self, pin: u8, kind: SourceKind, id: ChannelId) {
        match self
            .bindings
            .iter_mut()
            .find(|b| b.pin == pin && b.kind == kind)
        {
            Some(existing) => {
                debug!("bindings: {} joins {} pin {}", id, kind, pin);
                // Capacity equals MAX_CHANNELS and the registry never exceeds it.
                let _ = existing.channels.push(id);
            }
            None => {
                let mut channels = heapless::Vec::new();
                let _ = channels.push(id);
                self.bindings.push(PinBinding { pin, kind, channels });
            }
        }
    }

    /// Binding for a `(pin, kind)` pair, if any channel listens on it.
    pub fn lookup(&self, pin: u8, kind: SourceKind) -> Option<&PinBinding> {
        self.bindings.iter().find(|b| b.pin == pin && b.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Register one callback per binding with the edge source.
    ///
    /// Failures are logged and recorded, never propagated: the affected
    /// channels stay controllable through the protocol layer.
    pub fn register_all(&self, source: &mut impl EdgeSource) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        for b in &self.bindings {
            match source.register(b.pin, b.kind) {
                Ok(()) => {
                    info!(
                        "bindings: {} pin {} registered ({} listener(s))",
                        b.kind,
                        b.pin,
                        b.channels.len()
                    );
                    report.registered.push((b.pin, b.kind));
                }
                Err(e) => {
                    warn!("bindings: failed to register {} pin {}: {}", b.kind, b.pin, e);
                    report.failed.push((b.pin, b.kind, e));
                }
            }
        }
        report
    }
}
