//! Accessory-protocol bridge.
//!
//! [`AccessoryTable`] is the protocol side of every channel's boolean
//! "On" characteristic: the controller notifies it after each change,
//! and remote writes come back in through [`AccessoryBridge`], which
//! always goes through [`RelayController::set`] rather than touching
//! the cell directly.
//!
//! ```text
//!  RelayController ──notify──▶ AccessoryTable ──▶ paired controllers
//!        ▲                                             │
//!        └──────────── AccessoryBridge::on_write ◀─────┘
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::ports::CharacteristicNotifier;
use crate::app::service::RelayController;
use crate::config::ControllerConfig;
use crate::registry::ChannelId;

const NAME_PREFIX: &str = "Relay Switch";

/// Advertised accessory name, suffixed with the last three MAC bytes so
/// several boards on one network stay distinguishable.
pub fn accessory_name(mac: [u8; 6]) -> String {
    format!("{} {:02X}:{:02X}:{:02X}", NAME_PREFIX, mac[3], mac[4], mac[5])
}

/// Service name of one channel (1-based, as shown in the home app).
pub fn switch_name(id: ChannelId) -> String {
    format!("Switch[{}]", id.index() + 1)
}

// ───────────────────────────────────────────────────────────────
// Characteristic table (notification side)
// ───────────────────────────────────────────────────────────────

/// Last value published per channel.
///
/// Slots start at each channel's `default_on`, the level `init` drives
/// without notifying.
pub struct AccessoryTable {
    name: String,
    values: Vec<AtomicBool>,
    notifications: AtomicU32,
}

impl AccessoryTable {
    pub fn new(name: String, config: &ControllerConfig) -> Self {
        Self {
            name,
            values: config
                .channels
                .iter()
                .map(|ch| AtomicBool::new(ch.default_on))
                .collect(),
            notifications: AtomicU32::new(0),
        }
    }

    /// Advertised accessory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value most recently pushed to the protocol for `id`.
    pub fn value(&self, id: ChannelId) -> Option<bool> {
        self.values.get(id.index()).map(|v| v.load(Ordering::Acquire))
    }

    /// Total notifications published since boot.
    pub fn notifications(&self) -> u32 {
        self.notifications.load(Ordering::Relaxed)
    }
}

impl CharacteristicNotifier for AccessoryTable {
    fn notify(&self, channel: ChannelId, on: bool) {
        let Some(slot) = self.values.get(channel.index()) else {
            warn!("accessory: notify for unknown {}", channel);
            return;
        };
        slot.store(on, Ordering::Release);
        self.notifications.fetch_add(1, Ordering::Relaxed);
        info!("accessory: {} {} On={}", self.name, switch_name(channel), on);
    }
}

// ───────────────────────────────────────────────────────────────
// Bridge (write side)
// ───────────────────────────────────────────────────────────────

/// Entry points the protocol server calls.
pub struct AccessoryBridge<D> {
    controller: Arc<RelayController<D>>,
}

impl<D> AccessoryBridge<D>
where
    D: DelayNs + Clone + Send + 'static,
{
    pub fn new(controller: Arc<RelayController<D>>) -> Self {
        Self { controller }
    }

    /// Remote write of a channel's "On" characteristic.  Returns `false`
    /// if the channel does not exist.
    pub fn on_write(&self, id: ChannelId, on: bool) -> bool {
        info!("accessory: remote write {} On={}", switch_name(id), on);
        self.controller.set(id, on).is_some()
    }

    /// Remote read: the controller's cell is authoritative.
    pub fn on_read(&self, id: ChannelId) -> Option<bool> {
        self.controller.state(id)
    }

    /// The accessory information service's identify characteristic.
    pub fn on_identify(&self) {
        info!("accessory: identify");
        self.controller.identify();
    }
}
