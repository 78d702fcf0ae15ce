//! Factory-reset services: network provisioning wipe, pairing wipe,
//! restart.
//!
//! - **`target_os = "espidf"`**: `esp_wifi_restore()`, `nvs_erase_all`
//!   on the accessory pairing namespace, `esp_restart()`.
//! - **`not(target_os = "espidf")`**: logs and records each call so the
//!   reset sequence can be observed on the host.

use log::{info, warn};

use crate::app::ports::MaintenancePort;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// NVS namespace holding accessory pairings and the setup state.
pub const PAIRING_NAMESPACE: &str = "accessory";

/// One recorded maintenance action (simulation backend).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceAction {
    NetworkReset,
    ProtocolReset,
    Restart,
}

pub struct SystemMaintenance {
    #[cfg(not(target_os = "espidf"))]
    log: std::sync::Mutex<Vec<MaintenanceAction>>,
}

impl Default for SystemMaintenance {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMaintenance {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            log: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Actions performed so far, in order.
    #[cfg(not(target_os = "espidf"))]
    pub fn actions(&self) -> Vec<MaintenanceAction> {
        self.log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[cfg(not(target_os = "espidf"))]
    fn record(&self, action: MaintenanceAction) {
        self.log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(action);
    }

    /// Open `namespace` read-write, erase every key, commit.
    #[cfg(target_os = "espidf")]
    fn erase_namespace(namespace: &str) -> Result<(), i32> {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = namespace.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        // SAFETY: ns_buf is NUL-terminated and outlives the call; the
        // handle is closed on every path below.
        unsafe {
            let ret = nvs_open(ns_buf.as_ptr().cast(), nvs_open_mode_t_NVS_READWRITE, &mut handle);
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
            let mut ret = nvs_erase_all(handle);
            if ret == ESP_OK as i32 {
                ret = nvs_commit(handle);
            }
            nvs_close(handle);
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
        }
        Ok(())
    }
}

impl MaintenancePort for SystemMaintenance {
    #[cfg(target_os = "espidf")]
    fn reset_network_config(&self) {
        // SAFETY: clears the WiFi driver's stored credentials; the driver
        // was initialised by the provisioning layer at boot.
        let ret = unsafe { esp_wifi_restore() };
        if ret == ESP_OK as i32 {
            info!("maintenance: WiFi provisioning cleared");
        } else {
            warn!("maintenance: esp_wifi_restore failed (rc={})", ret);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn reset_network_config(&self) {
        info!("maintenance(sim): WiFi provisioning cleared");
        self.record(MaintenanceAction::NetworkReset);
    }

    #[cfg(target_os = "espidf")]
    fn reset_protocol_config(&self) {
        match Self::erase_namespace(PAIRING_NAMESPACE) {
            Ok(()) => info!("maintenance: pairing namespace '{}' erased", PAIRING_NAMESPACE),
            Err(rc) => warn!(
                "maintenance: erasing '{}' failed (rc={})",
                PAIRING_NAMESPACE, rc
            ),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn reset_protocol_config(&self) {
        info!("maintenance(sim): pairing namespace '{}' erased", PAIRING_NAMESPACE);
        self.record(MaintenanceAction::ProtocolReset);
    }

    #[cfg(target_os = "espidf")]
    fn restart(&self) {
        warn!("maintenance: restarting");
        // SAFETY: esp_restart never returns.
        unsafe { esp_restart() };
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&self) {
        warn!("maintenance(sim): restart requested");
        self.record(MaintenanceAction::Restart);
    }
}
