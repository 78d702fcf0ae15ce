//! Multi-channel relay controller: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  EspGpio      AccessoryTable     SystemMaintenance           │
//! │  (GpioPort)   (Notifier)         (MaintenancePort)           │
//! │  ThreadSpawner  LogEventSink     InputDriver (EdgeSource)    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │           RelayController (pure logic)                 │  │
//! │  │  Dispatch · Sync · Reset FSM · Feedback · Sequencer    │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use multirelay::adapters::accessory::{accessory_name, AccessoryBridge, AccessoryTable};
use multirelay::adapters::delay::TaskDelay;
use multirelay::adapters::gpio::EspGpio;
use multirelay::adapters::log_sink::LogEventSink;
use multirelay::adapters::maintenance::SystemMaintenance;
use multirelay::adapters::spawner::ThreadSpawner;
use multirelay::app::service::{ControllerPorts, RelayController};
use multirelay::config::ControllerConfig;
use multirelay::drivers::{hw_init, input::InputDriver};

/// Input task poll period.  Well inside the debounce window.
const INPUT_POLL_MS: u32 = 10;

/// Layout baked in at build time (`MULTIRELAY_CONFIG=<json>`), if any.
fn load_config() -> ControllerConfig {
    let Some(doc) = option_env!("MULTIRELAY_CONFIG") else {
        return ControllerConfig::default();
    };
    match ControllerConfig::from_json(doc).and_then(|c| c.validate().map(|()| c)) {
        Ok(cfg) => {
            info!("Config: {} channel(s) from baked document", cfg.channels.len());
            cfg
        }
        Err(e) => {
            warn!("Config: baked document rejected ({}), using reference layout", e);
            ControllerConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  multirelay v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // NVS backs WiFi provisioning and accessory pairings; keep the
    // partition handle alive for the whole run.
    let _nvs = EspDefaultNvsPartition::take()?;

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();

    // ── 3. Adapters ───────────────────────────────────────────
    let mac = hw_init::station_mac().unwrap_or_default();
    let table = Arc::new(AccessoryTable::new(accessory_name(mac), &config));
    info!("Accessory: \"{}\" with {} switch(es)", table.name(), config.channels.len());
    let ports = ControllerPorts {
        gpio: Arc::new(EspGpio::new()),
        notifier: table.clone(),
        maintenance: Arc::new(SystemMaintenance::new()),
        spawner: Arc::new(ThreadSpawner::new(config.job_priority, config.job_stack_kb)),
        sink: Arc::new(LogEventSink::new()),
        delay: TaskDelay,
    };

    // ── 4. Controller ─────────────────────────────────────────
    let controller = Arc::new(RelayController::new(&config, ports)?);

    if let Err(e) = hw_init::install_isr_service() {
        error!("ISR service install failed: {}; inputs disabled", e);
    }
    let mut inputs = InputDriver::new(config.long_press_ms);
    let report = controller.init(&mut inputs);
    if !report.is_clean() {
        warn!(
            "{} input(s) unavailable; affected channels remain protocol-controllable",
            report.failed.len()
        );
    }

    // ── 5. Accessory protocol hookup ──────────────────────────
    let bridge = AccessoryBridge::new(Arc::clone(&controller));
    for ch in controller.registry().iter() {
        info!(
            "{}: relay={} state={:?} published={:?}",
            ch.id,
            ch.relay_pin,
            bridge.on_read(ch.id),
            table.value(ch.id)
        );
    }

    // ── 6. Input dispatch loop ────────────────────────────────
    info!("Entering input loop ({} ms poll)", INPUT_POLL_MS);
    loop {
        inputs.service(hw_init::now_ms(), |event| {
            controller.dispatch(event);
        });
        FreeRtos::delay_ms(INPUT_POLL_MS);
    }
}
