//! Core-pinned detached thread spawning.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size. On non-ESP targets, falls back to plain thread spawn.
//!
//! # ESP-IDF Threading Model
//!
//! `std::thread` is implemented on pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread, so the config→spawn pair must not be interleaved
//! with other thread creation on the same thread.

use crate::error::SpawnError;

/// CPU core identifiers for the ESP32 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): WiFi and the accessory server.
    Pro = 0,
    /// Core 1 (APP_CPU): input dispatch and feedback jobs.
    App = 1,
}

/// Spawn a detached thread pinned to `core`.  The handle is dropped:
/// the thread runs to completion on its own.
#[cfg(target_os = "espidf")]
pub fn spawn_detached(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<(), SpawnError> {
    // SAFETY: the config is copied by esp_pthread_set_cfg; thread_name
    // keeps the default static string.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = i32::from(priority);
        cfg.stack_size = (stack_kb * 1024) as _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            log::error!("spawn '{}': esp_pthread_set_cfg failed ({})", name, ret);
            return Err(SpawnError::Rejected);
        }
    }

    log::debug!(
        "spawn '{}' on {:?} (pri={}, stack={}KB)",
        name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(name.into())
        .spawn(f)
        .map(drop)
        .map_err(|e| {
            log::error!("spawn '{}': {}", name, e);
            SpawnError::Rejected
        })
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_detached(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<(), SpawnError> {
    log::debug!("spawn '{}' (sim, stack={}KB)", name, stack_kb);

    // Host threads need more room than FreeRTOS tasks for the same work.
    std::thread::Builder::new()
        .name(name.into())
        .stack_size((stack_kb * 1024).max(64 * 1024))
        .spawn(f)
        .map(drop)
        .map_err(|e| {
            log::error!("spawn '{}': {}", name, e);
            SpawnError::Rejected
        })
}
