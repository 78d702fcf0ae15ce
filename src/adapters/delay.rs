//! Blocking delay for detached jobs.
//!
//! - **`target_os = "espidf"`**: yields to the FreeRTOS scheduler via
//!   `vTaskDelay` (tick granularity), busy-waits sub-millisecond rests.
//! - **`not(target_os = "espidf")`**: `std::thread::sleep`.

use embedded_hal::delay::DelayNs;

/// Cloneable [`DelayNs`] handed to every feedback and reset job.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskDelay;

#[cfg(target_os = "espidf")]
impl DelayNs for TaskDelay {
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }
}

#[cfg(not(target_os = "espidf"))]
impl DelayNs for TaskDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
