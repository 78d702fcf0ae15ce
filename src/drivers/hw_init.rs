//! Raw GPIO access through ESP-IDF sys calls.
//!
//! Pin direction, level reads and writes, the shared GPIO ISR service,
//! and the per-pin any-edge handler that feeds
//! [`EDGE_QUEUE`](crate::drivers::input::EDGE_QUEUE).  On non-espidf
//! targets every call is a logged no-op so the controller can run on
//! the host.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::Direction;
use crate::error::{GpioError, RegistrationError};
use crate::pins;

// ── Pin configuration ─────────────────────────────────────────

/// The pin mask is `1 << pin`; anything past the chip's range would
/// overflow it or address a pad that does not exist.
fn check_pin(pin: u8, direction: Direction) -> Result<(), GpioError> {
    let max = match direction {
        Direction::Output => pins::MAX_OUTPUT_GPIO,
        Direction::Input => pins::MAX_GPIO,
    };
    if pin > max {
        return Err(GpioError::InvalidPin(pin));
    }
    Ok(())
}

/// Configure `pin` as a push-pull output or a pulled-up input.
#[cfg(target_os = "espidf")]
pub fn configure_pin(pin: u8, direction: Direction) -> Result<(), GpioError> {
    check_pin(pin, direction)?;
    let cfg = match direction {
        Direction::Output => gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        },
        Direction::Input => gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        },
    };
    // SAFETY: gpio_config copies the struct; called once per pin at init.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(GpioError::Driver(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_pin(pin: u8, direction: Direction) -> Result<(), GpioError> {
    check_pin(pin, direction)?;
    log::debug!("hw_init(sim): pin {} -> {:?}", pin, direction);
    Ok(())
}

// ── Levels ────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: u8) -> bool {
    // SAFETY: read-only register access on a configured pin.
    (unsafe { gpio_get_level(i32::from(pin)) }) != 0
}

/// Simulation: every input reads HIGH (pulled up, not pressed).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: u8) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: u8, high: bool) {
    // SAFETY: gpio_set_level is a single register write; each relay pin
    // is only written under its channel lock.
    unsafe {
        gpio_set_level(i32::from(pin), u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: u8, high: bool) {
    log::trace!("hw_init(sim): pin {} <- {}", pin, u8::from(high));
}

// ── Clock ─────────────────────────────────────────────────────

/// Milliseconds since boot, truncated to u32 (wraps after ~49 days;
/// all consumers compare with `wrapping_sub`).
#[cfg(target_os = "espidf")]
pub fn now_ms() -> u32 {
    // SAFETY: esp_timer_get_time reads the RTC counter; ISR-safe.
    (unsafe { esp_timer_get_time() } / 1_000) as u32
}

#[cfg(not(target_os = "espidf"))]
pub fn now_ms() -> u32 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u32
}

// ── Chip identity ─────────────────────────────────────────────

/// Factory WiFi station MAC.  Readable before the radio is started.
#[cfg(target_os = "espidf")]
pub fn station_mac() -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    // SAFETY: esp_read_mac writes exactly six bytes into `mac`.
    let ret = unsafe { esp_read_mac(mac.as_mut_ptr(), esp_mac_type_t_ESP_MAC_WIFI_STA) };
    if ret != ESP_OK as i32 {
        log::warn!("hw_init: esp_read_mac failed ({})", ret);
        return None;
    }
    Some(mac)
}

/// Simulation: a fixed locally administered address.
#[cfg(not(target_os = "espidf"))]
pub fn station_mac() -> Option<[u8; 6]> {
    Some([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])
}

// ── GPIO ISR service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn edge_isr(arg: *mut core::ffi::c_void) {
    let pin = arg as usize as u8;
    // SAFETY: register read and RTC counter read; both ISR-safe.
    let level = unsafe { gpio_get_level(i32::from(pin)) } != 0;
    let at_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    crate::drivers::input::push_raw_edge(crate::drivers::input::RawEdge { pin, level, at_ms });
}

/// Install the per-pin GPIO ISR service.  Safe to call repeatedly.
#[cfg(target_os = "espidf")]
pub fn install_isr_service() -> Result<(), RegistrationError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already
    // installed, which is fine.
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
        return Err(RegistrationError::Driver(ret));
    }
    info!("hw_init: GPIO ISR service ready");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn install_isr_service() -> Result<(), RegistrationError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

/// Route any-edge interrupts on `pin` into the edge queue.
#[cfg(target_os = "espidf")]
pub fn attach_edge_isr(pin: u8) -> Result<(), RegistrationError> {
    let gpio = i32::from(pin);
    // SAFETY: the handler is a static fn that only pushes to the edge
    // queue; the pin number travels in the arg pointer, no memory behind it.
    unsafe {
        let ret = gpio_set_intr_type(gpio, gpio_int_type_t_GPIO_INTR_ANYEDGE);
        if ret != ESP_OK as i32 {
            return Err(RegistrationError::Driver(ret));
        }
        let ret = gpio_isr_handler_add(gpio, Some(edge_isr), usize::from(pin) as *mut core::ffi::c_void);
        if ret != ESP_OK as i32 {
            return Err(RegistrationError::Driver(ret));
        }
        let ret = gpio_intr_enable(gpio);
        if ret != ESP_OK as i32 {
            return Err(RegistrationError::Driver(ret));
        }
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn attach_edge_isr(pin: u8) -> Result<(), RegistrationError> {
    log::debug!("hw_init(sim): edge ISR on pin {}", pin);
    Ok(())
}
