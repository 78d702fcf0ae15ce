//! GPIO adapter. Implements [`GpioPort`] over the raw
//! [`hw_init`](crate::drivers::hw_init) calls.

use log::debug;

use crate::app::ports::{Direction, GpioPort};
use crate::drivers::hw_init;
use crate::error::GpioError;

/// Stateless: every call goes straight to the pin registers.
#[derive(Debug, Default)]
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        Self
    }
}

impl GpioPort for EspGpio {
    fn enable(&self, pin: u8, direction: Direction) -> Result<(), GpioError> {
        hw_init::configure_pin(pin, direction)?;
        debug!("gpio: pin {} enabled as {:?}", pin, direction);
        Ok(())
    }

    fn write(&self, pin: u8, high: bool) {
        hw_init::gpio_write(pin, high);
    }
}
