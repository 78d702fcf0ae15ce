//! Factory-reset sequencer.
//!
//! Fixed, irreversible teardown run on a detached job:
//!
//! 1. acknowledge blink (3 × 200 ms)
//! 2. wipe network provisioning
//! 3. wait 1 s
//! 4. wipe accessory pairing / protocol state
//! 5. wait 1 s
//! 6. restart
//!
//! The delays give each wipe time to reach flash before the next
//! destructive step.  Nothing here can be cancelled once launched.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use log::{error, info};

use crate::app::ports::{GpioPort, MaintenancePort, TaskSpawner};
use crate::feedback::{self, LedLine, RESET_ACK_BLINKS, RESET_ACK_PERIOD_MS};

/// Pause between destructive steps.
pub const SETTLE_MS: u32 = 1000;

/// Run the sequence on the calling thread.
pub fn run_reset_sequence(
    gpio: &dyn GpioPort,
    led: LedLine,
    maintenance: &dyn MaintenancePort,
    delay: &mut impl DelayNs,
) {
    feedback::play(
        &feedback::blink_steps(RESET_ACK_PERIOD_MS, RESET_ACK_BLINKS),
        gpio,
        led,
        delay,
    );

    info!("reset: wiping network configuration");
    maintenance.reset_network_config();
    delay.delay_ms(SETTLE_MS);

    info!("reset: wiping accessory pairing");
    maintenance.reset_protocol_config();
    delay.delay_ms(SETTLE_MS);

    info!("reset: restarting");
    maintenance.restart();

    error!("reset: restart returned, terminating reset job");
}

/// Launches [`run_reset_sequence`] as a detached job.
pub struct ResetSequencer<D> {
    gpio: Arc<dyn GpioPort>,
    led: LedLine,
    maintenance: Arc<dyn MaintenancePort>,
    spawner: Arc<dyn TaskSpawner>,
    delay: D,
}

impl<D> ResetSequencer<D>
where
    D: DelayNs + Clone + Send + 'static,
{
    pub fn new(
        gpio: Arc<dyn GpioPort>,
        led: LedLine,
        maintenance: Arc<dyn MaintenancePort>,
        spawner: Arc<dyn TaskSpawner>,
        delay: D,
    ) -> Self {
        Self {
            gpio,
            led,
            maintenance,
            spawner,
            delay,
        }
    }

    /// Start the sequence without waiting for it.
    ///
    /// If the executor refuses the job the sequence runs inline instead:
    /// a confirmed reset is never silently lost.
    pub fn launch(&self) {
        info!("reset: launching factory reset");
        let gpio = Arc::clone(&self.gpio);
        let maintenance = Arc::clone(&self.maintenance);
        let led = self.led;
        let mut delay = self.delay.clone();

        let job = Box::new(move || {
            run_reset_sequence(gpio.as_ref(), led, maintenance.as_ref(), &mut delay);
        });
        if let Err(e) = self.spawner.spawn("factory-reset", job) {
            error!("reset: spawn failed ({}), running inline", e);
            let mut delay = self.delay.clone();
            run_reset_sequence(self.gpio.as_ref(), self.led, self.maintenance.as_ref(), &mut delay);
        }
    }
}
