//! LED feedback patterns and the detached job that plays them.
//!
//! A pattern is first rendered into a flat list of [`LedStep`]s (pure,
//! host-testable), then played on a detached job so the caller never
//! waits on the indicator.
//!
//! ## Command encoding
//!
//! | Command | Pattern                                                   |
//! |---------|-----------------------------------------------------------|
//! | `0`     | Identify: 3 × (2 blinks at 400 ms period, 500 ms pause), off |
//! | `c > 0` | `c >> 1` blinks at 2000 ms period, then settle at `c & 1` |

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::app::ports::{GpioPort, TaskSpawner};
use crate::config::Polarity;

const IDENTIFY_ROUNDS: u8 = 3;
const IDENTIFY_BLINKS: u8 = 2;
const IDENTIFY_PERIOD_MS: u32 = 400;
const IDENTIFY_PAUSE_MS: u32 = 500;

const COUNT_PERIOD_MS: u32 = 2000;

/// Acknowledge blink played before a factory reset.
pub const RESET_ACK_PERIOD_MS: u32 = 200;
pub const RESET_ACK_BLINKS: u8 = 3;

/// The status LED line and its polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedLine {
    pub pin: u8,
    pub polarity: Polarity,
}

impl LedLine {
    pub fn set(&self, gpio: &dyn GpioPort, on: bool) {
        gpio.write(self.pin, self.polarity.level(on));
    }
}

/// What the LED should tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackPattern {
    /// "I am this device" heartbeat, ends dark.
    Identify,
    /// Count out `count` slow blinks, then leave the LED at `settle_on`.
    Blink { count: u8, settle_on: bool },
}

impl FeedbackPattern {
    /// Decode a packed command.  `0` is always [`Identify`](Self::Identify).
    pub const fn from_command(cmd: u32) -> Self {
        if cmd == 0 {
            return Self::Identify;
        }
        let count = cmd >> 1;
        Self::Blink {
            count: if count > u8::MAX as u32 { u8::MAX } else { count as u8 },
            settle_on: cmd & 1 == 1,
        }
    }

    /// Pack into the command form accepted by [`from_command`](Self::from_command).
    pub const fn command(self) -> u32 {
        match self {
            Self::Identify => 0,
            Self::Blink { count, settle_on } => ((count as u32) << 1) | settle_on as u32,
        }
    }
}

/// One primitive LED action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedStep {
    Set(bool),
    Wait(u32),
}

/// `times` full on/off cycles, each lasting `period_ms`.
pub fn blink_steps(period_ms: u32, times: u8) -> Vec<LedStep> {
    let half = period_ms / 2;
    let mut steps = Vec::with_capacity(times as usize * 4);
    for _ in 0..times {
        steps.extend_from_slice(&[
            LedStep::Set(true),
            LedStep::Wait(half),
            LedStep::Set(false),
            LedStep::Wait(half),
        ]);
    }
    steps
}

/// Expand a pattern into primitive steps.
pub fn render(pattern: FeedbackPattern) -> Vec<LedStep> {
    match pattern {
        FeedbackPattern::Identify => {
            let mut steps = Vec::new();
            for _ in 0..IDENTIFY_ROUNDS {
                steps.extend(blink_steps(IDENTIFY_PERIOD_MS, IDENTIFY_BLINKS));
                steps.push(LedStep::Wait(IDENTIFY_PAUSE_MS));
            }
            steps.push(LedStep::Set(false));
            steps
        }
        FeedbackPattern::Blink { count, settle_on } => {
            let mut steps = blink_steps(COUNT_PERIOD_MS, count);
            steps.push(LedStep::Set(settle_on));
            steps
        }
    }
}

/// Execute steps on the calling thread.
pub fn play(steps: &[LedStep], gpio: &dyn GpioPort, led: LedLine, delay: &mut impl DelayNs) {
    for step in steps {
        match *step {
            LedStep::Set(on) => led.set(gpio, on),
            LedStep::Wait(ms) => delay.delay_ms(ms),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Scheduler
// ───────────────────────────────────────────────────────────────

/// Submits feedback patterns as detached jobs.
///
/// Jobs are not cancellable and are never awaited; two overlapping jobs
/// simply interleave on the LED.
pub struct FeedbackScheduler<D> {
    gpio: Arc<dyn GpioPort>,
    led: LedLine,
    spawner: Arc<dyn TaskSpawner>,
    delay: D,
}

impl<D> FeedbackScheduler<D>
where
    D: DelayNs + Clone + Send + 'static,
{
    pub fn new(gpio: Arc<dyn GpioPort>, led: LedLine, spawner: Arc<dyn TaskSpawner>, delay: D) -> Self {
        Self {
            gpio,
            led,
            spawner,
            delay,
        }
    }

    /// Spawn a job that plays `pattern`.  Returns `false` if the executor
    /// refused the job; the pattern is then dropped.
    pub fn schedule(&self, pattern: FeedbackPattern) -> bool {
        let steps = render(pattern);
        let gpio = Arc::clone(&self.gpio);
        let led = self.led;
        let mut delay = self.delay.clone();

        debug!("feedback: scheduling {:?} (cmd={})", pattern, pattern.command());
        let job = Box::new(move || play(&steps, gpio.as_ref(), led, &mut delay));
        match self.spawner.spawn("led-feedback", job) {
            Ok(()) => true,
            Err(e) => {
                warn!("feedback: {:?} dropped: {}", pattern, e);
                false
            }
        }
    }
}
