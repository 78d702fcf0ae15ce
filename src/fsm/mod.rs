//! Factory-reset confirmation state machine.
//!
//! Counts consecutive long presses on the configuration button.  Any
//! short press starts over; reaching the threshold fires the reset
//! sequence once and returns to `Idle`.
//!
//! ```text
//!            long (n < threshold)
//!           ┌──────────┐
//!           ▼          │
//!  IDLE ──[long]──▶ COUNTING(n) ──[long, n+1 == threshold]──▶ fire ─▶ IDLE
//!   ▲                  │
//!   └─────[short]──────┘
//! ```
//!
//! The machine is pure: it reports what happened via [`ResetStep`] and
//! the caller schedules feedback and launches the sequencer.

use log::info;

use crate::app::commands::ButtonEvent;

/// Observable state of the confirmation machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    Idle,
    /// `n` consecutive long presses seen so far (always ≥ 1).
    Counting(u8),
}

/// Result of feeding one button event to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    /// A pending count was cleared by a short press.
    Disarmed,
    /// Short press with nothing pending.
    Ignored,
    /// Long press counted; threshold not yet reached.
    Armed { presses: u8 },
    /// Threshold reached on this press.  The counter is already back at 0.
    Confirmed { presses: u8 },
    /// Event kind this machine does not handle.
    Unknown(u8),
}

#[derive(Debug, Clone)]
pub struct ResetConfirmation {
    presses: u8,
    threshold: u8,
}

impl ResetConfirmation {
    /// `threshold` is clamped to at least 1.
    pub fn new(threshold: u8) -> Self {
        Self {
            presses: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn on_button(&mut self, event: ButtonEvent) -> ResetStep {
        match event {
            ButtonEvent::SinglePress => {
                if self.presses == 0 {
                    return ResetStep::Ignored;
                }
                info!("reset: short press, count {} cleared", self.presses);
                self.presses = 0;
                ResetStep::Disarmed
            }
            ButtonEvent::LongPress => {
                self.presses = self.presses.saturating_add(1);
                let presses = self.presses;
                if presses >= self.threshold {
                    info!("reset: long press {}/{}, confirmed", presses, self.threshold);
                    self.presses = 0;
                    ResetStep::Confirmed { presses }
                } else {
                    info!("reset: long press {}/{}", presses, self.threshold);
                    ResetStep::Armed { presses }
                }
            }
            ButtonEvent::Unknown(code) => ResetStep::Unknown(code),
        }
    }

    pub fn state(&self) -> ResetState {
        match self.presses {
            0 => ResetState::Idle,
            n => ResetState::Counting(n),
        }
    }

    pub fn presses(&self) -> u8 {
        self.presses
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}
