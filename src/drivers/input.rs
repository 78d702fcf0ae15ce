//! Edge-detection and debounce driver for toggle and button inputs.
//!
//! ## Hardware
//!
//! Every registered input has an any-edge GPIO interrupt.  The ISR only
//! timestamps the edge and pushes a [`RawEdge`] into [`EDGE_QUEUE`]; the
//! input task drains the queue and runs one [`Tracker`] per pin.
//!
//! ```text
//! ┌──────────┐ RawEdge ┌────────────┐ drain ┌─────────────┐ InputEvent
//! │ GPIO ISR │───────▶│ EDGE_QUEUE │──────▶│ InputDriver │──────────▶ controller
//! └──────────┘         └────────────┘       └─────────────┘
//! ```
//!
//! ## Classification
//!
//! | Kind   | Condition                                  | Event                 |
//! |--------|--------------------------------------------|-----------------------|
//! | Toggle | level stable for 50 ms at a new value      | `Toggle`              |
//! | Button | pressed, released before `long_press_ms`   | `SinglePress`         |
//! | Button | held for `long_press_ms`                   | `LongPress` (on hold) |
//!
//! Buttons are active-low with pull-up.  A long press fires while the
//! button is still held and the later release is swallowed.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};

use crate::app::commands::{ButtonEvent, InputEvent};
use crate::app::ports::EdgeSource;
use crate::config::{DEBOUNCE_MS, MAX_CHANNELS};
use crate::drivers::hw_init;
use crate::error::RegistrationError;
use crate::registry::SourceKind;

/// Toggle + button per channel, plus the configuration button.
pub const MAX_INPUTS: usize = MAX_CHANNELS * 2 + 1;

const EDGE_QUEUE_DEPTH: usize = 32;

/// One electrical transition as seen by the ISR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEdge {
    pub pin: u8,
    /// Level after the transition (`true` = HIGH).
    pub level: bool,
    /// Milliseconds since boot, truncated to u32.
    pub at_ms: u32,
}

/// ISR → input task queue.
pub static EDGE_QUEUE: Channel<CriticalSectionRawMutex, RawEdge, EDGE_QUEUE_DEPTH> = Channel::new();

/// Push an edge from interrupt context.
/// Returns `false` if the queue is full (edge dropped).
pub fn push_raw_edge(edge: RawEdge) -> bool {
    EDGE_QUEUE.try_send(edge).is_ok()
}

// ───────────────────────────────────────────────────────────────
// Per-pin tracker
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Tracker {
    pin: u8,
    kind: SourceKind,
    /// Debounced level.
    stable: bool,
    /// Candidate level and when it was first seen.
    pending: Option<(bool, u32)>,
    /// Button only: when the current press settled.
    pressed_since: Option<u32>,
    long_fired: bool,
}

impl Tracker {
    fn new(pin: u8, kind: SourceKind, level: bool) -> Self {
        Self {
            pin,
            kind,
            stable: level,
            pending: None,
            pressed_since: None,
            long_fired: false,
        }
    }

    fn on_edge(&mut self, edge: RawEdge, long_press_ms: u32, out: &mut impl FnMut(InputEvent)) {
        // A candidate that already held for the debounce window before
        // this edge is real; commit it first.
        self.settle(edge.at_ms, long_press_ms, out);
        self.pending = if edge.level == self.stable {
            None
        } else {
            Some((edge.level, edge.at_ms))
        };
    }

    fn settle(&mut self, now_ms: u32, long_press_ms: u32, out: &mut impl FnMut(InputEvent)) {
        if let Some((level, since)) = self.pending {
            if now_ms.wrapping_sub(since) >= DEBOUNCE_MS {
                self.pending = None;
                self.commit(level, since, long_press_ms, out);
            }
        }

        if let Some(down) = self.pressed_since {
            if !self.long_fired && now_ms.wrapping_sub(down) >= long_press_ms {
                self.long_fired = true;
                out(self.button(ButtonEvent::LongPress));
            }
        }
    }

    fn commit(&mut self, level: bool, at_ms: u32, long_press_ms: u32, out: &mut impl FnMut(InputEvent)) {
        self.stable = level;
        match self.kind {
            SourceKind::Toggle => out(InputEvent::Toggle { pin: self.pin }),
            SourceKind::Button if !level => {
                self.pressed_since = Some(at_ms);
                self.long_fired = false;
            }
            SourceKind::Button => {
                if let Some(down) = self.pressed_since.take() {
                    if !self.long_fired {
                        let event = if at_ms.wrapping_sub(down) >= long_press_ms {
                            ButtonEvent::LongPress
                        } else {
                            ButtonEvent::SinglePress
                        };
                        out(self.button(event));
                    }
                }
                self.long_fired = false;
            }
        }
    }

    fn button(&self, event: ButtonEvent) -> InputEvent {
        InputEvent::Button { pin: self.pin, event }
    }
}

// ───────────────────────────────────────────────────────────────
// InputDriver
// ───────────────────────────────────────────────────────────────

pub struct InputDriver {
    trackers: heapless::Vec<Tracker, MAX_INPUTS>,
    long_press_ms: u32,
}

impl InputDriver {
    pub fn new(long_press_ms: u32) -> Self {
        Self {
            trackers: heapless::Vec::new(),
            long_press_ms,
        }
    }

    /// Number of registered inputs.
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Feed one raw edge.  Edges on unregistered pins are ignored.
    pub fn handle_edge(&mut self, edge: RawEdge, mut out: impl FnMut(InputEvent)) {
        let long_press_ms = self.long_press_ms;
        match self.trackers.iter_mut().find(|t| t.pin == edge.pin) {
            Some(t) => t.on_edge(edge, long_press_ms, &mut out),
            None => debug!("input: edge on unregistered pin {}", edge.pin),
        }
    }

    /// Advance time: commit settled levels and fire held long presses.
    pub fn tick(&mut self, now_ms: u32, mut out: impl FnMut(InputEvent)) {
        let long_press_ms = self.long_press_ms;
        for t in &mut self.trackers {
            t.settle(now_ms, long_press_ms, &mut out);
        }
    }

    /// Drain [`EDGE_QUEUE`] then [`tick`](Self::tick).  Called from the
    /// input task loop.
    pub fn service(&mut self, now_ms: u32, mut out: impl FnMut(InputEvent)) {
        while let Ok(edge) = EDGE_QUEUE.try_receive() {
            self.handle_edge(edge, &mut out);
        }
        self.tick(now_ms, &mut out);
    }
}

impl EdgeSource for InputDriver {
    fn register(&mut self, pin: u8, kind: SourceKind) -> Result<(), RegistrationError> {
        if self.trackers.iter().any(|t| t.pin == pin) {
            return Err(RegistrationError::AlreadyRegistered);
        }
        if self.trackers.is_full() {
            return Err(RegistrationError::CapacityExhausted);
        }
        hw_init::attach_edge_isr(pin)?;

        let level = hw_init::gpio_read(pin);
        self.trackers
            .push(Tracker::new(pin, kind, level))
            .map_err(|_| RegistrationError::CapacityExhausted)?;
        info!("input: {} on pin {} (level={})", kind, pin, u8::from(level));
        if matches!(kind, SourceKind::Button) && !level {
            warn!("input: button pin {} reads pressed at registration", pin);
        }
        Ok(())
    }
}
