//! Relay controller: the hexagonal core.
//!
//! [`RelayController`] owns the channel registry, the deduplicated pin
//! bindings, and the reset confirmation machine.  It is shared (`Arc`)
//! between the input dispatch task and the accessory server's write path,
//! so every operation takes `&self`.
//!
//! ```text
//!  EdgeSource ──▶ ┌───────────────────────────┐ ──▶ GpioPort (relays)
//!                 │      RelayController      │ ──▶ CharacteristicNotifier
//!  protocol set ─▶│ Dispatch · Sync · ResetFSM│ ──▶ FeedbackScheduler (job)
//!                 └───────────────────────────┘ ──▶ ResetSequencer (job)
//! ```
//!
//! ## Critical section
//!
//! A channel's read-modify-write-notify sequence runs while holding that
//! channel's [`StateCell`](crate::registry::StateCell) lock.  A toggle
//! edge and a protocol write racing on the same channel are serialised;
//! different channels never contend.

use std::sync::{Arc, Mutex, PoisonError};

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{ControllerConfig, Polarity};
use crate::error::Result;
use crate::feedback::{FeedbackPattern, FeedbackScheduler, LedLine};
use crate::fsm::{ResetConfirmation, ResetStep};
use crate::registry::{Channel, ChannelId, PinBindings, Registry, RegistrationReport, SourceKind};
use crate::reset::ResetSequencer;

use super::commands::{ButtonEvent, ChangeSource, ChannelCommand, InputEvent};
use super::events::{AppEvent, DropReason};
use super::ports::{
    CharacteristicNotifier, Direction, EdgeSource, EventSink, GpioPort, MaintenancePort,
    TaskSpawner,
};

// ───────────────────────────────────────────────────────────────
// Ports bundle
// ───────────────────────────────────────────────────────────────

/// Adapters the controller keeps for its whole lifetime.
pub struct ControllerPorts<D> {
    pub gpio: Arc<dyn GpioPort>,
    pub notifier: Arc<dyn CharacteristicNotifier>,
    pub maintenance: Arc<dyn MaintenancePort>,
    pub spawner: Arc<dyn TaskSpawner>,
    pub sink: Arc<dyn EventSink>,
    /// Cloned into every detached job.
    pub delay: D,
}

/// What the dispatcher did with an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// This many channels were flipped.
    Switched(usize),
    /// The event went to the factory-reset machine.
    ResetPath(ResetStep),
    /// Nothing changed.
    Dropped(DropReason),
}

// ───────────────────────────────────────────────────────────────
// RelayController
// ───────────────────────────────────────────────────────────────

pub struct RelayController<D> {
    registry: Registry,
    bindings: PinBindings,
    relay_polarity: Polarity,
    led: LedLine,
    config_button_pin: u8,
    echo_protocol_writes: bool,
    reset: Mutex<ResetConfirmation>,
    gpio: Arc<dyn GpioPort>,
    notifier: Arc<dyn CharacteristicNotifier>,
    sink: Arc<dyn EventSink>,
    feedback: FeedbackScheduler<D>,
    sequencer: ResetSequencer<D>,
}

impl<D> RelayController<D>
where
    D: DelayNs + Clone + Send + 'static,
{
    /// Validate `config` and build the registry and bindings.
    ///
    /// Does **not** touch hardware; call [`init`](Self::init) next.
    pub fn new(config: &ControllerConfig, ports: ControllerPorts<D>) -> Result<Self> {
        config.validate()?;

        let registry = Registry::from_config(config);
        let bindings = PinBindings::resolve(&registry);
        let led = LedLine {
            pin: config.led_pin,
            polarity: config.led_polarity,
        };

        let feedback = FeedbackScheduler::new(
            Arc::clone(&ports.gpio),
            led,
            Arc::clone(&ports.spawner),
            ports.delay.clone(),
        );
        let sequencer = ResetSequencer::new(
            Arc::clone(&ports.gpio),
            led,
            ports.maintenance,
            ports.spawner,
            ports.delay,
        );

        info!(
            "controller: {} channel(s), {} input binding(s), relays {:?}",
            registry.len(),
            bindings.len(),
            config.relay_polarity
        );

        Ok(Self {
            registry,
            bindings,
            relay_polarity: config.relay_polarity,
            led,
            config_button_pin: config.config_button_pin,
            echo_protocol_writes: config.echo_protocol_writes,
            reset: Mutex::new(ResetConfirmation::new(config.reset_long_presses)),
            gpio: ports.gpio,
            notifier: ports.notifier,
            sink: ports.sink,
            feedback,
            sequencer,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Configure pins, drive relays to their default state, and register
    /// inputs with the edge source.
    ///
    /// GPIO and registration failures are logged and reported but never
    /// abort startup: an unreachable input leaves its channel
    /// controllable through the protocol.
    pub fn init(&self, edges: &mut impl EdgeSource) -> RegistrationReport {
        if let Err(e) = self.gpio.enable(self.led.pin, Direction::Output) {
            warn!("init: LED pin {}: {}", self.led.pin, e);
        }
        self.led.set(self.gpio.as_ref(), false);

        for ch in self.registry.iter() {
            if let Err(e) = self.gpio.enable(ch.relay_pin, Direction::Output) {
                warn!("init: {} relay pin {}: {}", ch.id, ch.relay_pin, e);
            }
            let mut state = ch.state.lock();
            *state = ch.default_on;
            self.write_relay(ch, *state);
            drop(state);

            for pin in [ch.toggle_pin, ch.button_pin].into_iter().flatten() {
                if let Err(e) = self.gpio.enable(pin, Direction::Input) {
                    warn!("init: {} input pin {}: {}", ch.id, pin, e);
                }
            }
        }
        if let Err(e) = self.gpio.enable(self.config_button_pin, Direction::Input) {
            warn!("init: config button pin {}: {}", self.config_button_pin, e);
        }

        let mut report = RegistrationReport::default();
        match edges.register(self.config_button_pin, SourceKind::Button) {
            Ok(()) => report.registered.push((self.config_button_pin, SourceKind::Button)),
            Err(e) => {
                warn!("init: config button {} not registered: {}", self.config_button_pin, e);
                report
                    .failed
                    .push((self.config_button_pin, SourceKind::Button, e));
            }
        }
        let channel_report = self.bindings.register_all(edges);
        report.registered.extend(channel_report.registered);
        report.failed.extend(channel_report.failed);

        for &(pin, kind, error) in &report.failed {
            self.sink
                .emit(&AppEvent::RegistrationFailed { pin, kind, error });
        }
        self.sink.emit(&AppEvent::Started {
            channels: self.registry.len(),
            failed_inputs: report.failed.len(),
        });
        report
    }

    // ── Input dispatch ────────────────────────────────────────

    /// Route one event from the edge layer.
    pub fn dispatch(&self, event: InputEvent) -> DispatchOutcome {
        match event {
            InputEvent::Toggle { pin } => self.on_toggle(pin),
            InputEvent::Button { pin, event } => self.on_button(pin, event),
        }
    }

    /// A toggle on `pin` changed position: flip every listening channel.
    pub fn on_toggle(&self, pin: u8) -> DispatchOutcome {
        self.flip_bound(pin, SourceKind::Toggle, ChangeSource::Toggle)
    }

    /// A button on `pin` produced a gesture.
    pub fn on_button(&self, pin: u8, event: ButtonEvent) -> DispatchOutcome {
        if pin == self.config_button_pin {
            return self.on_config_button(event);
        }
        match event {
            ButtonEvent::SinglePress | ButtonEvent::LongPress => {
                self.flip_bound(pin, SourceKind::Button, ChangeSource::Button)
            }
            ButtonEvent::Unknown(code) => {
                self.drop_input(pin, SourceKind::Button, DropReason::UnknownEvent(code))
            }
        }
    }

    fn flip_bound(&self, pin: u8, kind: SourceKind, source: ChangeSource) -> DispatchOutcome {
        let Some(binding) = self.bindings.lookup(pin, kind) else {
            return self.drop_input(pin, kind, DropReason::NoBinding);
        };
        debug!("dispatch: {} pin {} -> {:?}", kind, pin, binding.channels);
        let mut switched = 0;
        for &id in &binding.channels {
            if self.apply(id, ChannelCommand::Flip, source).is_some() {
                switched += 1;
            }
        }
        DispatchOutcome::Switched(switched)
    }

    fn drop_input(&self, pin: u8, kind: SourceKind, reason: DropReason) -> DispatchOutcome {
        warn!("dispatch: {} pin {} dropped ({:?})", kind, pin, reason);
        self.sink.emit(&AppEvent::InputDropped { pin, kind, reason });
        DispatchOutcome::Dropped(reason)
    }

    // ── Factory reset path ────────────────────────────────────

    fn on_config_button(&self, event: ButtonEvent) -> DispatchOutcome {
        let (step, threshold) = {
            let mut fsm = self.reset.lock().unwrap_or_else(PoisonError::into_inner);
            (fsm.on_button(event), fsm.threshold())
        };

        match step {
            ResetStep::Armed { presses } => {
                self.sink.emit(&AppEvent::ResetArmed { presses, threshold });
                self.feedback.schedule(FeedbackPattern::Blink {
                    count: presses,
                    settle_on: false,
                });
            }
            ResetStep::Confirmed { presses } => {
                self.sink.emit(&AppEvent::ResetArmed { presses, threshold });
                self.feedback.schedule(FeedbackPattern::Blink {
                    count: presses,
                    settle_on: false,
                });
                self.sink.emit(&AppEvent::FactoryResetStarted);
                self.sequencer.launch();
            }
            ResetStep::Disarmed => self.sink.emit(&AppEvent::ResetDisarmed),
            ResetStep::Ignored => {}
            ResetStep::Unknown(code) => {
                return self.drop_input(
                    self.config_button_pin,
                    SourceKind::Button,
                    DropReason::UnknownEvent(code),
                );
            }
        }
        DispatchOutcome::ResetPath(step)
    }

    // ── Channel state synchronisation ─────────────────────────

    /// Invert a channel.  Returns the new state, or `None` for an
    /// unknown channel.
    pub fn flip(&self, id: ChannelId, source: ChangeSource) -> Option<bool> {
        self.apply(id, ChannelCommand::Flip, source)
    }

    /// Protocol write: force a channel to `on`.
    ///
    /// Whether the protocol layer is notified of its own write follows
    /// `echo_protocol_writes`.
    pub fn set(&self, id: ChannelId, on: bool) -> Option<bool> {
        self.apply(id, ChannelCommand::Set(on), ChangeSource::Protocol)
    }

    fn apply(&self, id: ChannelId, cmd: ChannelCommand, source: ChangeSource) -> Option<bool> {
        let Some(ch) = self.registry.get(id) else {
            warn!("sync: unknown channel {}", id);
            return None;
        };

        let mut state = ch.state.lock();
        let on = match cmd {
            ChannelCommand::Flip => !*state,
            ChannelCommand::Set(on) => on,
        };
        self.write_relay(ch, on);
        *state = on;
        if source != ChangeSource::Protocol || self.echo_protocol_writes {
            self.notifier.notify(id, on);
        }
        // Still under the guard: the event log and the notifications see
        // one channel's changes in the same order.
        info!("sync: {} -> {} ({:?})", id, if on { "ON" } else { "OFF" }, source);
        self.sink
            .emit(&AppEvent::ChannelChanged { channel: id, on, source });
        drop(state);
        Some(on)
    }

    fn write_relay(&self, ch: &Channel, on: bool) {
        self.gpio
            .write(ch.relay_pin, self.relay_polarity.level(on));
    }

    // ── Protocol extras ───────────────────────────────────────

    /// Accessory identify request: play the identify pattern.
    pub fn identify(&self) {
        self.sink.emit(&AppEvent::Identify);
        self.feedback.schedule(FeedbackPattern::Identify);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current logical state of a channel.
    pub fn state(&self, id: ChannelId) -> Option<bool> {
        self.registry.get(id).map(|ch| ch.state.get())
    }

    /// Consecutive long presses currently counted toward a reset.
    pub fn reset_presses(&self) -> u8 {
        self.reset
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .presses()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn bindings(&self) -> &PinBindings {
        &self.bindings
    }

    pub fn config_button_pin(&self) -> u8 {
        self.config_button_pin
    }
}
