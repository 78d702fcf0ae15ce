//! Mock adapters for integration tests.
//!
//! Every port records into one shared [`Timeline`] so tests can assert
//! on the relative order of relay writes, LED blinks, delays, and
//! destructive maintenance calls.

use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;

use multirelay::app::events::AppEvent;
use multirelay::app::ports::{
    CharacteristicNotifier, Direction, EdgeSource, EventSink, GpioPort, Job, MaintenancePort,
    TaskSpawner,
};
use multirelay::app::service::{ControllerPorts, RelayController};
use multirelay::config::ControllerConfig;
use multirelay::error::{GpioError, RegistrationError, SpawnError};
use multirelay::registry::{ChannelId, SourceKind};

// ── Timeline ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    Enable(u8, Direction),
    Write(u8, bool),
    Notify(ChannelId, bool),
    Delay(u32),
    NetworkReset,
    ProtocolReset,
    Restart,
}

#[derive(Clone, Default)]
pub struct Timeline(Arc<Mutex<Vec<Trace>>>);

#[allow(dead_code)]
impl Timeline {
    pub fn push(&self, t: Trace) {
        self.0.lock().unwrap().push(t);
    }

    pub fn snapshot(&self) -> Vec<Trace> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    /// Levels written to `pin`, in order.
    pub fn writes_to(&self, pin: u8) -> Vec<bool> {
        self.snapshot()
            .into_iter()
            .filter_map(|t| match t {
                Trace::Write(p, level) if p == pin => Some(level),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<(ChannelId, bool)> {
        self.snapshot()
            .into_iter()
            .filter_map(|t| match t {
                Trace::Notify(id, on) => Some((id, on)),
                _ => None,
            })
            .collect()
    }

    /// Only the reset-relevant entries: delays and maintenance calls.
    pub fn reset_trace(&self) -> Vec<Trace> {
        self.snapshot()
            .into_iter()
            .filter(|t| {
                matches!(
                    t,
                    Trace::Delay(_) | Trace::NetworkReset | Trace::ProtocolReset | Trace::Restart
                )
            })
            .collect()
    }

    pub fn count(&self, t: Trace) -> usize {
        self.snapshot().iter().filter(|x| **x == t).count()
    }
}

// ── GPIO ──────────────────────────────────────────────────────

pub struct MockGpio {
    timeline: Timeline,
    fail_enable: Option<u8>,
}

impl GpioPort for MockGpio {
    fn enable(&self, pin: u8, direction: Direction) -> Result<(), GpioError> {
        self.timeline.push(Trace::Enable(pin, direction));
        if self.fail_enable == Some(pin) {
            return Err(GpioError::Driver(-1));
        }
        Ok(())
    }

    fn write(&self, pin: u8, high: bool) {
        self.timeline.push(Trace::Write(pin, high));
    }
}

// ── Notifier ──────────────────────────────────────────────────

pub struct MockNotifier {
    timeline: Timeline,
}

impl CharacteristicNotifier for MockNotifier {
    fn notify(&self, channel: ChannelId, on: bool) {
        self.timeline.push(Trace::Notify(channel, on));
    }
}

// ── Maintenance ───────────────────────────────────────────────

pub struct MockMaintenance {
    timeline: Timeline,
}

impl MaintenancePort for MockMaintenance {
    fn reset_network_config(&self) {
        self.timeline.push(Trace::NetworkReset);
    }

    fn reset_protocol_config(&self) {
        self.timeline.push(Trace::ProtocolReset);
    }

    fn restart(&self) {
        self.timeline.push(Trace::Restart);
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Records requested delays instead of sleeping.
#[derive(Clone)]
pub struct RecordingDelay {
    timeline: Timeline,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.timeline.push(Trace::Delay(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.timeline.push(Trace::Delay(ms));
    }
}

// ── Spawners ──────────────────────────────────────────────────

/// Runs every job on the calling thread before returning.
#[derive(Default)]
pub struct InlineSpawner {
    pub spawned: Mutex<Vec<&'static str>>,
}

#[allow(dead_code)]
impl InlineSpawner {
    pub fn names(&self) -> Vec<&'static str> {
        self.spawned.lock().unwrap().clone()
    }
}

impl TaskSpawner for InlineSpawner {
    fn spawn(&self, name: &'static str, job: Job) -> Result<(), SpawnError> {
        self.spawned.lock().unwrap().push(name);
        job();
        Ok(())
    }
}

/// Refuses every job.
pub struct FailingSpawner;

impl TaskSpawner for FailingSpawner {
    fn spawn(&self, _name: &'static str, _job: Job) -> Result<(), SpawnError> {
        Err(SpawnError::Rejected)
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<AppEvent>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Edge source ───────────────────────────────────────────────

/// Accepts every pin except those in `refuse`; rejects duplicates.
#[derive(Default)]
pub struct MockEdgeSource {
    pub registered: Vec<(u8, SourceKind)>,
    pub refuse: Vec<u8>,
}

impl EdgeSource for MockEdgeSource {
    fn register(&mut self, pin: u8, kind: SourceKind) -> Result<(), RegistrationError> {
        if self.refuse.contains(&pin) {
            return Err(RegistrationError::Driver(-1));
        }
        if self.registered.iter().any(|(p, _)| *p == pin) {
            return Err(RegistrationError::AlreadyRegistered);
        }
        self.registered.push((pin, kind));
        Ok(())
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// One controller wired to recording mocks.
pub struct Rig {
    pub timeline: Timeline,
    pub spawner: Arc<InlineSpawner>,
    pub sink: Arc<RecordingSink>,
    pub controller: Arc<RelayController<RecordingDelay>>,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: &ControllerConfig) -> Self {
        Self::try_new(config).expect("valid config")
    }

    pub fn try_new(config: &ControllerConfig) -> multirelay::error::Result<Self> {
        Self::build(config, None, None)
    }

    pub fn with_failing_spawner(config: &ControllerConfig) -> Self {
        Self::build(config, Some(Arc::new(FailingSpawner)), None).expect("valid config")
    }

    pub fn with_failing_enable(config: &ControllerConfig, pin: u8) -> Self {
        Self::build(config, None, Some(pin)).expect("valid config")
    }

    fn build(
        config: &ControllerConfig,
        spawner: Option<Arc<dyn TaskSpawner>>,
        fail_enable: Option<u8>,
    ) -> multirelay::error::Result<Self> {
        let timeline = Timeline::default();
        let inline = Arc::new(InlineSpawner::default());
        let sink = Arc::new(RecordingSink::default());
        let ports = ControllerPorts {
            gpio: Arc::new(MockGpio {
                timeline: timeline.clone(),
                fail_enable,
            }),
            notifier: Arc::new(MockNotifier {
                timeline: timeline.clone(),
            }),
            maintenance: Arc::new(MockMaintenance {
                timeline: timeline.clone(),
            }),
            spawner: spawner.unwrap_or_else(|| inline.clone() as Arc<dyn TaskSpawner>),
            sink: sink.clone(),
            delay: RecordingDelay {
                timeline: timeline.clone(),
            },
        };
        let controller = Arc::new(RelayController::new(config, ports)?);
        Ok(Self {
            timeline,
            spawner: inline,
            sink,
            controller,
        })
    }

    /// Run `init` against a permissive edge source and clear the
    /// timeline so tests only see what follows.
    pub fn started(config: &ControllerConfig) -> Self {
        let rig = Self::new(config);
        let mut edges = MockEdgeSource::default();
        rig.controller.init(&mut edges);
        rig.timeline.clear();
        rig
    }
}
