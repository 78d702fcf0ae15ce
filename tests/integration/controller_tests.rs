//! Integration tests for the RelayController dispatch → sync pipeline.
//!
//! Default configuration throughout unless stated: relays {0,2,15,16}
//! active-low, toggles {4,5,12,13}, LED 25 active-low, config button 14.

use crate::mock_hw::{MockEdgeSource, Rig, Trace};

use multirelay::app::commands::{ButtonEvent, ChangeSource, InputEvent};
use multirelay::app::events::{AppEvent, DropReason};
use multirelay::app::ports::Direction;
use multirelay::app::service::DispatchOutcome;
use multirelay::config::{ChannelConfig, ControllerConfig, Polarity};
use multirelay::error::{ConfigError, Error, RegistrationError};
use multirelay::registry::{ChannelId, SourceKind};

fn channel(relay: u8, toggle: Option<u8>, button: Option<u8>) -> ChannelConfig {
    ChannelConfig {
        relay_pin: relay,
        toggle_pin: toggle,
        button_pin: button,
        default_on: false,
    }
}

// ── Startup ──────────────────────────────────────────────────

#[test]
fn init_drives_defaults_and_registers_inputs() {
    let mut cfg = ControllerConfig::default();
    cfg.channels[2].default_on = true;
    let rig = Rig::new(&cfg);
    let mut edges = MockEdgeSource::default();

    let report = rig.controller.init(&mut edges);

    assert!(report.is_clean());
    assert_eq!(
        edges.registered,
        vec![
            (14, SourceKind::Button),
            (4, SourceKind::Toggle),
            (5, SourceKind::Toggle),
            (12, SourceKind::Toggle),
            (13, SourceKind::Toggle),
        ]
    );

    let trace = rig.timeline.snapshot();
    assert_eq!(trace[0], Trace::Enable(25, Direction::Output));
    assert_eq!(trace[1], Trace::Write(25, true), "LED off (active-low)");
    assert!(trace.contains(&Trace::Enable(14, Direction::Input)));
    assert!(trace.contains(&Trace::Enable(12, Direction::Input)));

    // Active-low: off = HIGH, on = LOW.
    assert_eq!(rig.timeline.writes_to(0), vec![true]);
    assert_eq!(rig.timeline.writes_to(15), vec![false]);
    assert_eq!(rig.controller.state(ChannelId(2)), Some(true));
    assert!(rig.timeline.notifications().is_empty(), "init does not notify");

    assert_eq!(
        rig.sink.events().last(),
        Some(&AppEvent::Started {
            channels: 4,
            failed_inputs: 0
        })
    );
}

#[test]
fn registration_failure_is_not_fatal() {
    let rig = Rig::new(&ControllerConfig::default());
    let mut edges = MockEdgeSource {
        refuse: vec![5],
        ..MockEdgeSource::default()
    };

    let report = rig.controller.init(&mut edges);

    assert_eq!(
        report.failed,
        vec![(5, SourceKind::Toggle, RegistrationError::Driver(-1))]
    );
    assert_eq!(report.registered.len(), 4);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::RegistrationFailed { pin: 5, .. })),
        1
    );

    // Channel 1 lost its toggle but stays protocol-controllable.
    assert_eq!(rig.controller.set(ChannelId(1), true), Some(true));
    assert_eq!(rig.timeline.writes_to(2).last(), Some(&false));
}

#[test]
fn gpio_enable_failure_is_not_fatal() {
    let rig = Rig::with_failing_enable(&ControllerConfig::default(), 16);
    let report = rig.controller.init(&mut MockEdgeSource::default());
    assert!(report.is_clean());
    assert_eq!(rig.controller.flip(ChannelId(3), ChangeSource::Toggle), Some(true));
}

#[test]
fn config_button_registration_failure_is_reported() {
    let rig = Rig::new(&ControllerConfig::default());
    let mut edges = MockEdgeSource {
        refuse: vec![14],
        ..MockEdgeSource::default()
    };
    let report = rig.controller.init(&mut edges);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 14);
    assert_eq!(edges.registered.len(), 4);
}

// ── Toggle dispatch ──────────────────────────────────────────

#[test]
fn toggle_on_pin_12_switches_channel_2_on() {
    let rig = Rig::started(&ControllerConfig::default());

    let outcome = rig.controller.dispatch(InputEvent::Toggle { pin: 12 });

    assert_eq!(outcome, DispatchOutcome::Switched(1));
    assert_eq!(rig.controller.state(ChannelId(2)), Some(true));
    assert_eq!(rig.timeline.writes_to(15), vec![false], "relay driven LOW");
    assert_eq!(rig.timeline.notifications(), vec![(ChannelId(2), true)]);
    for other in [0, 2, 16] {
        assert!(rig.timeline.writes_to(other).is_empty());
    }
}

#[test]
fn two_toggles_restore_state_with_two_notifications() {
    let rig = Rig::started(&ControllerConfig::default());

    rig.controller.on_toggle(4);
    rig.controller.on_toggle(4);

    assert_eq!(rig.controller.state(ChannelId(0)), Some(false));
    assert_eq!(
        rig.timeline.notifications(),
        vec![(ChannelId(0), true), (ChannelId(0), false)]
    );
    assert_eq!(rig.timeline.writes_to(0), vec![false, true]);
}

#[test]
fn active_high_relays_follow_logical_state() {
    let cfg = ControllerConfig {
        relay_polarity: Polarity::ActiveHigh,
        ..ControllerConfig::default()
    };
    let rig = Rig::started(&cfg);
    rig.controller.on_toggle(13);
    assert_eq!(rig.timeline.writes_to(16), vec![true]);
}

#[test]
fn unbound_toggle_is_dropped() {
    let rig = Rig::started(&ControllerConfig::default());

    let outcome = rig.controller.dispatch(InputEvent::Toggle { pin: 33 });

    assert_eq!(outcome, DispatchOutcome::Dropped(DropReason::NoBinding));
    assert!(rig.timeline.snapshot().is_empty());
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::InputDropped {
                pin: 33,
                kind: SourceKind::Toggle,
                reason: DropReason::NoBinding
            }
        )),
        1
    );
}

#[test]
fn toggle_pin_reported_as_button_is_dropped() {
    let rig = Rig::started(&ControllerConfig::default());
    let outcome = rig.controller.on_button(4, ButtonEvent::SinglePress);
    assert_eq!(outcome, DispatchOutcome::Dropped(DropReason::NoBinding));
    assert_eq!(rig.controller.state(ChannelId(0)), Some(false));
}

// ── Button dispatch ──────────────────────────────────────────

fn button_config() -> ControllerConfig {
    ControllerConfig {
        channels: vec![
            channel(0, Some(4), Some(21)),
            channel(2, None, Some(22)),
        ],
        ..ControllerConfig::default()
    }
}

#[test]
fn single_and_long_press_both_flip() {
    let rig = Rig::started(&button_config());

    assert_eq!(
        rig.controller.on_button(22, ButtonEvent::SinglePress),
        DispatchOutcome::Switched(1)
    );
    assert_eq!(rig.controller.state(ChannelId(1)), Some(true));

    assert_eq!(
        rig.controller.on_button(22, ButtonEvent::LongPress),
        DispatchOutcome::Switched(1)
    );
    assert_eq!(rig.controller.state(ChannelId(1)), Some(false));
    assert_eq!(rig.timeline.notifications().len(), 2);
}

#[test]
fn unknown_button_event_is_ignored() {
    let rig = Rig::started(&button_config());

    let outcome = rig.controller.on_button(21, ButtonEvent::Unknown(9));

    assert_eq!(outcome, DispatchOutcome::Dropped(DropReason::UnknownEvent(9)));
    assert_eq!(rig.controller.state(ChannelId(0)), Some(false));
    assert!(rig.timeline.notifications().is_empty());
}

#[test]
fn shared_input_fans_out_to_every_listener() {
    let cfg = ControllerConfig {
        channels: vec![
            channel(0, Some(4), None),
            channel(2, Some(4), None),
            channel(15, Some(12), None),
        ],
        ..ControllerConfig::default()
    };
    let rig = Rig::new(&cfg);
    let mut edges = MockEdgeSource::default();
    rig.controller.init(&mut edges);
    rig.timeline.clear();

    assert_eq!(
        edges
            .registered
            .iter()
            .filter(|(p, k)| *p == 4 && *k == SourceKind::Toggle)
            .count(),
        1,
        "shared pin registered once"
    );

    assert_eq!(rig.controller.on_toggle(4), DispatchOutcome::Switched(2));
    assert_eq!(
        rig.timeline.notifications(),
        vec![(ChannelId(0), true), (ChannelId(1), true)]
    );
    assert_eq!(rig.controller.state(ChannelId(2)), Some(false));
}

// ── Protocol writes ──────────────────────────────────────────

#[test]
fn protocol_write_echoes_by_default() {
    let rig = Rig::started(&ControllerConfig::default());

    assert_eq!(rig.controller.set(ChannelId(3), true), Some(true));

    assert_eq!(rig.timeline.writes_to(16), vec![false]);
    assert_eq!(rig.timeline.notifications(), vec![(ChannelId(3), true)]);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::ChannelChanged {
                source: ChangeSource::Protocol,
                ..
            }
        )),
        1
    );
}

#[test]
fn protocol_write_without_echo_skips_notification() {
    let cfg = ControllerConfig {
        echo_protocol_writes: false,
        ..ControllerConfig::default()
    };
    let rig = Rig::started(&cfg);

    rig.controller.set(ChannelId(3), true);

    assert_eq!(rig.controller.state(ChannelId(3)), Some(true));
    assert_eq!(rig.timeline.writes_to(16), vec![false]);
    assert!(rig.timeline.notifications().is_empty());

    // Physical inputs still notify.
    rig.controller.on_toggle(13);
    assert_eq!(rig.timeline.notifications(), vec![(ChannelId(3), false)]);
}

#[test]
fn protocol_write_of_current_value_still_drives_relay() {
    let rig = Rig::started(&ControllerConfig::default());
    rig.controller.set(ChannelId(0), false);
    assert_eq!(rig.timeline.writes_to(0), vec![true]);
    assert_eq!(rig.controller.state(ChannelId(0)), Some(false));
}

#[test]
fn unknown_channel_is_rejected() {
    let rig = Rig::started(&ControllerConfig::default());
    assert_eq!(rig.controller.set(ChannelId(9), true), None);
    assert_eq!(rig.controller.flip(ChannelId(9), ChangeSource::Button), None);
    assert_eq!(rig.controller.state(ChannelId(9)), None);
    assert!(rig.timeline.snapshot().is_empty());
}

// ── Identify ─────────────────────────────────────────────────

#[test]
fn identify_plays_heartbeat_and_ends_dark() {
    let rig = Rig::started(&ControllerConfig::default());

    rig.controller.identify();

    assert_eq!(rig.spawner.names(), vec!["led-feedback"]);
    let led = rig.timeline.writes_to(25);
    // Active-low LED: on = LOW.
    assert_eq!(led.iter().filter(|l| !**l).count(), 6);
    assert_eq!(led.last(), Some(&true));
    assert_eq!(rig.sink.count(|e| *e == AppEvent::Identify), 1);
    assert!(rig.timeline.notifications().is_empty());
}

#[test]
fn invalid_config_is_refused() {
    let cfg = ControllerConfig {
        reset_long_presses: 0,
        ..ControllerConfig::default()
    };
    assert!(matches!(
        Rig::try_new(&cfg),
        Err(Error::Config(ConfigError::ValidationFailed(_)))
    ));
}
