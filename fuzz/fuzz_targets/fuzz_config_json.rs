//! Fuzz target: configuration document → validation → pin bindings
//!
//! Feeds arbitrary bytes through `ControllerConfig::from_json`, and every
//! document that validates through `Registry::from_config` and
//! `PinBindings::resolve`.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A validated config yields one registry entry per channel
//! - Bindings never exceed the number of declared inputs, and every
//!   listener id is a real channel
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use multirelay::config::ControllerConfig;
use multirelay::registry::{PinBindings, Registry};

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = ControllerConfig::from_json(doc) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }

    let registry = Registry::from_config(&config);
    assert_eq!(registry.len(), config.channels.len());

    let bindings = PinBindings::resolve(&registry);
    let inputs = config
        .channels
        .iter()
        .map(|c| usize::from(c.toggle_pin.is_some()) + usize::from(c.button_pin.is_some()))
        .sum::<usize>();
    assert!(bindings.len() <= inputs);

    for binding in bindings.iter() {
        assert!(!binding.channels.is_empty());
        for id in &binding.channels {
            assert!(registry.get(*id).is_some());
        }
    }
});
