//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                channels,
                failed_inputs,
            } => {
                info!("START | channels={} failed_inputs={}", channels, failed_inputs);
            }
            AppEvent::ChannelChanged {
                channel,
                on,
                source,
            } => {
                info!(
                    "CHAN  | {} -> {} | source={:?}",
                    channel,
                    if *on { "ON" } else { "OFF" },
                    source
                );
            }
            AppEvent::ResetArmed { presses, threshold } => {
                info!("RESET | long press {}/{}", presses, threshold);
            }
            AppEvent::ResetDisarmed => {
                info!("RESET | count cleared");
            }
            AppEvent::FactoryResetStarted => {
                warn!("RESET | factory reset started");
            }
            AppEvent::Identify => {
                info!("IDENT | identify requested");
            }
            AppEvent::InputDropped { pin, kind, reason } => {
                warn!("INPUT | {} pin {} dropped: {:?}", kind, pin, reason);
            }
            AppEvent::RegistrationFailed { pin, kind, error } => {
                warn!("INPUT | {} pin {} not registered: {}", kind, pin, error);
            }
        }
    }
}
