//! Multi-channel relay controller firmware library.
//!
//! Exposes the controller core and its adapters for integration testing.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, with a simulation fallback for host builds.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod feedback;
pub mod fsm;
pub mod pins;
pub mod registry;
pub mod reset;

pub mod adapters;
pub mod drivers;
