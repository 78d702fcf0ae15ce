//! Application core: relay controller logic with no direct I/O.
//!
//! Input dispatch, channel state synchronisation, and the factory-reset
//! confirmation path live here.  All hardware and protocol interaction
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
