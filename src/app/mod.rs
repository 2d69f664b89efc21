//! Application core: pure domain logic, zero I/O.
//!
//! This module wires the traffic controller together: command parsing,
//! the event vocabulary, and the [`service::Controller`] root that owns
//! the cycle engine, the mode arbiter, and the light monitor.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
