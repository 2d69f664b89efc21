//! Trafficctl firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod ambient;
pub mod app;
pub mod arbiter;
pub mod blink;
pub mod channels;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod safety;
pub mod scheduler;
pub mod signal;

// Hardware-facing modules; the real implementations are guarded by cfg
// attributes inside and fall back to simulation on the host.
pub mod adapters;
pub mod drivers;
pub mod sensors;

#[cfg(target_os = "espidf")]
mod esp_link_shims;
