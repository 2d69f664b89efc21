//! Lamp output drivers, hardware initialisation, and peripheral helpers.

pub mod gpio;
pub mod hw_init;
pub mod signal_head;
pub mod watchdog;
