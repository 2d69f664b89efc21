//! Sensor drivers.

pub mod ldr;
