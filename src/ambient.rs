//! Ambient light classification with hysteresis.
//!
//! ```text
//!        NIGHT            dead band             DAY
//!  0 ─────────────┤ night_below ... day_above ├───────── raw_max
//!   flips to NIGHT          keeps previous        flips to DAY
//! ```
//!
//! Raw readings are clamped to `0..=raw_max` before classification.
//! A failed sensor read keeps the previous classification.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::SensorPort;
use crate::config::SystemConfig;

/// Day/night classification of the ambient light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightLevel {
    #[default]
    Day,
    Night,
}

/// One classified sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientReading {
    /// Clamped raw sensor value.
    pub raw: u16,
    pub level: LightLevel,
}

/// Hysteresis classifier over the LDR reading.
#[derive(Debug, Clone)]
pub struct AmbientLightMonitor {
    night_below: u16,
    day_above: u16,
    raw_max: u16,
    level: LightLevel,
    last_raw: u16,
    read_failures: u32,
}

impl AmbientLightMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            night_below: config.night_below,
            day_above: config.day_above,
            raw_max: config.light_raw_max,
            level: config.initial_light,
            last_raw: 0,
            read_failures: 0,
        }
    }

    /// Read the sensor and update the classification.
    pub fn sample(&mut self, sensor: &mut impl SensorPort) -> AmbientReading {
        match sensor.read_light_raw() {
            Ok(raw) => self.classify(raw),
            Err(e) => {
                self.read_failures = self.read_failures.saturating_add(1);
                warn!("Light sensor read failed ({e}), keeping {:?}", self.level);
                self.reading()
            }
        }
    }

    /// Classify a raw value without touching hardware.
    pub fn classify(&mut self, raw: i32) -> AmbientReading {
        let raw = raw.clamp(0, i32::from(self.raw_max)) as u16;
        self.last_raw = raw;

        if raw < self.night_below {
            self.level = LightLevel::Night;
        } else if raw > self.day_above {
            self.level = LightLevel::Day;
        }
        self.reading()
    }

    /// Current classification.
    pub fn level(&self) -> LightLevel {
        self.level
    }

    /// Most recent classification and clamped raw value.
    pub fn reading(&self) -> AmbientReading {
        AmbientReading {
            raw: self.last_raw,
            level: self.level,
        }
    }

    /// Sensor read failures since boot.
    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }
}
