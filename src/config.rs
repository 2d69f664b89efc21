//! System configuration parameters
//!
//! All tunable parameters for the traffic controller.  Defaults match
//! the reference two-head installation; a deployment can override any
//! subset through a JSON document (see [`SystemConfig::from_json`]).

use serde::{Deserialize, Serialize};

use crate::ambient::LightLevel;
use crate::error::Error;

/// Which phase table the cycle state machine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CycleLayout {
    /// Two coupled intersections; exactly one has right-of-way.
    #[default]
    CoupledPair,
    /// One stand-alone head: GREEN → YELLOW → RED.
    Single,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Cycle ---
    pub layout: CycleLayout,
    /// GREEN phase duration (ms)
    pub green_ms: u32,
    /// YELLOW clearance duration (ms)
    pub yellow_ms: u32,
    /// RED duration (ms), single layout only
    pub red_ms: u32,

    // --- Ambient light ---
    /// Classification flips to NIGHT strictly below this raw reading
    pub night_below: u16,
    /// Classification flips back to DAY strictly above this raw reading
    pub day_above: u16,
    /// Largest valid raw sensor reading (12-bit ADC)
    pub light_raw_max: u16,
    /// Classification assumed before the first sample
    pub initial_light: LightLevel,

    // --- Night blink ---
    /// Yellow ON time, equal to the OFF time (ms)
    pub blink_half_period_ms: u32,

    // --- Timing ---
    /// Scheduler tick period (ms)
    pub tick_interval_ms: u32,
    /// Publish telemetry every N ticks
    pub telemetry_every_ticks: u32,
    /// First transport reconnect delay (ms)
    pub reconnect_initial_ms: u32,
    /// Reconnect delay cap (ms)
    pub reconnect_max_ms: u32,
    /// Task watchdog timeout (ms)
    pub watchdog_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Cycle
            layout: CycleLayout::CoupledPair,
            green_ms: 3_000,
            yellow_ms: 1_000,
            red_ms: 3_000,

            // Ambient light
            night_below: 200,
            day_above: 300,
            light_raw_max: 4_095,
            initial_light: LightLevel::Day,

            // Night blink
            blink_half_period_ms: 1_000, // 1 s on, 1 s off

            // Timing
            tick_interval_ms: 100, // 10 Hz
            telemetry_every_ticks: 1,
            reconnect_initial_ms: 2_000,
            reconnect_max_ms: 60_000,
            watchdog_timeout_ms: 10_000,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), Error> {
        if self.green_ms == 0 || self.yellow_ms == 0 || self.red_ms == 0 {
            return Err(Error::Config("phase durations must be non-zero"));
        }
        if self.night_below >= self.day_above {
            return Err(Error::Config("night_below must be below day_above"));
        }
        if self.day_above > self.light_raw_max {
            return Err(Error::Config("day_above exceeds light_raw_max"));
        }
        if self.blink_half_period_ms == 0 {
            return Err(Error::Config("blink_half_period_ms must be non-zero"));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be non-zero"));
        }
        if self.telemetry_every_ticks == 0 {
            return Err(Error::Config("telemetry_every_ticks must be non-zero"));
        }
        if self.reconnect_initial_ms == 0 || self.reconnect_initial_ms > self.reconnect_max_ms {
            return Err(Error::Config("reconnect backoff range is invalid"));
        }
        if self.watchdog_timeout_ms <= self.tick_interval_ms {
            return Err(Error::Config("watchdog timeout must exceed the tick interval"));
        }
        Ok(())
    }

    /// Parse a JSON override on top of the defaults and validate it.
    ///
    /// Missing fields keep their default value.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON override"))?;
        config.validate()?;
        Ok(config)
    }
}
