//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the LDR driver and both lamp heads, exposing them through
//! [`SensorPort`] and [`SignalPort`].  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets, the
//! underlying drivers use cfg-gated simulation stubs.

use log::error;

use crate::app::ports::{SensorPort, SignalPort};
use crate::drivers::gpio::GpioOutput;
use crate::drivers::signal_head::SignalHead;
use crate::error::{OutputError, SensorError};
use crate::pins;
use crate::sensors::ldr::LdrSensor;
use crate::signal::{IntersectionId, MAX_INTERSECTIONS, SignalColor};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    ldr: LdrSensor,
    heads: [SignalHead<GpioOutput>; MAX_INTERSECTIONS],
    write_failures: u32,
}

impl HardwareAdapter {
    pub fn new(ldr: LdrSensor, heads: [SignalHead<GpioOutput>; MAX_INTERSECTIONS]) -> Self {
        Self {
            ldr,
            heads,
            write_failures: 0,
        }
    }

    /// Build the adapter over the board pin map.
    pub fn from_pins() -> Self {
        let heads = pins::HEAD_GPIOS.map(|[r, y, g]| {
            SignalHead::new(GpioOutput::new(r), GpioOutput::new(y), GpioOutput::new(g))
        });
        Self::new(LdrSensor::new(pins::LDR_ADC_GPIO), heads)
    }

    /// Lamp writes that failed since boot.
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_light_raw(&mut self) -> Result<i32, SensorError> {
        self.ldr.read()
    }
}

// ── SignalPort implementation ─────────────────────────────────

impl SignalPort for HardwareAdapter {
    fn apply(&mut self, id: IntersectionId, colour: SignalColor) {
        if let Err(e) = self.heads[id.index()].show(colour) {
            self.write_failures = self.write_failures.saturating_add(1);
            error!(
                "{}: head {id} -> {colour:?} (rc={})",
                OutputError::GpioWriteFailed,
                e.0
            );
        }
    }
}
