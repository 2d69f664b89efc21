//! Night blink square wave.
//!
//! YELLOW for the first half period, dark for the second.  Driven purely
//! by the elapsed time fed in each tick, never by sleeping.

use crate::signal::SignalColor;

/// Yellow/off square-wave generator.  Stack-allocated, no heap.
#[derive(Debug, Clone)]
pub struct NightBlinker {
    half_period_ms: u32,
    phase_ms: u32,
}

impl NightBlinker {
    pub fn new(half_period_ms: u32) -> Self {
        Self {
            half_period_ms: half_period_ms.max(1),
            phase_ms: 0,
        }
    }

    /// Restart at the beginning of the ON half.
    pub fn restart(&mut self) {
        self.phase_ms = 0;
    }

    /// Advance the wave by `delta_ms` and return the colour to show.
    pub fn advance(&mut self, delta_ms: u32) -> SignalColor {
        let period = u64::from(self.half_period_ms) * 2;
        self.phase_ms = ((u64::from(self.phase_ms) + u64::from(delta_ms)) % period) as u32;
        self.current()
    }

    /// Colour for the current position without advancing.
    pub fn current(&self) -> SignalColor {
        if self.phase_ms < self.half_period_ms {
            SignalColor::Yellow
        } else {
            SignalColor::Off
        }
    }
}
