//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (light sensor, lamp heads, event sinks) implement these
//! traits.  The [`Controller`](super::service::Controller) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::error::SensorError;
use crate::signal::{IntersectionId, SignalColor};

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per tick.
pub trait SensorPort {
    /// Raw ambient light reading.  May be outside the valid range; the
    /// monitor clamps it.
    fn read_light_raw(&mut self) -> Result<i32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Signal port (driven adapter: domain → lamps)
// ───────────────────────────────────────────────────────────────

/// Write-side port: set one intersection's three lamp lines.
///
/// Implementations light exactly the lamp for `colour` (none for `Off`)
/// without showing an intermediate combination.  Write failures are
/// handled inside the adapter.
pub trait SignalPort {
    fn apply(&mut self, id: IntersectionId, colour: SignalColor);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, MQTT topic, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Fan one event stream out to two sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: &AppEvent) {
        (**self).emit(event);
    }
}
