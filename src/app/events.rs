//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, publish over MQTT,
//! record in a test.

use core::fmt::Write as _;

use crate::ambient::LightLevel;
use crate::arbiter::OperatingMode;
use crate::error::SafetyFault;
use crate::signal::{MAX_INTERSECTIONS, SignalColor};

use super::commands::RemoteCommand;

/// Longest telemetry payload: a `u16` in decimal.
pub const TELEMETRY_PAYLOAD_LEN: usize = 5;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started (carries initial mode and phase name).
    Started {
        mode: OperatingMode,
        phase: &'static str,
    },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The arbiter switched operating mode.
    ModeChanged {
        from: OperatingMode,
        to: OperatingMode,
    },

    /// The cycle moved to another phase.
    PhaseChanged {
        from: &'static str,
        to: &'static str,
    },

    /// Ambient classification flipped.
    LightChanged {
        from: LightLevel,
        to: LightLevel,
        raw: u16,
    },

    /// A remote command took effect this tick.
    CommandAccepted(RemoteCommand),

    /// A remote command arrived during night blink and is held until DAY.
    CommandDeferred(RemoteCommand),

    /// A payload was not a command, or named an intersection that is not wired.
    CommandIgnored,

    /// An output write was screened to all-RED.
    SafetyFault(SafetyFault),

    /// Every head has been driven RED for shutdown.
    Shutdown,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    /// Clamped raw light reading of this tick.
    pub light_raw: u16,
    pub light: LightLevel,
    pub mode: OperatingMode,
    pub phase: &'static str,
    pub colours: [SignalColor; MAX_INTERSECTIONS],
    pub tick: u64,
}

impl TelemetryData {
    /// Plain-text reading published on the telemetry topic.
    pub fn payload(&self) -> heapless::String<TELEMETRY_PAYLOAD_LEN> {
        let mut s = heapless::String::new();
        // A u16 always fits in five digits.
        let _ = write!(s, "{}", self.light_raw);
        s
    }
}
