//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! The MQTT adapter implements the same trait for telemetry.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                debug!(
                    "TELEM | tick={} | light={}({:?}) | mode={} | phase={} | heads={:?}",
                    t.tick, t.light_raw, t.light, t.mode, t.phase, t.colours,
                );
            }
            AppEvent::Started { mode, phase } => {
                info!("START | mode={} phase={}", mode, phase);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {} -> {}", from, to);
            }
            AppEvent::PhaseChanged { from, to } => {
                info!("PHASE | {} -> {}", from, to);
            }
            AppEvent::LightChanged { from, to, raw } => {
                info!("LIGHT | {:?} -> {:?} (raw={})", from, to, raw);
            }
            AppEvent::CommandAccepted(cmd) => {
                info!("CMD | accepted {}", cmd);
            }
            AppEvent::CommandDeferred(cmd) => {
                info!("CMD | deferred {} until day", cmd);
            }
            AppEvent::CommandIgnored => {
                warn!("CMD | ignored");
            }
            AppEvent::SafetyFault(fault) => {
                error!("FAULT | {} (mask=0b{:08b})", fault, fault.mask());
            }
            AppEvent::Shutdown => {
                info!("STOP | all heads RED");
            }
        }
    }
}
