//! Controller: the hexagonal core.
//!
//! [`Controller`] is the single root that owns the cycle engine, the mode
//! arbiter, and the ambient light monitor.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire controller testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        Controller         │
//!  SignalPort ◀── │ Monitor · Arbiter · FSM   │
//!                 └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::ambient::{AmbientLightMonitor, LightLevel};
use crate::arbiter::{CommandDisposition, ModeArbiter, OperatingMode};
use crate::config::SystemConfig;
use crate::error::Result;
use crate::fsm::CycleFsm;
use crate::fsm::phases::build_phase_table;
use crate::signal::{MAX_INTERSECTIONS, SignalColor};

use super::commands::RemoteCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{EventSink, SensorPort, SignalPort};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// The controller orchestrates all domain logic.
pub struct Controller {
    config: SystemConfig,
    fsm: CycleFsm,
    arbiter: ModeArbiter,
    monitor: AmbientLightMonitor,
    /// Uptime accumulated from tick elapsed times (ms).
    now_ms: u64,
    tick_count: u64,
    started: bool,
}

impl Controller {
    /// Construct the controller from a configuration.
    ///
    /// Does **not** touch the lamps; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Result<Self> {
        config.validate()?;
        let (table, heads) = build_phase_table(&config);
        let fsm = CycleFsm::new(table, heads)?;
        let arbiter = ModeArbiter::new(config.blink_half_period_ms);
        let monitor = AmbientLightMonitor::new(&config);

        Ok(Self {
            config,
            fsm,
            arbiter,
            monitor,
            now_ms: 0,
            tick_count: 0,
            started: false,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Apply the first phase to the lamps.
    pub fn start(&mut self, hw: &mut impl SignalPort, sink: &mut impl EventSink) {
        self.fsm.set_clock(self.now_ms);
        self.fsm.start(hw);
        self.started = true;
        info!(
            "Controller started in {} / {}",
            self.arbiter.mode(),
            self.fsm.phase_name()
        );
        sink.emit(&AppEvent::Started {
            mode: self.arbiter.mode(),
            phase: self.fsm.phase_name(),
        });
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cycle: parse the inbound payload → sample light → arbitrate.
    ///
    /// `inbound` is at most one queued command payload.  The `hw`
    /// parameter satisfies **both** [`SensorPort`] and [`SignalPort`].
    pub fn tick(
        &mut self,
        elapsed_ms: u32,
        inbound: Option<&[u8]>,
        hw: &mut (impl SensorPort + SignalPort),
        sink: &mut impl EventSink,
    ) {
        if !self.started {
            self.start(hw, sink);
        }
        self.tick_count += 1;
        self.now_ms = self.now_ms.saturating_add(u64::from(elapsed_ms));
        self.fsm.set_clock(self.now_ms);

        // 1. Inbound command
        let command = inbound.and_then(|payload| {
            let parsed = RemoteCommand::parse(payload);
            if parsed.is_none() {
                warn!("Ignoring unrecognised command ({} bytes)", payload.len());
                sink.emit(&AppEvent::CommandIgnored);
            }
            parsed
        });

        // 2. Ambient light
        let prev_level = self.monitor.level();
        let reading = self.monitor.sample(hw);
        if reading.level != prev_level {
            info!("Light: {prev_level:?} -> {:?} (raw {})", reading.level, reading.raw);
            sink.emit(&AppEvent::LightChanged {
                from: prev_level,
                to: reading.level,
                raw: reading.raw,
            });
        }

        // 3. Arbitration (drives the cycle or the blink routine)
        let phase_before = self.fsm.phase_name();
        let outcome = self
            .arbiter
            .step(reading.level, command, elapsed_ms, &mut self.fsm, hw);

        // 4. Report
        match outcome.command {
            Some(CommandDisposition::Accepted(cmd)) => sink.emit(&AppEvent::CommandAccepted(cmd)),
            Some(CommandDisposition::Deferred(cmd)) => sink.emit(&AppEvent::CommandDeferred(cmd)),
            Some(CommandDisposition::Rejected(_)) => sink.emit(&AppEvent::CommandIgnored),
            None => {}
        }
        if let Some((from, to)) = outcome.mode_change {
            sink.emit(&AppEvent::ModeChanged { from, to });
        }
        if outcome.phase_change.is_some() {
            sink.emit(&AppEvent::PhaseChanged {
                from: phase_before,
                to: self.fsm.phase_name(),
            });
        }
        if let Some(fault) = self.fsm.take_fault() {
            sink.emit(&AppEvent::SafetyFault(fault));
        }

        if self.tick_count % u64::from(self.config.telemetry_every_ticks) == 0 {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    /// Force every intersection RED before the process stops.
    pub fn shutdown(&mut self, hw: &mut impl SignalPort, sink: &mut impl EventSink) {
        self.arbiter.shutdown(&mut self.fsm, hw);
        info!("Controller shut down, all heads RED");
        sink.emit(&AppEvent::Shutdown);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current state.
    pub fn build_telemetry(&self) -> TelemetryData {
        let reading = self.monitor.reading();
        TelemetryData {
            light_raw: reading.raw,
            light: reading.level,
            mode: self.arbiter.mode(),
            phase: self.fsm.phase_name(),
            colours: self.fsm.colours(),
            tick: self.tick_count,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.arbiter.mode()
    }

    /// Index of the stored cycle phase (kept while suspended).
    pub fn phase_index(&self) -> usize {
        self.fsm.phase_index()
    }

    pub fn phase_name(&self) -> &'static str {
        self.fsm.phase_name()
    }

    /// Colours on the lamps.  Unwired slots read `Off`.
    pub fn colours(&self) -> [SignalColor; MAX_INTERSECTIONS] {
        self.fsm.colours()
    }

    pub fn light_level(&self) -> LightLevel {
        self.monitor.level()
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Uptime accumulated from tick elapsed times (ms).
    pub fn uptime_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Read-only view of the cycle engine.
    pub fn cycle(&self) -> &CycleFsm {
        &self.fsm
    }
}
