//! Mock hardware adapter for integration tests.
//!
//! Records every lamp write so tests can assert on the full output
//! history without touching real GPIO registers, and checks after each
//! single write that the lamps on the wire never show a GREEN facing a
//! head that is not RED.

use std::collections::VecDeque;

use trafficctl::app::events::AppEvent;
use trafficctl::app::ports::{EventSink, SensorPort, SignalPort};
use trafficctl::arbiter::OperatingMode;
use trafficctl::error::SensorError;
use trafficctl::signal::{IntersectionId, MAX_INTERSECTIONS, SignalColor};

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    /// Scripted readings, consumed one per tick before `steady_raw`.
    pub readings: VecDeque<Result<i32, SensorError>>,
    /// Reading returned once the script is exhausted.
    pub steady_raw: i32,
    pub writes: Vec<(IntersectionId, SignalColor)>,
    /// Writes after which a GREEN faced a non-RED head.
    pub conflicts: u32,
    pub reads: u32,
    lamps: [Option<SignalColor>; MAX_INTERSECTIONS],
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            readings: VecDeque::new(),
            steady_raw: 2048,
            writes: Vec::new(),
            conflicts: 0,
            reads: 0,
            lamps: [None; MAX_INTERSECTIONS],
        }
    }

    /// Hardware reading `raw` on every tick.
    pub fn with_light(raw: i32) -> Self {
        Self {
            steady_raw: raw,
            ..Self::new()
        }
    }

    pub fn queue_readings(&mut self, raws: &[i32]) {
        self.readings.extend(raws.iter().map(|r| Ok(*r)));
    }

    pub fn queue_failure(&mut self) {
        self.readings.push_back(Err(SensorError::AdcReadFailed));
    }

    /// Colour last written to a head (`None` if never written).
    pub fn lamp(&self, id: IntersectionId) -> Option<SignalColor> {
        self.lamps[id.index()]
    }

    pub fn lamps(&self) -> [Option<SignalColor>; MAX_INTERSECTIONS] {
        self.lamps
    }

    fn on_wire_conflict(&self) -> bool {
        self.lamps.iter().enumerate().any(|(i, lamp)| {
            *lamp == Some(SignalColor::Green)
                && self
                    .lamps
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != i && other.is_some_and(|c| c != SignalColor::Red))
        })
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_light_raw(&mut self) -> Result<i32, SensorError> {
        self.reads += 1;
        self.readings.pop_front().unwrap_or(Ok(self.steady_raw))
    }
}

impl SignalPort for MockHardware {
    fn apply(&mut self, id: IntersectionId, colour: SignalColor) {
        self.writes.push((id, colour));
        self.lamps[id.index()] = Some(colour);
        if self.on_wire_conflict() {
            self.conflicts += 1;
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode_changes(&self) -> Vec<(OperatingMode, OperatingMode)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::ModeChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn phase_changes(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::PhaseChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
