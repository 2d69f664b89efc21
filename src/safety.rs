//! Signal safety supervisor.
//!
//! Two layers guard the lamps:
//!
//! 1. **Table validation** at construction.  A phase table is rejected
//!    unless every phase gives right-of-way to at most one intersection
//!    and every GREEN ends in YELLOW.
//! 2. **Output screening** on every write.  A requested colour set that
//!    pairs a GREEN with any non-RED head on another intersection is
//!    replaced by all-RED before it reaches the output port.
//!
//! Runtime faults are latched until the controller collects them with
//! [`SafetySupervisor::take_fault`] and reports them as events.

use log::error;

use crate::error::SafetyFault;
use crate::fsm::PhaseDescriptor;
use crate::signal::SignalColor;

// ───────────────────────────────────────────────────────────────
// Table validation
// ───────────────────────────────────────────────────────────────

/// Check a phase table over the first `heads` intersections.
pub fn validate_phase_table(table: &[PhaseDescriptor], heads: usize) -> Result<(), SafetyFault> {
    if table.is_empty() || heads == 0 {
        return Err(SafetyFault::InvalidPhaseTable);
    }
    if table.iter().any(|p| p.duration_ms == 0) {
        return Err(SafetyFault::InvalidPhaseTable);
    }

    for phase in table {
        if conflicting(&phase.colours[..heads]) {
            error!("phase {} grants conflicting right-of-way", phase.name);
            return Err(SafetyFault::ConflictingGreens);
        }
    }

    // Every GREEN must hand over to YELLOW, including across the wrap.
    for (i, phase) in table.iter().enumerate() {
        let next = &table[(i + 1) % table.len()];
        for head in 0..heads {
            let now = phase.colours[head];
            let then = next.colours[head];
            if now == SignalColor::Green && then != SignalColor::Green && then != SignalColor::Yellow
            {
                error!("phase {} -> {} skips yellow on head {}", phase.name, next.name, head + 1);
                return Err(SafetyFault::MissingClearance);
            }
        }
    }

    Ok(())
}

/// True when a GREEN coexists with any head that is not RED.
fn conflicting(colours: &[SignalColor]) -> bool {
    colours.iter().enumerate().any(|(i, c)| {
        *c == SignalColor::Green
            && colours
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && *other != SignalColor::Red)
    })
}

// ───────────────────────────────────────────────────────────────
// Runtime supervisor
// ───────────────────────────────────────────────────────────────

/// Screens every colour set before it is written to the lamps.
#[derive(Debug, Default)]
pub struct SafetySupervisor {
    /// Fault raised since the controller last collected it.
    pending: Option<SafetyFault>,
    /// Screened violations since boot.
    violations: u32,
}

impl SafetySupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Screen `colours` in place.  A conflicting set is rewritten to
    /// all-RED and the fault is latched and returned.
    pub fn screen(&mut self, colours: &mut [SignalColor]) -> Option<SafetyFault> {
        if !conflicting(colours) {
            return None;
        }
        error!("SAFETY FAULT: conflicting greens {colours:?}, forcing all-RED");
        colours.fill(SignalColor::Red);
        self.violations = self.violations.saturating_add(1);
        self.pending = Some(SafetyFault::ConflictingGreens);
        self.pending
    }

    /// Collect the latched fault, if any.
    pub fn take_fault(&mut self) -> Option<SafetyFault> {
        self.pending.take()
    }

    /// Violations screened since boot.
    pub fn violations(&self) -> u32 {
        self.violations
    }
}
