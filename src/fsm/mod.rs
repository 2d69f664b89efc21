//! Table-driven intersection cycle state machine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  PhaseTable                                         │
//! │  ┌────────────────┬──────────┬────────┬────────┐    │
//! │  │ name           │ duration │ A      │ B      │    │
//! │  ├────────────────┼──────────┼────────┼────────┤    │
//! │  │ A-green/B-red  │ 3000 ms  │ GREEN  │ RED    │    │
//! │  │ A-yellow/B-red │ 1000 ms  │ YELLOW │ RED    │    │
//! │  │ A-red/B-green  │ 3000 ms  │ RED    │ GREEN  │    │
//! │  │ A-red/B-yellow │ 1000 ms  │ RED    │ YELLOW │    │
//! │  └────────────────┴──────────┴────────┴────────┘    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Each [`CycleFsm::tick`] adds the elapsed time to the current phase.
//! Once the phase duration is reached the engine moves to the next row,
//! resets the phase timer, and writes the colours of every intersection
//! that changed.  At most one phase is taken per tick, so a late tick is
//! caught up over the following ticks rather than skipping phases.
//!
//! Every write passes through the [`SafetySupervisor`] screen and is
//! issued non-GREEN heads first, GREEN last.

pub mod phases;

use log::{debug, info, warn};

use crate::app::ports::SignalPort;
use crate::error::SafetyFault;
use crate::safety::{SafetySupervisor, validate_phase_table};
use crate::signal::{Intersection, IntersectionId, MAX_INTERSECTIONS, SignalColor};

/// Upper bound on phases in one table.
pub const MAX_PHASES: usize = 8;

// ---------------------------------------------------------------------------
// Phase descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single cycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDescriptor {
    pub name: &'static str,
    pub duration_ms: u32,
    /// Colour imposed on each intersection, indexed by [`IntersectionId::index`].
    pub colours: [SignalColor; MAX_INTERSECTIONS],
}

/// Fixed-capacity phase table.  No heap.
pub type PhaseTable = heapless::Vec<PhaseDescriptor, MAX_PHASES>;

/// A phase transition, by table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: usize,
    pub to: usize,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The cycle engine.  Owns the phase table and the live intersections.
pub struct CycleFsm {
    table: PhaseTable,
    /// Number of wired intersections (1 or 2).
    heads: usize,
    /// Index of the active phase.
    current: usize,
    /// Time spent in the active phase (ms).
    elapsed_ms: u32,
    suspended: bool,
    intersections: [Intersection; MAX_INTERSECTIONS],
    /// Controller uptime used to stamp colour changes.
    now_ms: u64,
    supervisor: SafetySupervisor,
}

impl CycleFsm {
    /// Build the engine over a validated phase table.  Starts at phase 0.
    pub fn new(table: PhaseTable, heads: usize) -> Result<Self, SafetyFault> {
        if heads > MAX_INTERSECTIONS {
            return Err(SafetyFault::InvalidPhaseTable);
        }
        validate_phase_table(&table, heads)?;

        let mut intersections = IntersectionId::ALL.map(Intersection::new);
        // Unwired slots stay dark and are never written.
        for slot in &mut intersections[heads..] {
            slot.colour = SignalColor::Off;
        }

        Ok(Self {
            table,
            heads,
            current: 0,
            elapsed_ms: 0,
            suspended: false,
            intersections,
            now_ms: 0,
            supervisor: SafetySupervisor::new(),
        })
    }

    /// Write the colours of the starting phase to every wired head.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, out: &mut impl SignalPort) {
        info!("Cycle starting in phase: {}", self.phase_name());
        let target = self.table[self.current].colours;
        self.show(target, true, out);
    }

    /// Set the uptime used for colour-change timestamps.
    pub fn set_clock(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    /// Advance the phase timer by `elapsed_ms`.
    ///
    /// Returns the transition taken, if any.  Does nothing while suspended.
    pub fn tick(&mut self, elapsed_ms: u32, out: &mut impl SignalPort) -> Option<PhaseChange> {
        if self.suspended {
            return None;
        }

        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
        if self.elapsed_ms < self.table[self.current].duration_ms {
            return None;
        }

        let from = self.current;
        self.current = (self.current + 1) % self.table.len();
        self.elapsed_ms = 0;

        debug!(
            "Phase transition: {} -> {}",
            self.table[from].name, self.table[self.current].name
        );

        let target = self.table[self.current].colours;
        self.show(target, false, out);
        Some(PhaseChange {
            from,
            to: self.current,
        })
    }

    /// Freeze the phase timer.  Position and elapsed time are kept.
    pub fn suspend(&mut self) {
        if !self.suspended {
            debug!("Cycle suspended in phase {}", self.phase_name());
        }
        self.suspended = true;
    }

    /// Unfreeze the phase timer and restore the stored phase colours.
    pub fn resume(&mut self, out: &mut impl SignalPort) {
        if self.suspended {
            debug!("Cycle resumed in phase {}", self.phase_name());
        }
        self.suspended = false;
        let target = self.table[self.current].colours;
        self.show(target, false, out);
    }

    /// Restart from phase 0 with a fresh timer and apply it.
    pub fn reset(&mut self, out: &mut impl SignalPort) {
        info!("Cycle reset to phase {}", self.table[0].name);
        self.current = 0;
        self.elapsed_ms = 0;
        self.suspended = false;
        let target = self.table[0].colours;
        self.show(target, false, out);
    }

    /// Move back to phase 0 with a fresh timer, without writing outputs.
    ///
    /// The suspend state is kept, so a held override can take the lamps
    /// while the stored position is already at the start of the cycle.
    pub fn rewind(&mut self) {
        debug!("Cycle rewound to phase {}", self.table[0].name);
        self.current = 0;
        self.elapsed_ms = 0;
    }

    /// Drive one intersection directly without touching the phase table.
    ///
    /// Returns `false` if the intersection is not wired.  A request that
    /// would conflict with another head is screened to all-RED.
    pub fn force_state(
        &mut self,
        id: IntersectionId,
        colour: SignalColor,
        out: &mut impl SignalPort,
    ) -> bool {
        if id.index() >= self.heads {
            warn!("force_state: intersection {id} is not wired");
            return false;
        }
        let mut target = self.colours();
        target[id.index()] = colour;
        self.show(target, false, out);
        true
    }

    /// Drive every wired head to the same colour (night blink, shutdown).
    pub fn show_all(&mut self, colour: SignalColor, out: &mut impl SignalPort) {
        let mut target = self.colours();
        target[..self.heads].fill(colour);
        self.show(target, false, out);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn phase_index(&self) -> usize {
        self.current
    }

    pub fn phase_name(&self) -> &'static str {
        self.table[self.current].name
    }

    pub fn phase_count(&self) -> usize {
        self.table.len()
    }

    /// Time spent in the current phase (ms).
    pub fn phase_elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Number of wired intersections.
    pub fn heads(&self) -> usize {
        self.heads
    }

    /// Colours on the lamps.  Unwired slots read `Off`.
    pub fn colours(&self) -> [SignalColor; MAX_INTERSECTIONS] {
        self.intersections.map(|i| i.colour)
    }

    /// Live state of the wired intersections.
    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections[..self.heads]
    }

    /// Collect a screened safety fault, if one was raised.
    pub fn take_fault(&mut self) -> Option<SafetyFault> {
        self.supervisor.take_fault()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Screen `target` and write the heads that differ from what is lit.
    /// `all` rewrites every wired head regardless.
    fn show(
        &mut self,
        mut target: [SignalColor; MAX_INTERSECTIONS],
        all: bool,
        out: &mut impl SignalPort,
    ) {
        let heads = self.heads;
        self.supervisor.screen(&mut target[..heads]);

        // Revoke before granting: heads leaving GREEN first, then the
        // remaining non-GREEN targets, GREEN last.
        for pass in 0..3 {
            for (slot, colour) in self.intersections[..heads].iter_mut().zip(target) {
                let stage = if colour == SignalColor::Green {
                    2
                } else if slot.colour == SignalColor::Green {
                    0
                } else {
                    1
                };
                if stage != pass {
                    continue;
                }
                if all || slot.colour != colour {
                    out.apply(slot.id, colour);
                    if slot.colour != colour {
                        slot.colour = colour;
                        slot.since_ms = self.now_ms;
                    }
                }
            }
        }
    }
}
