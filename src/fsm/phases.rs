//! Phase table builders.
//!
//! Each phase is a plain descriptor row: a name, a duration, and the
//! colour it imposes on each intersection.  Tables are built once at
//! startup and never change afterwards.
//!
//! ```text
//!  Coupled pair (A = #1, B = #2)
//!
//!   P1 A=GREEN  B=RED    green_ms
//!   P2 A=YELLOW B=RED    yellow_ms
//!   P3 A=RED    B=GREEN  green_ms
//!   P4 A=RED    B=YELLOW yellow_ms ──▶ P1
//!
//!  Single head
//!
//!   G GREEN  green_ms ─▶ Y YELLOW yellow_ms ─▶ R RED red_ms ─▶ G
//! ```

use super::{PhaseDescriptor, PhaseTable};
use crate::config::{CycleLayout, SystemConfig};
use crate::signal::SignalColor::{Green, Off, Red, Yellow};

/// Build the table for the configured layout.
/// Returns the table and the number of intersections it drives.
pub fn build_phase_table(config: &SystemConfig) -> (PhaseTable, usize) {
    match config.layout {
        CycleLayout::CoupledPair => (coupled_pair_table(config), 2),
        CycleLayout::Single => (single_table(config), 1),
    }
}

/// Four-phase cycle for two coupled intersections.
pub fn coupled_pair_table(config: &SystemConfig) -> PhaseTable {
    table_from([
        PhaseDescriptor {
            name: "A-green/B-red",
            duration_ms: config.green_ms,
            colours: [Green, Red],
        },
        PhaseDescriptor {
            name: "A-yellow/B-red",
            duration_ms: config.yellow_ms,
            colours: [Yellow, Red],
        },
        PhaseDescriptor {
            name: "A-red/B-green",
            duration_ms: config.green_ms,
            colours: [Red, Green],
        },
        PhaseDescriptor {
            name: "A-red/B-yellow",
            duration_ms: config.yellow_ms,
            colours: [Red, Yellow],
        },
    ])
}

/// Degenerate three-phase cycle for one stand-alone head.
pub fn single_table(config: &SystemConfig) -> PhaseTable {
    table_from([
        PhaseDescriptor {
            name: "green",
            duration_ms: config.green_ms,
            colours: [Green, Off],
        },
        PhaseDescriptor {
            name: "yellow",
            duration_ms: config.yellow_ms,
            colours: [Yellow, Off],
        },
        PhaseDescriptor {
            name: "red",
            duration_ms: config.red_ms,
            colours: [Red, Off],
        },
    ])
}

fn table_from<const N: usize>(rows: [PhaseDescriptor; N]) -> PhaseTable {
    const { assert!(N <= super::MAX_PHASES) };
    rows.into_iter().collect()
}
