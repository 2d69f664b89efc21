//! Mode arbiter.
//!
//! Decides each tick who drives the lamps: the timed cycle, the night
//! blink routine, or a remote override.
//!
//! ```text
//!  Priority (highest first)
//!
//!  1. NIGHT                      ─▶ NIGHT_BLINK     cycle suspended, commands held
//!  2. DAY + favor N              ─▶ REMOTE_OVERRIDE N GREEN, other RED
//!  3. DAY + resume / reset       ─▶ NORMAL_CYCLE    cycle resumed (or restarted)
//!     DAY leaving NIGHT_BLINK    ─▶ held override, else NORMAL_CYCLE
//!  4. otherwise                  ─▶ stay; NORMAL_CYCLE ticks the cycle
//! ```
//!
//! Entering the mode that is already active writes nothing beyond the
//! mode's own steady state.

use core::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::ambient::LightLevel;
use crate::app::commands::RemoteCommand;
use crate::app::ports::SignalPort;
use crate::blink::NightBlinker;
use crate::fsm::{CycleFsm, PhaseChange};
use crate::signal::{IntersectionId, SignalColor};

/// Who is authoritative over the lamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperatingMode {
    #[default]
    NormalCycle,
    NightBlink,
    RemoteOverride,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NormalCycle => "NormalCycle",
            Self::NightBlink => "NightBlink",
            Self::RemoteOverride => "RemoteOverride",
        })
    }
}

/// What happened to the command offered this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandDisposition {
    Accepted(RemoteCommand),
    /// Held until the light returns to DAY.
    Deferred(RemoteCommand),
    /// Recognised but not applicable (e.g. an unwired intersection).
    Rejected(RemoteCommand),
}

/// Result of one arbitration step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArbiterOutcome {
    /// `(from, to)` when the mode changed.
    pub mode_change: Option<(OperatingMode, OperatingMode)>,
    pub phase_change: Option<PhaseChange>,
    pub command: Option<CommandDisposition>,
}

/// Mode state machine over [`OperatingMode`].
pub struct ModeArbiter {
    mode: OperatingMode,
    /// Override target, active or held through night.
    favored: Option<IntersectionId>,
    /// A reset arrived during night; restart the cycle on DAY.
    reset_pending: bool,
    blinker: NightBlinker,
}

impl ModeArbiter {
    pub fn new(blink_half_period_ms: u32) -> Self {
        Self {
            mode: OperatingMode::NormalCycle,
            favored: None,
            reset_pending: false,
            blinker: NightBlinker::new(blink_half_period_ms),
        }
    }

    /// Run one arbitration step.
    pub fn step(
        &mut self,
        level: LightLevel,
        command: Option<RemoteCommand>,
        elapsed_ms: u32,
        fsm: &mut CycleFsm,
        out: &mut impl SignalPort,
    ) -> ArbiterOutcome {
        let before = self.mode;
        let phase_before = fsm.phase_index();
        let mut outcome = ArbiterOutcome::default();

        match level {
            LightLevel::Night => {
                outcome.command = command.map(|cmd| self.hold(cmd, fsm));
                self.night(elapsed_ms, fsm, out);
            }
            LightLevel::Day => {
                let applied = command.map(|cmd| self.apply(cmd, fsm, out));
                outcome.command = applied;
                let took_effect = matches!(applied, Some(CommandDisposition::Accepted(_)));
                if !took_effect {
                    match self.mode {
                        OperatingMode::NightBlink => self.leave_night(fsm, out),
                        OperatingMode::RemoteOverride => {}
                        OperatingMode::NormalCycle => {
                            outcome.phase_change = fsm.tick(elapsed_ms, out);
                        }
                    }
                } else if before == OperatingMode::NormalCycle
                    && applied == Some(CommandDisposition::Accepted(RemoteCommand::ResumeCycle))
                {
                    // Already cycling: resume is a no-op and time keeps running.
                    outcome.phase_change = fsm.tick(elapsed_ms, out);
                }
            }
        }

        if self.mode != before {
            info!("Mode: {before} -> {}", self.mode);
            outcome.mode_change = Some((before, self.mode));
        }
        if outcome.phase_change.is_none() && fsm.phase_index() != phase_before {
            outcome.phase_change = Some(PhaseChange {
                from: phase_before,
                to: fsm.phase_index(),
            });
        }
        outcome
    }

    /// Drive every head to RED and freeze the cycle.
    ///
    /// Held commands are dropped.  [`mode`](Self::mode) keeps reporting the
    /// mode that was active when the shutdown came in.
    pub fn shutdown(&mut self, fsm: &mut CycleFsm, out: &mut impl SignalPort) {
        fsm.suspend();
        fsm.show_all(SignalColor::Red, out);
        self.favored = None;
        self.reset_pending = false;
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Override target, whether active or held through night.
    pub fn favored(&self) -> Option<IntersectionId> {
        self.favored
    }

    // ── Internal ──────────────────────────────────────────────

    fn night(&mut self, elapsed_ms: u32, fsm: &mut CycleFsm, out: &mut impl SignalPort) {
        let colour = if self.mode == OperatingMode::NightBlink {
            self.blinker.advance(elapsed_ms)
        } else {
            fsm.suspend();
            self.blinker.restart();
            self.mode = OperatingMode::NightBlink;
            self.blinker.current()
        };
        fsm.show_all(colour, out);
    }

    /// Remember a command received at night for when DAY returns.
    fn hold(&mut self, cmd: RemoteCommand, fsm: &CycleFsm) -> CommandDisposition {
        match cmd {
            RemoteCommand::Favor(id) if id.index() >= fsm.heads() => {
                warn!("Ignoring {cmd}: intersection {id} is not wired");
                return CommandDisposition::Rejected(cmd);
            }
            RemoteCommand::Favor(id) => self.favored = Some(id),
            RemoteCommand::ResumeCycle => self.favored = None,
            RemoteCommand::ResetCycle => {
                self.favored = None;
                self.reset_pending = true;
            }
        }
        info!("Night blink active, holding {cmd}");
        CommandDisposition::Deferred(cmd)
    }

    fn apply(
        &mut self,
        cmd: RemoteCommand,
        fsm: &mut CycleFsm,
        out: &mut impl SignalPort,
    ) -> CommandDisposition {
        match cmd {
            RemoteCommand::Favor(id) if id.index() >= fsm.heads() => {
                warn!("Ignoring {cmd}: intersection {id} is not wired");
                return CommandDisposition::Rejected(cmd);
            }
            RemoteCommand::Favor(id) => self.enter_override(id, fsm, out),
            RemoteCommand::ResumeCycle => self.enter_normal(false, fsm, out),
            RemoteCommand::ResetCycle => self.enter_normal(true, fsm, out),
        }
        CommandDisposition::Accepted(cmd)
    }

    fn leave_night(&mut self, fsm: &mut CycleFsm, out: &mut impl SignalPort) {
        match self.favored {
            Some(id) => {
                // A reset held alongside the override still applies to the
                // stored position the later resume returns to.
                if self.reset_pending {
                    fsm.rewind();
                    self.reset_pending = false;
                }
                self.enter_override(id, fsm, out);
            }
            None => {
                let reset = self.reset_pending;
                self.enter_normal(reset, fsm, out);
            }
        }
    }

    fn enter_override(&mut self, id: IntersectionId, fsm: &mut CycleFsm, out: &mut impl SignalPort) {
        fsm.suspend();
        // Stop the other approach before granting.
        if id.other().index() < fsm.heads() {
            fsm.force_state(id.other(), SignalColor::Red, out);
        }
        fsm.force_state(id, SignalColor::Green, out);
        self.favored = Some(id);
        self.mode = OperatingMode::RemoteOverride;
    }

    fn enter_normal(&mut self, reset: bool, fsm: &mut CycleFsm, out: &mut impl SignalPort) {
        if reset {
            fsm.reset(out);
        } else if self.mode != OperatingMode::NormalCycle {
            fsm.resume(out);
        }
        self.favored = None;
        self.reset_pending = false;
        self.mode = OperatingMode::NormalCycle;
    }
}
