//! Inbound remote commands.
//!
//! The transport delivers raw payloads; [`RemoteCommand::parse`] maps the
//! exact recognised tokens to directives for the mode arbiter.  Anything
//! else, including invalid UTF-8, is "no command" and never an error.

use core::fmt;

use crate::signal::IntersectionId;

/// Give right-of-way to intersection 1.
pub const TOKEN_FAVOR_ONE: &str = "CONJUNTO_1";
/// Give right-of-way to intersection 2.
pub const TOKEN_FAVOR_TWO: &str = "CONJUNTO_2";
/// Leave override and continue the stored cycle.
pub const TOKEN_RESUME: &str = "CICLO_NORMAL";
/// Leave override and restart the cycle at phase 1.
pub const TOKEN_RESET: &str = "CICLO_REINICIAR";

/// Directives the outside world can send to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Force the given intersection GREEN and the other RED.
    Favor(IntersectionId),
    /// Return to the timed cycle where it left off.
    ResumeCycle,
    /// Return to the timed cycle from its first phase.
    ResetCycle,
}

impl RemoteCommand {
    /// Exact, case-sensitive match against the command vocabulary.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let text = core::str::from_utf8(payload).ok()?;
        match text {
            TOKEN_FAVOR_ONE => Some(Self::Favor(IntersectionId::One)),
            TOKEN_FAVOR_TWO => Some(Self::Favor(IntersectionId::Two)),
            TOKEN_RESUME => Some(Self::ResumeCycle),
            TOKEN_RESET => Some(Self::ResetCycle),
            _ => None,
        }
    }

    /// The wire token for this command.
    pub fn token(self) -> &'static str {
        match self {
            Self::Favor(IntersectionId::One) => TOKEN_FAVOR_ONE,
            Self::Favor(IntersectionId::Two) => TOKEN_FAVOR_TWO,
            Self::ResumeCycle => TOKEN_RESUME,
            Self::ResetCycle => TOKEN_RESET,
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
