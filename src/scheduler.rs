//! Tick scheduler.
//!
//! Turns a free-running main loop into fixed-interval controller ticks by
//! comparing a monotonic clock, never by sleeping.  Each tick pulls at most
//! one queued command payload and hands the real elapsed time to the
//! controller, so a late tick is absorbed by the cycle's one-phase-per-tick
//! catch-up.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  main loop (every few ms)                                    │
//! │                                                              │
//! │   now_ms ──▶ TickScheduler::due ──[interval reached]──┐      │
//! │                                                       ▼      │
//! │   COMMAND_CHANNEL ──try_receive (≤ 1)──▶ Controller::tick    │
//! │                                                              │
//! │   transport / watchdog keep running between ticks            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use log::debug;

use crate::app::ports::{EventSink, SensorPort, SignalPort};
use crate::app::service::Controller;
use crate::channels::CommandChannel;

/// Fixed-interval tick source over a monotonic millisecond clock.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval_ms: u32,
    /// Clock value of the last tick.  `None` until armed.
    last_tick_ms: Option<u64>,
}

impl TickScheduler {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            last_tick_ms: None,
        }
    }

    /// Returns the elapsed time if a tick is due at `now_ms`.
    ///
    /// The first call arms the scheduler and returns `None`.
    pub fn due(&mut self, now_ms: u64) -> Option<u32> {
        let Some(last) = self.last_tick_ms else {
            self.last_tick_ms = Some(now_ms);
            return None;
        };
        let elapsed = now_ms.saturating_sub(last);
        if elapsed < u64::from(self.interval_ms) {
            return None;
        }
        if elapsed > 2 * u64::from(self.interval_ms) {
            debug!("Tick late by {} ms", elapsed - u64::from(self.interval_ms));
        }
        self.last_tick_ms = Some(now_ms);
        Some(u32::try_from(elapsed).unwrap_or(u32::MAX))
    }

    /// Run one controller tick if due.  Returns `true` if a tick ran.
    pub fn run(
        &mut self,
        now_ms: u64,
        controller: &mut Controller,
        commands: &CommandChannel,
        hw: &mut (impl SensorPort + SignalPort),
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(elapsed) = self.due(now_ms) else {
            return false;
        };
        let payload = commands.try_receive().ok();
        controller.tick(elapsed, payload.as_deref(), hw, sink);
        true
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
