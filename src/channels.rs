//! Inbound command queue.
//!
//! Uses an `embassy-sync` bounded channel to bridge the transport
//! callback (its own task) with the synchronous tick loop.  The transport
//! is the only producer and the tick loop the only consumer; it takes at
//! most one payload per tick.
//!
//! ```text
//! ┌──────────────┐  CommandPayload  ┌──────────────┐
//! │  MQTT task   │─────────────────▶│  Tick loop   │
//! │  (callback)  │                  │  (sync)      │
//! └──────────────┘                  └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use log::warn;

/// Longest payload accepted from the transport.
pub const MAX_COMMAND_LEN: usize = 64;

/// Queue depth.  Commands beyond this are dropped, not blocked on.
pub const COMMAND_DEPTH: usize = 4;

/// Raw command bytes as received.
pub type CommandPayload = Vec<u8, MAX_COMMAND_LEN>;

pub type CommandChannel = Channel<CriticalSectionRawMutex, CommandPayload, COMMAND_DEPTH>;

/// Inbound command channel: transport → tick loop.
pub static COMMAND_CHANNEL: CommandChannel = Channel::new();

/// Queue a payload without blocking.
///
/// Returns `false` if the payload was dropped (too long or queue full).
pub fn enqueue_command(channel: &CommandChannel, payload: &[u8]) -> bool {
    let Ok(bytes) = CommandPayload::from_slice(payload) else {
        warn!("Dropping {}-byte command: longer than {MAX_COMMAND_LEN}", payload.len());
        return false;
    };
    if channel.try_send(bytes).is_err() {
        warn!("Command queue full, dropping payload");
        return false;
    }
    true
}
