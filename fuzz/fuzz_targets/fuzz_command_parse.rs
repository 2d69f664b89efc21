//! Fuzz target: `RemoteCommand::parse` and the inbound command queue
//!
//! Drives arbitrary transport payloads through the queue and the parser,
//! asserting that parsing never panics and only the exact tokens match.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use trafficctl::app::commands::RemoteCommand;
use trafficctl::channels::{CommandChannel, MAX_COMMAND_LEN, enqueue_command};

fuzz_target!(|data: &[u8]| {
    if let Some(cmd) = RemoteCommand::parse(data) {
        // Only an exact token round-trips.
        assert_eq!(cmd.token().as_bytes(), data);
    }

    let ch = CommandChannel::new();
    let queued = enqueue_command(&ch, data);
    assert_eq!(queued, data.len() <= MAX_COMMAND_LEN);
    if let Ok(payload) = ch.try_receive() {
        assert_eq!(payload.as_slice(), data, "payloads are never truncated");
        assert_eq!(RemoteCommand::parse(&payload), RemoteCommand::parse(data));
    }
});
