//! Fuzz target: `Controller::tick` over arbitrary input sequences
//!
//! Each 4-byte chunk of input is one tick: elapsed time, light reading,
//! sensor failure flag, and an optional command.  After every lamp write
//! the target asserts that no GREEN faces a head that is not RED.
//!
//! cargo fuzz run fuzz_controller

#![no_main]

use libfuzzer_sys::fuzz_target;
use trafficctl::app::events::AppEvent;
use trafficctl::app::ports::{EventSink, SensorPort, SignalPort};
use trafficctl::app::service::Controller;
use trafficctl::config::{CycleLayout, SystemConfig};
use trafficctl::error::SensorError;
use trafficctl::signal::{IntersectionId, MAX_INTERSECTIONS, SignalColor};

const COMMANDS: [&[u8]; 5] = [
    b"CONJUNTO_1",
    b"CONJUNTO_2",
    b"CICLO_NORMAL",
    b"CICLO_REINICIAR",
    b"garbage",
];

#[derive(Default)]
struct Bench {
    raw: i32,
    fail: bool,
    lamps: [Option<SignalColor>; MAX_INTERSECTIONS],
}

impl SensorPort for Bench {
    fn read_light_raw(&mut self) -> Result<i32, SensorError> {
        if self.fail {
            Err(SensorError::AdcReadFailed)
        } else {
            Ok(self.raw)
        }
    }
}

impl SignalPort for Bench {
    fn apply(&mut self, id: IntersectionId, colour: SignalColor) {
        self.lamps[id.index()] = Some(colour);
        let green = self.lamps.contains(&Some(SignalColor::Green));
        let open = self
            .lamps
            .iter()
            .filter(|l| l.is_some_and(|c| c != SignalColor::Red))
            .count();
        assert!(!(green && open > 1), "conflicting lamps: {:?}", self.lamps);
    }
}

struct NoFaults;

impl EventSink for NoFaults {
    fn emit(&mut self, event: &AppEvent) {
        assert!(!matches!(event, AppEvent::SafetyFault(_)), "{event:?}");
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let layout = if first & 1 == 0 {
        CycleLayout::CoupledPair
    } else {
        CycleLayout::Single
    };
    let Ok(mut ctl) = Controller::new(SystemConfig {
        layout,
        ..SystemConfig::default()
    }) else {
        return;
    };
    let mut bench = Bench::default();
    let mut sink = NoFaults;

    for chunk in rest.chunks_exact(4) {
        let elapsed_ms = u32::from(chunk[0]) * 50;
        bench.raw = i32::from(u16::from_le_bytes([chunk[1], chunk[2]])) - 500;
        bench.fail = chunk[3] & 0x80 != 0;
        let command = match chunk[3] & 0x0f {
            n @ 0..=4 => Some(COMMANDS[usize::from(n)]),
            _ => None,
        };
        ctl.tick(elapsed_ms, command, &mut bench, &mut sink);
        assert!(ctl.colours().iter().filter(|c| **c == SignalColor::Green).count() <= 1);
    }
});
