//! Integration tests for mode arbitration: ambient light, night blink,
//! and remote overrides interacting through the Controller.

use super::mock_hw::{MockHardware, RecordingSink};

use trafficctl::ambient::LightLevel;
use trafficctl::app::commands::RemoteCommand;
use trafficctl::app::events::AppEvent;
use trafficctl::app::service::Controller;
use trafficctl::arbiter::OperatingMode::{NightBlink, NormalCycle, RemoteOverride};
use trafficctl::config::SystemConfig;
use trafficctl::signal::IntersectionId;
use trafficctl::signal::SignalColor::{Green, Off, Red, Yellow};

const TICK: u32 = 100;
const BRIGHT: i32 = 2048;
const DARK: i32 = 50;

fn rig(raw: i32) -> (Controller, MockHardware, RecordingSink) {
    let mut ctl = Controller::new(SystemConfig::default()).unwrap();
    let mut hw = MockHardware::with_light(raw);
    let mut sink = RecordingSink::new();
    ctl.start(&mut hw, &mut sink);
    (ctl, hw, sink)
}

fn tick(ctl: &mut Controller, hw: &mut MockHardware, sink: &mut RecordingSink, cmd: Option<&[u8]>) {
    ctl.tick(TICK, cmd, hw, sink);
}

// ── Ambient classification ────────────────────────────────────

#[test]
fn hysteresis_scenario_day_day_night_day() {
    let config = SystemConfig {
        night_below: 200,
        day_above: 250,
        ..SystemConfig::default()
    };
    let mut ctl = Controller::new(config).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    hw.queue_readings(&[500, 500, 150, 500]);

    let mut levels = Vec::new();
    for _ in 0..4 {
        ctl.tick(TICK, None, &mut hw, &mut sink);
        levels.push(ctl.light_level());
    }
    use LightLevel::{Day, Night};
    assert_eq!(levels, vec![Day, Day, Night, Day]);
    assert_eq!(
        sink.mode_changes(),
        vec![(NormalCycle, NightBlink), (NightBlink, NormalCycle)]
    );
}

#[test]
fn dead_band_readings_never_flip() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    let cfg = ctl.config().clone();
    let inside = [i32::from(cfg.night_below) + 1, i32::from(cfg.day_above) - 1];
    for i in 0..50 {
        hw.queue_readings(&[inside[i % 2]]);
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    assert_eq!(ctl.light_level(), LightLevel::Day);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::LightChanged { .. })), 0);
}

#[test]
fn sensor_failure_keeps_previous_classification() {
    let (mut ctl, mut hw, mut sink) = rig(DARK);
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.mode(), NightBlink);

    hw.steady_raw = BRIGHT;
    hw.queue_failure();
    hw.queue_failure();
    tick(&mut ctl, &mut hw, &mut sink, None);
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.light_level(), LightLevel::Night);
    assert_eq!(ctl.mode(), NightBlink);

    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.mode(), NormalCycle);
}

#[test]
fn out_of_range_readings_are_clamped() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    hw.queue_readings(&[-40, 99_999]);
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.build_telemetry().light_raw, 0);
    assert_eq!(ctl.light_level(), LightLevel::Night);
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.build_telemetry().light_raw, 4095);
    assert_eq!(ctl.light_level(), LightLevel::Day);
}

// ── Night blink ───────────────────────────────────────────────

#[test]
fn night_blinks_all_heads_yellow_and_off() {
    let (mut ctl, mut hw, mut sink) = rig(DARK);
    let mut seen = Vec::new();
    for _ in 0..40 {
        tick(&mut ctl, &mut hw, &mut sink, None);
        let [a, b] = hw.lamps();
        assert_eq!(a, b, "heads blink together");
        seen.push(a);
    }
    assert_eq!(ctl.mode(), NightBlink);
    assert!(seen.iter().all(|c| matches!(c, Some(Yellow) | Some(Off))));
    // 1 s on / 1 s off: 10 ticks of each.
    assert_eq!(seen.iter().filter(|c| **c == Some(Yellow)).count(), 20);
    assert_eq!(hw.conflicts, 0);
}

#[test]
fn cycle_position_survives_the_night() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    for _ in 0..45 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    assert_eq!(ctl.phase_name(), "A-red/B-green");

    hw.steady_raw = DARK;
    for _ in 0..100 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    assert_eq!(ctl.phase_name(), "A-red/B-green");

    hw.steady_raw = BRIGHT;
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.mode(), NormalCycle);
    assert_eq!(hw.lamps(), [Some(Red), Some(Green)]);
    assert_eq!(ctl.cycle().phase_elapsed_ms(), 500);
    assert_eq!(hw.conflicts, 0);
}

// ── Remote override ───────────────────────────────────────────

#[test]
fn conjunto_1_overrides_within_the_same_tick() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CONJUNTO_1"));
    assert_eq!(ctl.mode(), RemoteOverride);
    assert_eq!(hw.lamps(), [Some(Green), Some(Red)]);
    assert_eq!(sink.mode_changes(), vec![(NormalCycle, RemoteOverride)]);
    assert_eq!(
        sink.count(|e| *e == AppEvent::CommandAccepted(RemoteCommand::Favor(IntersectionId::One))),
        1
    );
}

#[test]
fn override_holds_while_day() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CONJUNTO_2"));
    let writes = hw.writes.len();
    for _ in 0..200 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    assert_eq!(ctl.mode(), RemoteOverride);
    assert_eq!(hw.lamps(), [Some(Red), Some(Green)]);
    assert_eq!(hw.writes.len(), writes, "no writes while holding");
}

#[test]
fn switching_favored_intersection_never_double_greens() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    for cmd in [b"CONJUNTO_1", b"CONJUNTO_2", b"CONJUNTO_1", b"CONJUNTO_2"] {
        tick(&mut ctl, &mut hw, &mut sink, Some(&cmd[..]));
    }
    assert_eq!(hw.lamps(), [Some(Red), Some(Green)]);
    assert_eq!(hw.conflicts, 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SafetyFault(_))), 0);
}

#[test]
fn favor_at_night_waits_for_day() {
    let (mut ctl, mut hw, mut sink) = rig(DARK);
    tick(&mut ctl, &mut hw, &mut sink, None);
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CONJUNTO_2"));
    assert_eq!(ctl.mode(), NightBlink);
    assert_eq!(
        sink.count(|e| *e == AppEvent::CommandDeferred(RemoteCommand::Favor(IntersectionId::Two))),
        1
    );
    for _ in 0..30 {
        tick(&mut ctl, &mut hw, &mut sink, None);
        assert_eq!(ctl.mode(), NightBlink);
        assert_ne!(hw.lamp(IntersectionId::Two), Some(Green));
    }

    hw.steady_raw = BRIGHT;
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.mode(), RemoteOverride);
    assert_eq!(hw.lamps(), [Some(Red), Some(Green)]);
}

#[test]
fn override_resumes_after_night() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CONJUNTO_1"));

    hw.steady_raw = DARK;
    for _ in 0..25 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    assert_eq!(ctl.mode(), NightBlink);

    hw.steady_raw = BRIGHT;
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.mode(), RemoteOverride);
    assert_eq!(hw.lamps(), [Some(Green), Some(Red)]);
    assert_eq!(
        sink.mode_changes(),
        vec![
            (NormalCycle, RemoteOverride),
            (RemoteOverride, NightBlink),
            (NightBlink, RemoteOverride),
        ]
    );
    assert_eq!(hw.conflicts, 0);
}

#[test]
fn resume_continues_from_phase_before_override() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    for _ in 0..35 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    assert_eq!(ctl.phase_name(), "A-yellow/B-red");

    tick(&mut ctl, &mut hw, &mut sink, Some(b"CONJUNTO_2"));
    for _ in 0..20 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CICLO_NORMAL"));
    assert_eq!(ctl.mode(), NormalCycle);
    assert_eq!(ctl.phase_name(), "A-yellow/B-red");
    assert_eq!(hw.lamps(), [Some(Yellow), Some(Red)]);
    assert_eq!(hw.conflicts, 0);

    // The remaining 500 ms of yellow run out before the cycle moves on.
    for _ in 0..4 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    assert_eq!(ctl.phase_name(), "A-yellow/B-red");
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.phase_name(), "A-red/B-green");
}

#[test]
fn reset_restarts_from_phase_one() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    for _ in 0..45 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CONJUNTO_1"));
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CICLO_REINICIAR"));
    assert_eq!(ctl.mode(), NormalCycle);
    assert_eq!(ctl.phase_index(), 0);
    assert_eq!(ctl.cycle().phase_elapsed_ms(), 0);
    assert_eq!(hw.lamps(), [Some(Green), Some(Red)]);
}

#[test]
fn reset_at_night_applies_on_day() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    for _ in 0..45 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    hw.steady_raw = DARK;
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CONJUNTO_1"));
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CICLO_REINICIAR"));
    assert_eq!(ctl.mode(), NightBlink);

    hw.steady_raw = BRIGHT;
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.mode(), NormalCycle);
    assert_eq!(ctl.phase_index(), 0);
    assert_eq!(hw.lamps(), [Some(Green), Some(Red)]);
}

#[test]
fn reset_held_with_override_still_applies_on_resume() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    for _ in 0..40 {
        tick(&mut ctl, &mut hw, &mut sink, None);
    }
    assert_eq!(ctl.phase_index(), 2);

    hw.steady_raw = DARK;
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CICLO_REINICIAR"));
    tick(&mut ctl, &mut hw, &mut sink, Some(b"CONJUNTO_1"));
    assert_eq!(ctl.mode(), NightBlink);

    hw.steady_raw = BRIGHT;
    tick(&mut ctl, &mut hw, &mut sink, None);
    assert_eq!(ctl.mode(), RemoteOverride);
    assert_eq!(hw.lamps(), [Some(Green), Some(Red)]);

    tick(&mut ctl, &mut hw, &mut sink, Some(b"CICLO_NORMAL"));
    assert_eq!(ctl.mode(), NormalCycle);
    assert_eq!(ctl.phase_index(), 0);
    assert_eq!(hw.lamps(), [Some(Green), Some(Red)]);
    assert_eq!(hw.conflicts, 0);
}

#[test]
fn unknown_payloads_change_nothing() {
    let (mut ctl, mut hw, mut sink) = rig(BRIGHT);
    let payloads: [&[u8]; 5] = [b"conjunto_1", b"CONJUNTO_1 ", b"CONJUNTO_3", b"", &[0xff, 0xfe]];
    for p in payloads {
        tick(&mut ctl, &mut hw, &mut sink, Some(p));
    }
    assert_eq!(ctl.mode(), NormalCycle);
    assert_eq!(sink.count(|e| *e == AppEvent::CommandIgnored), 5);
    assert_eq!(ctl.cycle().phase_elapsed_ms(), 500, "cycle kept ticking");
}
