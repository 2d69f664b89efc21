//! Integration tests for the Controller → CycleFsm → lamps pipeline.
//!
//! Ticks are driven either directly or through the `TickScheduler`, the
//! way the firmware loop drives them.

use super::mock_hw::{MockHardware, RecordingSink};

use trafficctl::app::events::AppEvent;
use trafficctl::app::service::Controller;
use trafficctl::arbiter::OperatingMode;
use trafficctl::channels::{CommandChannel, enqueue_command};
use trafficctl::config::{CycleLayout, SystemConfig};
use trafficctl::scheduler::TickScheduler;
use trafficctl::signal::IntersectionId;
use trafficctl::signal::SignalColor::{Green, Off, Red, Yellow};

const TICK: u32 = 100;

fn started(config: SystemConfig) -> (Controller, MockHardware, RecordingSink) {
    let mut ctl = Controller::new(config).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    ctl.start(&mut hw, &mut sink);
    (ctl, hw, sink)
}

fn run_ticks(ctl: &mut Controller, hw: &mut MockHardware, sink: &mut RecordingSink, n: usize) {
    for _ in 0..n {
        ctl.tick(TICK, None, hw, sink);
    }
}

#[test]
fn start_lights_first_phase() {
    let (ctl, hw, sink) = started(SystemConfig::default());
    assert_eq!(hw.lamps(), [Some(Green), Some(Red)]);
    assert_eq!(ctl.mode(), OperatingMode::NormalCycle);
    assert_eq!(
        sink.events,
        vec![AppEvent::Started {
            mode: OperatingMode::NormalCycle,
            phase: "A-green/B-red",
        }]
    );
}

#[test]
fn first_tick_starts_implicitly() {
    let mut ctl = Controller::new(SystemConfig::default()).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    ctl.tick(TICK, None, &mut hw, &mut sink);
    assert!(matches!(sink.events[0], AppEvent::Started { .. }));
    assert_eq!(hw.lamps(), [Some(Green), Some(Red)]);
}

#[test]
fn coupled_pair_runs_full_cycle_in_order() {
    let (mut ctl, mut hw, mut sink) = started(SystemConfig::default());
    // 3 s green + 1 s yellow per approach at 100 ms ticks.
    run_ticks(&mut ctl, &mut hw, &mut sink, 80);
    assert_eq!(
        sink.phase_changes(),
        vec!["A-yellow/B-red", "A-red/B-green", "A-red/B-yellow", "A-green/B-red"]
    );
    assert_eq!(ctl.phase_index(), 0);
    assert_eq!(hw.conflicts, 0);
}

#[test]
fn phase_boundaries_fall_on_configured_durations() {
    let (mut ctl, mut hw, mut sink) = started(SystemConfig::default());
    run_ticks(&mut ctl, &mut hw, &mut sink, 29);
    assert_eq!(ctl.phase_name(), "A-green/B-red");
    run_ticks(&mut ctl, &mut hw, &mut sink, 1);
    assert_eq!(ctl.phase_name(), "A-yellow/B-red");
    assert_eq!(hw.lamps(), [Some(Yellow), Some(Red)]);
    run_ticks(&mut ctl, &mut hw, &mut sink, 10);
    assert_eq!(hw.lamps(), [Some(Red), Some(Green)]);
}

#[test]
fn late_tick_advances_one_phase_only() {
    let (mut ctl, mut hw, mut sink) = started(SystemConfig::default());
    ctl.tick(60_000, None, &mut hw, &mut sink);
    assert_eq!(ctl.phase_index(), 1);
    assert_eq!(sink.phase_changes(), vec!["A-yellow/B-red"]);
    // The yellow that follows still lasts its full duration.
    ctl.tick(900, None, &mut hw, &mut sink);
    assert_eq!(ctl.phase_index(), 1);
}

#[test]
fn green_never_goes_straight_to_red() {
    let (mut ctl, mut hw, mut sink) = started(SystemConfig::default());
    run_ticks(&mut ctl, &mut hw, &mut sink, 400);
    for id in IntersectionId::ALL {
        let history: Vec<_> = hw
            .writes
            .iter()
            .filter(|(h, _)| *h == id)
            .map(|(_, c)| *c)
            .collect();
        for pair in history.windows(2) {
            if pair[0] == Green {
                assert_eq!(pair[1], Yellow, "head {id}: {history:?}");
            }
        }
    }
}

#[test]
fn single_layout_cycles_one_head() {
    let config = SystemConfig {
        layout: CycleLayout::Single,
        ..SystemConfig::default()
    };
    let (mut ctl, mut hw, mut sink) = started(config);
    assert_eq!(hw.lamps(), [Some(Green), None]);

    run_ticks(&mut ctl, &mut hw, &mut sink, 70);
    assert_eq!(sink.phase_changes(), vec!["yellow", "red", "green"]);
    assert_eq!(ctl.colours(), [Green, Off]);
    assert!(hw.writes.iter().all(|(id, _)| *id == IntersectionId::One));
}

#[test]
fn single_layout_ignores_second_intersection() {
    let config = SystemConfig {
        layout: CycleLayout::Single,
        ..SystemConfig::default()
    };
    let (mut ctl, mut hw, mut sink) = started(config);
    ctl.tick(TICK, Some(b"CONJUNTO_2"), &mut hw, &mut sink);
    assert_eq!(ctl.mode(), OperatingMode::NormalCycle);
    assert_eq!(sink.count(|e| *e == AppEvent::CommandIgnored), 1);

    ctl.tick(TICK, Some(b"CONJUNTO_1"), &mut hw, &mut sink);
    assert_eq!(ctl.mode(), OperatingMode::RemoteOverride);
    assert_eq!(hw.lamp(IntersectionId::One), Some(Green));
}

#[test]
fn telemetry_once_per_tick_carries_raw_reading() {
    let (mut ctl, mut hw, mut sink) = started(SystemConfig::default());
    hw.steady_raw = 1234;
    run_ticks(&mut ctl, &mut hw, &mut sink, 5);

    let telemetry: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(t.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(telemetry.len(), 5);
    assert_eq!(telemetry[4].tick, 5);
    assert_eq!(telemetry[4].payload().as_str(), "1234");
    assert_eq!(telemetry[4].mode, OperatingMode::NormalCycle);
}

#[test]
fn telemetry_cadence_is_configurable() {
    let config = SystemConfig {
        telemetry_every_ticks: 10,
        ..SystemConfig::default()
    };
    let (mut ctl, mut hw, mut sink) = started(config);
    run_ticks(&mut ctl, &mut hw, &mut sink, 35);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 3);
}

#[test]
fn shutdown_drives_every_head_red() {
    let (mut ctl, mut hw, mut sink) = started(SystemConfig::default());
    ctl.tick(TICK, Some(b"CONJUNTO_2"), &mut hw, &mut sink);
    assert_eq!(hw.lamps(), [Some(Red), Some(Green)]);

    ctl.shutdown(&mut hw, &mut sink);
    assert_eq!(hw.lamps(), [Some(Red), Some(Red)]);
    assert_eq!(sink.events.last(), Some(&AppEvent::Shutdown));
    assert_eq!(hw.conflicts, 0);
}

#[test]
fn invalid_config_is_rejected() {
    let config = SystemConfig {
        night_below: 400,
        day_above: 300,
        ..SystemConfig::default()
    };
    assert!(Controller::new(config).is_err());
}

// ── Scheduler-driven ──────────────────────────────────────────

#[test]
fn scheduler_ticks_on_interval_only() {
    let ch = CommandChannel::new();
    let mut sched = TickScheduler::new(TICK);
    let (mut ctl, mut hw, mut sink) = started(SystemConfig::default());

    assert!(!sched.run(0, &mut ctl, &ch, &mut hw, &mut sink), "first call arms");
    assert!(!sched.run(50, &mut ctl, &ch, &mut hw, &mut sink));
    assert!(sched.run(100, &mut ctl, &ch, &mut hw, &mut sink));
    assert!(!sched.run(150, &mut ctl, &ch, &mut hw, &mut sink));
    assert!(sched.run(230, &mut ctl, &ch, &mut hw, &mut sink));
    assert_eq!(ctl.tick_count(), 2);
    assert_eq!(ctl.uptime_ms(), 230);
}

#[test]
fn scheduler_feeds_one_command_per_tick() {
    let ch = CommandChannel::new();
    let mut sched = TickScheduler::new(TICK);
    let (mut ctl, mut hw, mut sink) = started(SystemConfig::default());
    assert!(enqueue_command(&ch, b"CONJUNTO_2"));
    assert!(enqueue_command(&ch, b"CICLO_NORMAL"));

    sched.run(0, &mut ctl, &ch, &mut hw, &mut sink);
    sched.run(100, &mut ctl, &ch, &mut hw, &mut sink);
    assert_eq!(ctl.mode(), OperatingMode::RemoteOverride);
    assert_eq!(hw.lamps(), [Some(Red), Some(Green)]);

    sched.run(200, &mut ctl, &ch, &mut hw, &mut sink);
    assert_eq!(ctl.mode(), OperatingMode::NormalCycle);
    assert_eq!(hw.lamps(), [Some(Green), Some(Red)]);
    assert!(ch.try_receive().is_err());
    assert_eq!(hw.conflicts, 0);
}

#[test]
fn scheduler_catches_up_after_stall() {
    let ch = CommandChannel::new();
    let mut sched = TickScheduler::new(TICK);
    let (mut ctl, mut hw, mut sink) = started(SystemConfig::default());
    sched.run(0, &mut ctl, &ch, &mut hw, &mut sink);
    // A 10 s stall is one tick, one phase step.
    assert!(sched.run(10_000, &mut ctl, &ch, &mut hw, &mut sink));
    assert_eq!(ctl.phase_index(), 1);
    assert_eq!(ctl.tick_count(), 1);
}
