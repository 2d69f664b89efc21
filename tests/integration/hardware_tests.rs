//! Host-simulated hardware path: HardwareAdapter over the simulated GPIO
//! bank and LDR, and the panic-path RED override.
//!
//! Everything touching the shared simulated GPIO bank lives in one test
//! so parallel test threads never interleave writes.

use super::mock_hw::RecordingSink;

use trafficctl::adapters::hardware::HardwareAdapter;
use trafficctl::app::service::Controller;
use trafficctl::arbiter::OperatingMode;
use trafficctl::config::SystemConfig;
use trafficctl::drivers::hw_init::{self, sim_gpio_level};
use trafficctl::pins;
use trafficctl::sensors::ldr;
use trafficctl::signal::{IntersectionId, SignalColor};

fn lit(pin: i32) -> bool {
    sim_gpio_level(pin)
}

#[test]
fn simulated_board_end_to_end() {
    hw_init::init_peripherals().unwrap();
    let mut hw = HardwareAdapter::from_pins();
    let mut sink = RecordingSink::new();
    let mut ctl = Controller::new(SystemConfig::default()).unwrap();

    // Day: phase 1 on the lamp lines.
    ldr::sim_set_light_raw(3000);
    ctl.tick(100, None, &mut hw, &mut sink);
    assert!(lit(pins::HEAD1_GREEN_GPIO));
    assert!(!lit(pins::HEAD1_RED_GPIO));
    assert!(lit(pins::HEAD2_RED_GPIO));
    assert!(!lit(pins::HEAD2_GREEN_GPIO));
    assert!(!lit(pins::HEAD1_YELLOW_GPIO));
    assert_eq!(ctl.colours()[IntersectionId::One.index()], SignalColor::Green);

    // Override to intersection 2.
    ctl.tick(100, Some(b"CONJUNTO_2"), &mut hw, &mut sink);
    assert!(lit(pins::HEAD1_RED_GPIO));
    assert!(!lit(pins::HEAD1_GREEN_GPIO));
    assert!(lit(pins::HEAD2_GREEN_GPIO));

    // Night: both yellow lines, nothing else.
    ldr::sim_set_light_raw(10);
    ctl.tick(100, None, &mut hw, &mut sink);
    assert_eq!(ctl.mode(), OperatingMode::NightBlink);
    for [r, y, g] in pins::HEAD_GPIOS {
        assert!(lit(y));
        assert!(!lit(r));
        assert!(!lit(g));
    }

    // Panic path: RED straight through GPIO, whatever the controller thinks.
    hw_init::force_all_red();
    for [r, y, g] in pins::HEAD_GPIOS {
        assert!(lit(r));
        assert!(!lit(y));
        assert!(!lit(g));
    }
    assert_eq!(hw.write_failures(), 0);

    ldr::sim_set_light_raw(2048);
}
