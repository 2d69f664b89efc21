//! Trafficctl Firmware: Main Entry Point
//!
//! Hexagonal architecture with a fixed-interval, non-blocking tick loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   MqttAdapter    Esp32Time     │
//! │  (Sensor+Signal)   (EventSink)    (EventSink +   (clock)       │
//! │                                    command feed)               │
//! │  WifiAdapter (Connectivity)                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  CycleFsm · ModeArbiter · AmbientLightMonitor · Safety │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TickScheduler (clock-driven) · COMMAND_CHANNEL (MQTT → loop)  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use trafficctl::adapters::hardware::HardwareAdapter;
use trafficctl::adapters::log_sink::LogEventSink;
use trafficctl::adapters::mqtt::MqttAdapter;
use trafficctl::adapters::time::MonotonicClock;
use trafficctl::adapters::wifi::{ConnectivityPort, ReconnectBackoff, WifiAdapter};
use trafficctl::app::service::Controller;
use trafficctl::channels::COMMAND_CHANNEL;
use trafficctl::config::SystemConfig;
use trafficctl::drivers::{hw_init, watchdog::Watchdog};
use trafficctl::error::Error;
use trafficctl::scheduler::TickScheduler;

/// Main-loop idle between polls.  Well under the tick interval.
const LOOP_IDLE_MS: u32 = 10;

/// Compile-time configuration override, falling back to defaults.
fn load_config() -> SystemConfig {
    let Some(json) = option_env!("TRAFFICCTL_CONFIG_JSON") else {
        info!("Config: defaults");
        return SystemConfig::default();
    };
    match SystemConfig::from_json(json) {
        Ok(cfg) => {
            info!("Config: override applied");
            cfg
        }
        Err(e) => {
            warn!("Config: override rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

/// On panic the controller can no longer be trusted; force RED directly.
fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        hw_init::force_all_red();
        error!("PANIC: {} (all heads forced RED)", info);
        default_hook(info);
    }));
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Trafficctl v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    install_panic_handler();

    // ── 2. Hardware: lamp lines LOW, ADC ready ────────────────
    hw_init::init_peripherals().map_err(Error::from)?;

    // ── 3. Configuration ──────────────────────────────────────
    let config = load_config();
    let mut watchdog = Watchdog::new(config.watchdog_timeout_ms);

    // ── 4. Construct adapters ─────────────────────────────────
    let mut hw = HardwareAdapter::from_pins();
    let mut log_sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut wifi = WifiAdapter::new(ReconnectBackoff::new(
        config.reconnect_initial_ms,
        config.reconnect_max_ms,
    ));
    wifi.attach(EspWifi::new(peripherals.modem, sysloop, Some(nvs))?);
    match (
        option_env!("TRAFFICCTL_WIFI_SSID"),
        option_env!("TRAFFICCTL_WIFI_PASS"),
    ) {
        (Some(ssid), pass) => {
            if let Err(e) = wifi
                .set_credentials(ssid, pass.unwrap_or(""))
                .and_then(|()| wifi.connect(clock.now_ms()))
            {
                // Signals keep cycling offline; poll() retries on backoff.
                warn!("WiFi: {}, continuing offline", e);
            }
        }
        (None, _) => warn!("WiFi: no credentials built in, running offline"),
    }

    let mut mqtt = MqttAdapter::new(
        &COMMAND_CHANNEL,
        ReconnectBackoff::new(config.reconnect_initial_ms, config.reconnect_max_ms),
    );

    // ── 5. Controller ─────────────────────────────────────────
    let mut sched = TickScheduler::new(config.tick_interval_ms);
    let mut controller = Controller::new(config)?;
    controller.start(&mut hw, &mut log_sink);

    info!("System ready. Entering tick loop.");

    // ── 6. Tick loop ──────────────────────────────────────────
    loop {
        let now_ms = clock.now_ms();

        wifi.poll(now_ms);
        mqtt.poll(now_ms, wifi.is_connected());

        let mut sinks = (&mut log_sink, &mut mqtt);
        sched.run(now_ms, &mut controller, &COMMAND_CHANNEL, &mut hw, &mut sinks);

        watchdog.feed();
        FreeRtos::delay_ms(LOOP_IDLE_MS);
    }
}
