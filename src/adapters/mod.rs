//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `hardware`     | SensorPort         | ESP32 ADC (LDR)          |
//! |                | SignalPort         | ESP32 GPIO (lamp heads)  |
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `mqtt`         | EventSink          | MQTT broker (telemetry)  |
//! |                | command producer   | `channels::COMMAND_CHANNEL` |
//! | `time`         | monotonic clock    | ESP32 system timer       |
//! | `wifi`         | ConnectivityPort   | ESP-IDF WiFi STA         |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub(super) mod utils;
pub mod wifi;
