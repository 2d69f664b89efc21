//! Station link to the intersection's access point.
//!
//! [`WifiAdapter`] sits behind [`ConnectivityPort`].  Association runs in
//! the ESP-IDF WiFi task; [`ConnectivityPort::poll`] only looks at where
//! it got to, so the tick loop never waits on the radio.  Host builds
//! swap the driver for a reachable/unreachable flag.
//!
//! A failed attempt or a dropped link schedules the next attempt through
//! [`ReconnectBackoff`]: 2 s, then 4 s, 8 s, and so on up to the cap
//! (60 s by default).  Waiting is a clock comparison, never a sleep.

use core::fmt;

use log::{error, info, warn};

use super::utils::is_printable_ascii;
use crate::error::{CommsError, Error};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => f.write_str("station has no SSID set"),
            Self::InvalidSsid => f.write_str("SSID must be 1..=32 printable ASCII bytes"),
            Self::InvalidPassword => f.write_str("passphrase must be empty or 8..=64 bytes"),
            Self::ConnectionFailed => f.write_str("association could not be started"),
            Self::AlreadyConnected => f.write_str("link is already up"),
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        match e {
            ConnectivityError::NoCredentials
            | ConnectivityError::InvalidSsid
            | ConnectivityError::InvalidPassword => Self::Config("WiFi credentials"),
            ConnectivityError::ConnectionFailed | ConnectivityError::AlreadyConnected => {
                Self::Comms(CommsError::WifiConnectFailed)
            }
        }
    }
}

pub trait ConnectivityPort {
    /// Start associating.  Returns without waiting for the link.
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Advance the connection state machine.  Never blocks.
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Reconnect backoff
// ───────────────────────────────────────────────────────────────

/// Exponential retry schedule over a monotonic millisecond clock.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    initial_ms: u32,
    max_ms: u32,
    delay_ms: u32,
    next_attempt_ms: Option<u64>,
    failures: u32,
}

impl ReconnectBackoff {
    pub fn new(initial_ms: u32, max_ms: u32) -> Self {
        let initial_ms = initial_ms.max(1);
        Self {
            initial_ms,
            max_ms: max_ms.max(initial_ms),
            delay_ms: initial_ms,
            next_attempt_ms: None,
            failures: 0,
        }
    }

    /// True once the scheduled retry time has passed (or none is scheduled).
    pub fn ready(&self, now_ms: u64) -> bool {
        self.next_attempt_ms.is_none_or(|t| now_ms >= t)
    }

    /// Record a failed attempt and schedule the next one.
    pub fn on_failure(&mut self, now_ms: u64) {
        self.next_attempt_ms = Some(now_ms.saturating_add(u64::from(self.delay_ms)));
        self.failures = self.failures.saturating_add(1);
        self.delay_ms = self.delay_ms.saturating_mul(2).min(self.max_ms);
    }

    /// Record a success; the next failure starts from the initial delay.
    pub fn on_success(&mut self) {
        self.delay_ms = self.initial_ms;
        self.next_attempt_ms = None;
        self.failures = 0;
    }

    /// Delay that the next failure will schedule.
    pub fn current_delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting { since_ms: u64 },
    Connected,
    Reconnecting { attempt: u32 },
}

/// Give up on one association attempt after this long.
const CONNECT_TIMEOUT_MS: u64 = 15_000;

/// SSID: 1..=32 printable bytes.  Passphrase: empty (open AP) or WPA2 length.
fn check_credentials(ssid: &str, password: &str) -> Result<(), ConnectivityError> {
    let ssid_ok = (1..=32).contains(&ssid.len()) && is_printable_ascii(ssid);
    if !ssid_ok {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff: ReconnectBackoff,
    #[cfg(target_os = "espidf")]
    wifi: Option<esp_idf_svc::wifi::EspWifi<'static>>,
    /// Simulation: whether the access point is reachable.
    #[cfg(not(target_os = "espidf"))]
    sim_available: bool,
}

impl WifiAdapter {
    pub fn new(backoff: ReconnectBackoff) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff,
            #[cfg(target_os = "espidf")]
            wifi: None,
            #[cfg(not(target_os = "espidf"))]
            sim_available: true,
        }
    }

    /// Hand over the ESP-IDF driver built in `main`.
    #[cfg(target_os = "espidf")]
    pub fn attach(&mut self, wifi: esp_idf_svc::wifi::EspWifi<'static>) {
        self.wifi = Some(wifi);
    }

    /// Simulate the access point appearing or disappearing.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_available(&mut self, available: bool) {
        self.sim_available = available;
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn backoff(&self) -> &ReconnectBackoff {
        &self.backoff
    }

    fn fail(&mut self, now_ms: u64, attempt: u32) {
        self.backoff.on_failure(now_ms);
        self.state = WifiState::Reconnecting { attempt };
        warn!(
            "WiFi: retry {} in {} ms",
            attempt + 1,
            self.backoff.next_attempt_ms.map_or(0, |t| t.saturating_sub(now_ms))
        );
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let Some(wifi) = self.wifi.as_mut() else {
            error!("WiFi(espidf): driver not attached");
            return Err(ConnectivityError::ConnectionFailed);
        };
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.clone(),
            password: self.password.clone(),
            auth_method,
            ..Default::default()
        });
        wifi.set_configuration(&config)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        if !wifi.is_started().unwrap_or(false) {
            wifi.start().map_err(|_| ConnectivityError::ConnectionFailed)?;
        }
        // esp_wifi_connect returns immediately; the link comes up later.
        wifi.connect().map_err(|_| ConnectivityError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if self.sim_available {
            info!("WiFi(sim): associating with '{}'", self.ssid);
            Ok(())
        } else {
            Err(ConnectivityError::ConnectionFailed)
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(wifi) = self.wifi.as_mut() {
            let _ = wifi.disconnect();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): left '{}'", self.ssid);
    }

    #[cfg(target_os = "espidf")]
    fn platform_link_up(&self) -> bool {
        self.wifi.as_ref().is_some_and(|w| {
            w.is_connected().unwrap_or(false) && w.sta_netif().is_up().unwrap_or(false)
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&self) -> bool {
        self.sim_available
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: associating with '{}'", self.ssid);
        if let Err(e) = self.platform_connect() {
            error!("WiFi: {e}");
            self.fail(now_ms, 0);
            return Err(e);
        }
        self.state = WifiState::Connecting { since_ms: now_ms };
        Ok(())
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.backoff.on_success();
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Disconnected => {}
            WifiState::Connecting { since_ms } => {
                if self.platform_link_up() {
                    self.state = WifiState::Connected;
                    self.backoff.on_success();
                    info!("WiFi: connected");
                } else if now_ms.saturating_sub(since_ms) >= CONNECT_TIMEOUT_MS {
                    warn!("WiFi: association timed out");
                    self.fail(now_ms, 0);
                }
            }
            WifiState::Connected => {
                if !self.platform_link_up() {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.fail(now_ms, 0);
                }
            }
            WifiState::Reconnecting { attempt } => {
                if !self.backoff.ready(now_ms) {
                    return;
                }
                info!(
                    "WiFi: reconnect attempt {} (backoff {} ms)",
                    attempt + 1,
                    self.backoff.current_delay_ms()
                );
                match self.platform_connect() {
                    Ok(()) => self.state = WifiState::Connecting { since_ms: now_ms },
                    Err(_) => self.fail(now_ms, attempt + 1),
                }
            }
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        check_credentials(ssid, password)?;
        self.ssid = heapless::String::try_from(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password =
            heapless::String::try_from(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: station SSID set to '{}'", self.ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
