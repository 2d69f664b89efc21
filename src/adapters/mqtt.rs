//! MQTT transport adapter.
//!
//! Subscribes to the command topic and hands every inbound payload to
//! the [`CommandChannel`] without interpreting it; the tick loop parses it
//! on its own schedule.  Implements [`EventSink`] so telemetry snapshots
//! are published as plain-text readings.
//!
//! The ESP-IDF client runs its own task and reconnects to the broker on
//! its own once created.  This adapter only (re)creates the client and
//! re-subscribes after each `Connected` event, both gated by a
//! [`ReconnectBackoff`] so the main loop never sleeps on the network.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: an in-process broker stand-in for host tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use super::wifi::ReconnectBackoff;
use crate::app::events::{AppEvent, TELEMETRY_PAYLOAD_LEN};
use crate::app::ports::EventSink;
use crate::channels::{CommandChannel, enqueue_command};
use crate::error::CommsError;

/// Inbound command topic.
pub const TOPIC_COMMANDS: &str = "controle/leds";
/// Outbound light-reading topic.
pub const TOPIC_TELEMETRY: &str = "controle/ldr";

pub const CLIENT_ID: &str = "trafficctl";

const DEFAULT_BROKER_URL: &str = "mqtt://broker.local:1883";

/// Broker URL baked in at build time (`TRAFFICCTL_MQTT_URL`).
pub fn broker_url() -> &'static str {
    option_env!("TRAFFICCTL_MQTT_URL").unwrap_or(DEFAULT_BROKER_URL)
}

/// Route one received message.  Only the command topic reaches the queue.
///
/// Returns `true` if the payload was queued.
pub fn route_inbound(channel: &CommandChannel, topic: Option<&str>, data: &[u8]) -> bool {
    match topic {
        Some(TOPIC_COMMANDS) => enqueue_command(channel, data),
        other => {
            debug!("MQTT: ignoring message on {:?}", other);
            false
        }
    }
}

/// Session flags written by the client task, read by the main loop.
#[derive(Debug, Default)]
struct LinkFlags {
    connected: AtomicBool,
    resubscribe: AtomicBool,
}

impl LinkFlags {
    fn on_connected(&self) {
        self.connected.store(true, Ordering::Release);
        self.resubscribe.store(true, Ordering::Release);
    }

    fn on_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

pub struct MqttAdapter {
    channel: &'static CommandChannel,
    link: Arc<LinkFlags>,
    backoff: ReconnectBackoff,
    subscribed: bool,
    was_connected: bool,
    published: u32,
    dropped: u32,
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

impl MqttAdapter {
    pub fn new(channel: &'static CommandChannel, backoff: ReconnectBackoff) -> Self {
        Self {
            channel,
            link: Arc::new(LinkFlags::default()),
            backoff,
            subscribed: false,
            was_connected: false,
            published: 0,
            dropped: 0,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker::default(),
        }
    }

    /// Broker session up and command topic subscribed.
    pub fn is_connected(&self) -> bool {
        self.link.connected.load(Ordering::Acquire) && self.subscribed
    }

    /// Telemetry messages handed to the client since boot.
    pub fn published(&self) -> u32 {
        self.published
    }

    /// Telemetry messages dropped because the session was down.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Advance session management.  `network_up` is the WiFi link state.
    ///
    /// Never blocks: the client is created or re-subscribed only when the
    /// backoff allows it.
    pub fn poll(&mut self, now_ms: u64, network_up: bool) {
        let connected = self.link.connected.load(Ordering::Acquire);
        if connected != self.was_connected {
            self.was_connected = connected;
            if connected {
                info!("MQTT: session up ({})", broker_url());
            } else {
                warn!("MQTT: session lost");
                self.subscribed = false;
            }
        }

        if !network_up || !self.backoff.ready(now_ms) {
            return;
        }

        if !self.has_client() {
            match self.platform_create() {
                Ok(()) => info!("MQTT: client started for {}", broker_url()),
                Err(e) => {
                    warn!("MQTT: {}", e);
                    self.backoff.on_failure(now_ms);
                }
            }
            return;
        }

        if connected && self.link.resubscribe.swap(false, Ordering::AcqRel) {
            match self.platform_subscribe() {
                Ok(()) => {
                    self.subscribed = true;
                    self.backoff.on_success();
                    info!("MQTT: subscribed to {}", TOPIC_COMMANDS);
                }
                Err(e) => {
                    warn!("MQTT: {}", e);
                    self.link.resubscribe.store(true, Ordering::Release);
                    self.backoff.on_failure(now_ms);
                }
            }
        }
    }

    /// Queue a payload for publication on `topic`.
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.is_connected() {
            self.dropped = self.dropped.saturating_add(1);
            return Err(CommsError::MqttPublishFailed);
        }
        self.platform_publish(topic, payload)?;
        self.published = self.published.saturating_add(1);
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn has_client(&self) -> bool {
        self.client.is_some()
    }

    #[cfg(target_os = "espidf")]
    fn platform_create(&mut self) -> Result<(), CommsError> {
        use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};

        let conf = MqttClientConfiguration {
            client_id: Some(CLIENT_ID),
            username: option_env!("TRAFFICCTL_MQTT_USER"),
            password: option_env!("TRAFFICCTL_MQTT_PASS"),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let link = Arc::clone(&self.link);
        let channel = self.channel;
        let client = EspMqttClient::new_cb(broker_url(), &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => link.on_connected(),
                EventPayload::Disconnected => link.on_disconnected(),
                EventPayload::Received { topic, data, .. } => {
                    route_inbound(channel, topic, data);
                }
                _ => {}
            }
        })
        .map_err(|e| {
            log::error!("MQTT(espidf): client init failed: {:?}", e);
            CommsError::MqttConnectFailed
        })?;
        self.client = Some(client);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_subscribe(&mut self) -> Result<(), CommsError> {
        use esp_idf_svc::mqtt::client::QoS;

        let client = self.client.as_mut().ok_or(CommsError::MqttSubscribeFailed)?;
        client
            .subscribe(TOPIC_COMMANDS, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|_| CommsError::MqttSubscribeFailed)
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        use esp_idf_svc::mqtt::client::QoS;

        let client = self.client.as_mut().ok_or(CommsError::MqttPublishFailed)?;
        // enqueue hands the message to the outbox and returns immediately.
        client
            .enqueue(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| CommsError::MqttPublishFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn has_client(&self) -> bool {
        self.sim.client
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_create(&mut self) -> Result<(), CommsError> {
        if !self.sim.reachable {
            return Err(CommsError::MqttConnectFailed);
        }
        self.sim.client = true;
        self.link.on_connected();
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_subscribe(&mut self) -> Result<(), CommsError> {
        if self.sim.reject_subscribe {
            return Err(CommsError::MqttSubscribeFailed);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let text = core::str::from_utf8(payload).map_err(|_| CommsError::MqttPublishFailed)?;
        let mut msg = heapless::String::new();
        msg.push_str(text).map_err(|_| CommsError::MqttPublishFailed)?;
        self.sim.outbox.push((topic.to_owned(), msg));
        Ok(())
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
struct SimBroker {
    reachable: bool,
    reject_subscribe: bool,
    client: bool,
    outbox: Vec<(String, heapless::String<TELEMETRY_PAYLOAD_LEN>)>,
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimBroker {
    fn default() -> Self {
        Self {
            reachable: true,
            reject_subscribe: false,
            client: false,
            outbox: Vec::new(),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    /// Make the broker reachable or drop the session, as the client task would report.
    pub fn sim_set_reachable(&mut self, reachable: bool) {
        self.sim.reachable = reachable;
        if !self.sim.client {
            return;
        }
        if reachable {
            self.link.on_connected();
        } else {
            self.link.on_disconnected();
        }
    }

    pub fn sim_reject_subscribe(&mut self, reject: bool) {
        self.sim.reject_subscribe = reject;
    }

    /// Deliver a message as the client callback would.
    pub fn sim_deliver(&self, topic: &str, data: &[u8]) -> bool {
        route_inbound(self.channel, Some(topic), data)
    }

    /// Messages published so far, oldest first.
    pub fn sim_outbox(&self) -> &[(String, heapless::String<TELEMETRY_PAYLOAD_LEN>)] {
        &self.sim.outbox
    }
}

// ── EventSink ─────────────────────────────────────────────────

impl EventSink for MqttAdapter {
    fn emit(&mut self, event: &AppEvent) {
        if let AppEvent::Telemetry(t) = event {
            let payload = t.payload();
            if let Err(e) = self.publish(TOPIC_TELEMETRY, payload.as_bytes()) {
                debug!("MQTT: telemetry {} not sent: {}", payload, e);
            }
        }
    }
}
