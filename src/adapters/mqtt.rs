//! MQTT client adapter.
//!
//! Implements [`PublishPort`] and feeds received messages into the inbound
//! [`InboundChannel`] for the dispatcher.
//!
//! ```text
//!  broker ──▶ event task ──forward()──▶ InboundChannel ──▶ Dispatcher
//!  AppService ──publish()──▶ MqttAdapter ──▶ broker
//! ```
//!
//! Reports go out at QoS 1, subscriptions use QoS 0.  The event task never
//! calls back into the client: it only forwards messages and tracks the
//! connected flag, and subscriptions are made from the caller's thread.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client`.
//! - **all other targets**: an in-memory broker stand-in that records every
//!   publish and lets tests inject received messages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::app::ports::{PublishPort, TimePort};
use crate::error::CommsError;
use crate::remote::channels::{self, InboundChannel};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
#[cfg(target_os = "espidf")]
use crate::remote::codec::MAX_PAYLOAD_BYTES;

pub struct MqttAdapter {
    #[cfg(not(target_os = "espidf"))]
    inbound: &'static InboundChannel,
    subscriptions: Vec<String>,
    connected: Arc<AtomicBool>,
    #[cfg(target_os = "espidf")]
    client: Mutex<EspMqttClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sent: Mutex<Vec<(String, String)>>,
}

impl MqttAdapter {
    /// Start the client and its event task.  Returns before the broker
    /// connection is up.
    #[cfg(target_os = "espidf")]
    pub fn new(
        broker_uri: &str,
        client_id: &str,
        subscriptions: Vec<String>,
        inbound: &'static InboundChannel,
    ) -> Result<Self, CommsError> {
        use crate::drivers::task_pin::{self, Core};

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            buffer_size: MAX_PAYLOAD_BYTES,
            out_buffer_size: MAX_PAYLOAD_BYTES,
            ..Default::default()
        };
        let (client, mut connection) = EspMqttClient::new(broker_uri, &conf).map_err(|e| {
            log::error!("MQTT: client init failed: {}", e);
            CommsError::MqttInitFailed
        })?;

        let connected = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&connected);
        task_pin::spawn_on_core(Core::Pro, 5, 6, "mqtt_evt\0", move || {
            while let Ok(event) = connection.next() {
                match event.payload() {
                    EventPayload::Connected(_) => {
                        info!("MQTT: connected");
                        flag.store(true, Ordering::Release);
                    }
                    EventPayload::Disconnected => {
                        warn!("MQTT: disconnected");
                        flag.store(false, Ordering::Release);
                    }
                    EventPayload::Received { topic, data, .. } => {
                        channels::forward(inbound, topic.unwrap_or(""), data);
                    }
                    _ => {}
                }
            }
            warn!("MQTT: event loop ended");
        })
        .map_err(|e| {
            log::error!("MQTT: event task spawn failed: {}", e);
            CommsError::MqttInitFailed
        })?;

        info!("MQTT: client started ({})", broker_uri);
        Ok(Self {
            subscriptions,
            connected,
            client: Mutex::new(client),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(
        broker_uri: &str,
        _client_id: &str,
        subscriptions: Vec<String>,
        inbound: &'static InboundChannel,
    ) -> Result<Self, CommsError> {
        info!("MQTT(sim): client started ({})", broker_uri);
        Ok(Self {
            inbound,
            subscriptions,
            connected: Arc::new(AtomicBool::new(true)),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Subscribe to every request topic.  Call once the broker connection
    /// is up.  Fails on the first rejected subscription.
    pub fn subscribe_all(&self) -> Result<(), CommsError> {
        for topic in &self.subscriptions {
            self.platform_subscribe(topic)?;
        }
        info!("MQTT: subscribed to {} topics", self.subscriptions.len());
        Ok(())
    }

    /// One step of the subscription keeper: subscribe after a (re)connect,
    /// forget the subscriptions on disconnect.  Returns the new state.
    pub fn refresh_subscriptions(&self, subscribed: bool) -> bool {
        if !self.is_connected() {
            return false;
        }
        subscribed || self.subscribe_all().is_ok()
    }

    /// Subscription keeper task body.  Never returns.
    pub fn keep_subscribed(&self, clock: &dyn TimePort, poll_ms: u32) -> ! {
        let mut subscribed = false;
        loop {
            subscribed = self.refresh_subscriptions(subscribed);
            clock.sleep_ms(poll_ms);
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_subscribe(&self, topic: &str) -> Result<(), CommsError> {
        let mut client = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        client.subscribe(topic, QoS::AtMostOnce).map_err(|e| {
            warn!("MQTT: subscribe to '{}' failed: {}", topic, e);
            CommsError::MqttSubscribeFailed
        })?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_subscribe(&self, topic: &str) -> Result<(), CommsError> {
        log::debug!("MQTT(sim): subscribed '{}'", topic);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&self, topic: &str, payload: &str) -> Result<(), CommsError> {
        let mut client = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        client
            .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes())
            .map_err(|e| {
                warn!("MQTT: publish to '{}' failed: {}", topic, e);
                CommsError::MqttPublishFailed
            })?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&self, topic: &str, payload: &str) -> Result<(), CommsError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }

    /// Deliver a message as if the broker had sent it.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_receive(&self, topic: &str, payload: &[u8]) -> bool {
        channels::forward(self.inbound, topic, payload)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Everything published so far, oldest first.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl PublishPort for MqttAdapter {
    fn publish(&self, topic: &str, payload: &str) {
        if self.platform_publish(topic, payload).is_ok() {
            info!("MQTT publish: {} -> {}", topic, payload);
        }
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::remote::topics::Topics;

    static TEST_INBOUND: InboundChannel = InboundChannel::new();

    #[test]
    fn records_publishes_and_forwards_received() {
        let topics = Topics::new("hydrapet0001");
        let mqtt = MqttAdapter::new(
            "mqtt://localhost:1883",
            "hydrapet0001",
            topics.subscriptions(),
            &TEST_INBOUND,
        )
        .unwrap();
        assert!(mqtt.is_connected());
        mqtt.subscribe_all().unwrap();

        mqtt.publish("hydrapet0001/hydrapetinfo/water", "{\"water_state\":12}");
        assert_eq!(
            mqtt.sim_sent(),
            vec![(
                "hydrapet0001/hydrapetinfo/water".to_owned(),
                "{\"water_state\":12}".to_owned()
            )]
        );

        assert!(mqtt.sim_receive("hydrapet0001/update/get/time", b""));
        let msg = TEST_INBOUND.try_receive().unwrap();
        assert_eq!(msg.topic.as_str(), "hydrapet0001/update/get/time");
    }

    #[test]
    fn resubscribes_after_reconnect() {
        let mqtt = MqttAdapter::new("mqtt://localhost:1883", "hydrapet0001", Vec::new(), &TEST_INBOUND)
            .unwrap();
        assert!(mqtt.refresh_subscriptions(false));
        mqtt.sim_set_connected(false);
        assert!(!mqtt.refresh_subscriptions(true));
        mqtt.sim_set_connected(true);
        assert!(mqtt.refresh_subscriptions(false));
    }
}
