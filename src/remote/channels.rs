//! Inbound message channel.
//!
//! Uses an `embassy-sync` bounded MPMC channel to bridge the MQTT client
//! callback (which must not block) with the dispatcher task.  Messages are
//! copied into fixed-size buffers so the callback never allocates.
//!
//! ```text
//! ┌──────────────┐  InboundMsg  ┌──────────────┐
//! │ MQTT callback│────────────▶│  Dispatcher   │
//! │ (ESP-IDF)    │              │  (blocking)   │
//! └──────────────┘              └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use log::warn;

/// Longest accepted topic, in bytes.
pub const TOPIC_CAPACITY: usize = 128;
/// Longest accepted payload, in bytes.
pub const PAYLOAD_CAPACITY: usize = 256;

/// Channel depth for inbound messages.
const INBOUND_DEPTH: usize = 8;

/// One received MQTT publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMsg {
    pub topic: String<TOPIC_CAPACITY>,
    pub payload: String<PAYLOAD_CAPACITY>,
}

impl InboundMsg {
    /// Copy a received message into fixed buffers.  `None` when either part
    /// is too long or the payload is not UTF-8.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let payload = core::str::from_utf8(payload).ok()?;
        Some(Self {
            topic: String::try_from(topic).ok()?,
            payload: String::try_from(payload).ok()?,
        })
    }
}

pub type InboundChannel = Channel<CriticalSectionRawMutex, InboundMsg, INBOUND_DEPTH>;

/// Inbound message channel: MQTT callback → dispatcher.
pub static INBOUND_CHANNEL: InboundChannel = Channel::new();

/// Non-blocking enqueue used from the MQTT callback.  Oversize and overflow
/// messages are dropped with a warning.
pub fn forward(channel: &InboundChannel, topic: &str, payload: &[u8]) -> bool {
    let Some(msg) = InboundMsg::new(topic, payload) else {
        warn!(
            "MQTT: dropping message on '{}' ({} bytes, limit {} topic / {} payload)",
            topic,
            payload.len(),
            TOPIC_CAPACITY,
            PAYLOAD_CAPACITY
        );
        return false;
    };
    if channel.try_send(msg).is_err() {
        warn!("MQTT: inbound channel full, dropping '{}'", topic);
        return false;
    }
    true
}
