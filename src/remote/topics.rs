//! MQTT topic table.
//!
//! Every topic lives under the device id: requests under
//! `<device>/update/...`, reports under `<device>/hydrapetinfo/...`.

// ── Inbound (subscribed) ───────────────────────────────────────

pub const SET_TIME: &str = "update/set/time";
pub const GET_TIME: &str = "update/get/time";
pub const SET_WATER: &str = "update/set/water";
pub const GET_WATER: &str = "update/get/water";
pub const GET_STATUS: &str = "update/get/status";
pub const SET_ALARM: &str = "update/set/alarm";
pub const GET_ALARMS: &str = "update/get/alarms";
pub const DEL_ALARM: &str = "update/del/alarm";
pub const POUR_WATER: &str = "update/put/pourwater";
pub const SET_TARE: &str = "update/set/tare";
pub const GET_HISTORY: &str = "update/get/history";

pub const INBOUND: [&str; 11] = [
    SET_TIME,
    GET_TIME,
    SET_WATER,
    GET_WATER,
    GET_STATUS,
    SET_ALARM,
    GET_ALARMS,
    DEL_ALARM,
    POUR_WATER,
    SET_TARE,
    GET_HISTORY,
];

// ── Outbound (published) ───────────────────────────────────────

pub const INFO_ALL: &str = "hydrapetinfo/all";
pub const INFO_WATER: &str = "hydrapetinfo/water";
pub const INFO_TIME: &str = "hydrapetinfo/time";
pub const INFO_TANK: &str = "hydrapetinfo/watertanklevel";
pub const INFO_ALARMS: &str = "hydrapetinfo/alarms";
pub const INFO_HISTORY: &str = "hydrapetinfo/history";

/// Topic namespace for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    pub fn new(device_id: &str) -> Self {
        Self {
            prefix: device_id.trim_end_matches('/').to_owned(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.prefix
    }

    /// Absolute topic for a table entry.
    pub fn full(&self, suffix: &str) -> String {
        format!("{}/{}", self.prefix, suffix)
    }

    /// Strip this device's prefix; `None` for foreign topics.
    pub fn route<'a>(&self, topic: &'a str) -> Option<&'a str> {
        topic.strip_prefix(self.prefix.as_str())?.strip_prefix('/')
    }

    /// Every topic the device subscribes to.
    pub fn subscriptions(&self) -> Vec<String> {
        INBOUND.iter().map(|s| self.full(s)).collect()
    }
}
