//! System configuration parameters
//!
//! All tunable parameters for the HydraPet dispenser. The defaults are the
//! values the device ships with; a JSON document may override any subset of
//! them (missing fields fall back to the default).
//!
//! The defaults carry no Wi-Fi credentials, so they do not pass
//! [`SystemConfig::validate`] on their own.  A unit started without
//! credentials runs offline (see `main`).

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Load cell ---
    /// Raw counts per gram after tare subtraction.
    pub counts_per_gram: f32,
    /// DOUT polling interval while waiting for a conversion (milliseconds)
    pub sensor_poll_interval_ms: u32,
    /// Give up on a conversion after this long and report 0 (milliseconds)
    pub sensor_ready_timeout_ms: u32,

    // --- Fill controller ---
    /// Delay between weight checks during a fill (milliseconds)
    pub fill_poll_interval_ms: u32,
    /// Length of the stall-detection window (milliseconds)
    pub stall_window_ms: u32,
    /// Minimum gain within one window for the fill to count as progressing (grams)
    pub stall_min_gain_grams: i32,

    // --- Alarms ---
    /// Alarm scan period (milliseconds)
    pub alarm_scan_interval_ms: u32,
    /// Target used when a set-alarm request omits one (grams)
    pub default_alarm_target_grams: i32,

    // --- Telemetry ---
    /// Periodic status report interval (seconds)
    pub status_interval_secs: u32,
    /// Wait between connectivity checks before a report (milliseconds)
    pub connectivity_retry_ms: u32,

    // --- Water tank ---
    /// Tank level input polling interval (milliseconds)
    pub tank_poll_interval_ms: u32,
    /// Wait between Wi-Fi reconnect attempts after a low-tank edge (milliseconds)
    pub reconnect_retry_ms: u32,

    // --- Network ---
    /// Topic namespace prefix for this unit
    pub device_id: String,
    /// MQTT broker URI
    pub broker_uri: String,
    /// Station SSID; empty means no network was provisioned.
    pub wifi_ssid: String,
    pub wifi_password: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Load cell
            counts_per_gram: 1000.0,
            sensor_poll_interval_ms: 1,
            sensor_ready_timeout_ms: 1000,

            // Fill controller
            fill_poll_interval_ms: 100, // 10 Hz
            stall_window_ms: 3000,
            stall_min_gain_grams: 10,

            // Alarms
            alarm_scan_interval_ms: 1000, // 1 Hz
            default_alarm_target_grams: 200,

            // Telemetry
            status_interval_secs: 60, // 1/min
            connectivity_retry_ms: 2000,

            // Tank
            tank_poll_interval_ms: 100,
            reconnect_retry_ms: 200,

            // Network
            device_id: String::from("hydrapet0001"),
            broker_uri: String::from("mqtt://test.mosquitto.org:1883"),
            wifi_ssid: String::new(),
            wifi_password: String::new(),
        }
    }
}

/// Reasons a configuration document is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid JSON for this schema.
    Malformed,
    /// A field holds a value the firmware cannot run with.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed configuration"),
            Self::ValidationFailed(field) => write!(f, "invalid value for {field}"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Malformed => Self::Config("malformed configuration"),
            ConfigError::ValidationFailed(field) => Self::Config(field),
        }
    }
}

impl SystemConfig {
    /// Parse a JSON override document and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.counts_per_gram.is_finite() && self.counts_per_gram > 0.0) {
            return Err(ConfigError::ValidationFailed("counts_per_gram"));
        }
        if self.sensor_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("sensor_poll_interval_ms"));
        }
        if self.sensor_ready_timeout_ms < self.sensor_poll_interval_ms {
            return Err(ConfigError::ValidationFailed("sensor_ready_timeout_ms"));
        }
        if self.fill_poll_interval_ms == 0 || self.fill_poll_interval_ms > self.stall_window_ms {
            return Err(ConfigError::ValidationFailed("fill_poll_interval_ms"));
        }
        if self.stall_min_gain_grams <= 0 {
            return Err(ConfigError::ValidationFailed("stall_min_gain_grams"));
        }
        if self.alarm_scan_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("alarm_scan_interval_ms"));
        }
        if self.default_alarm_target_grams <= 0 {
            return Err(ConfigError::ValidationFailed("default_alarm_target_grams"));
        }
        if self.status_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("status_interval_secs"));
        }
        if self.device_id.is_empty() || self.device_id.contains(['/', '+', '#']) {
            return Err(ConfigError::ValidationFailed("device_id"));
        }
        if self.broker_uri.is_empty() {
            return Err(ConfigError::ValidationFailed("broker_uri"));
        }
        if !self.has_wifi_credentials() {
            return Err(ConfigError::ValidationFailed("wifi_ssid"));
        }
        Ok(())
    }

    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.trim().is_empty()
    }
}
