//! Unified error types for the HydraPet firmware.
//!
//! A single `Error` enum that every subsystem can convert into, so the
//! boundaries (message dispatcher, task spawners, `main`) handle failures
//! uniformly.  All variants are `Copy` so they can be logged and returned
//! from any task without allocation.
//!
//! Expected outcomes (sensor timeout, full registry, unknown alarm, empty
//! history) are *not* errors of the firmware: they are signalled through
//! these types as ordinary return values and handled where they occur.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The load cell could not be read.
    Sensor(SensorError),
    /// An alarm registry request could not be honoured.
    Alarm(AlarmError),
    /// A fill request was rejected.
    Dispense(DispenseError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Peripheral or task initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Alarm(e) => write!(f, "alarm: {e}"),
            Self::Dispense(e) => write!(f, "dispense: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// DOUT never went low within the data-ready timeout.
    NotReady,
    /// A GPIO read or write on the HX711 lines failed.
    GpioFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "HX711 data-ready timeout"),
            Self::GpioFailed => write!(f, "HX711 GPIO access failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Alarm registry outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmError {
    /// The registry already holds its maximum number of alarms.
    Full,
    /// No alarm with the requested due time exists.
    NotFound,
}

impl fmt::Display for AlarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "alarm list full"),
            Self::NotFound => write!(f, "alarm not found"),
        }
    }
}

impl From<AlarmError> for Error {
    fn from(e: AlarmError) -> Self {
        Self::Alarm(e)
    }
}

// ---------------------------------------------------------------------------
// Dispensing errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispenseError {
    /// Another fill run currently owns the pump.
    Busy,
    /// Target weight must be strictly positive.
    InvalidTarget,
    /// The fill task could not be created.
    SpawnFailed,
}

impl fmt::Display for DispenseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "fill already in progress"),
            Self::InvalidTarget => write!(f, "target weight must be positive"),
            Self::SpawnFailed => write!(f, "fill task could not be spawned"),
        }
    }
}

impl From<DispenseError> for Error {
    fn from(e: DispenseError) -> Self {
        Self::Dispense(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    MqttInitFailed,
    MqttPublishFailed,
    MqttSubscribeFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::MqttInitFailed => write!(f, "MQTT client init failed"),
            Self::MqttPublishFailed => write!(f, "MQTT publish failed"),
            Self::MqttSubscribeFailed => write!(f, "MQTT subscribe failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
