//! Log-based publish adapter.
//!
//! Implements [`PublishPort`] by writing every report to the ESP-IDF
//! logger (UART / USB-CDC in production).  Stands in for the MQTT client
//! when it cannot be started, so the rest of the device keeps running.
//!
//! When the unit has no network at all it also stands in for the Wi-Fi
//! link: the log is always reachable, so [`ConnectivityPort`] reports a
//! permanent connection and the periodic reports keep flowing to it.

use log::info;

use crate::app::ports::{ConnectivityPort, PublishPort};

/// Adapter that logs every outbound report to the serial console.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl LogPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl PublishPort for LogPublisher {
    fn publish(&self, topic: &str, payload: &str) {
        info!("REPORT | {} | {}", topic, payload);
    }
}

impl ConnectivityPort for LogPublisher {
    fn is_connected(&self) -> bool {
        true
    }

    fn reconnect(&self) -> bool {
        true
    }
}
