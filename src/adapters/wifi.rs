//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.  The status publisher waits on it and the tank watcher
//! uses it to bring the link back before reporting.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use core::fmt;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::{error, info};

use crate::app::ports::ConnectivityPort;
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, PoisonError};

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    InvalidSsid,
    InvalidPassword,
    DriverInitFailed,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::DriverInitFailed => write!(f, "WiFi driver initialisation failed"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl From<ConnectivityError> for crate::error::Error {
    fn from(_: ConnectivityError) -> Self {
        Self::Comms(CommsError::WifiConnectFailed)
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

/// Validated station credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        Ok(Self {
            ssid: heapless::String::try_from(ssid).map_err(|_| ConnectivityError::InvalidSsid)?,
            password: heapless::String::try_from(password)
                .map_err(|_| ConnectivityError::InvalidPassword)?,
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    credentials: Credentials,
    #[cfg(target_os = "espidf")]
    wifi: Mutex<BlockingWifi<EspWifi<'static>>>,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: AtomicBool,
    /// Simulation: number of upcoming connect attempts that fail.
    #[cfg(not(target_os = "espidf"))]
    sim_failures_left: AtomicU32,
}

impl WifiAdapter {
    /// Bring the driver up in station mode.  Does not connect yet.
    #[cfg(target_os = "espidf")]
    pub fn new(
        credentials: Credentials,
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, ConnectivityError> {
        let driver = EspWifi::new(modem, sysloop.clone(), Some(nvs))
            .map_err(|_| ConnectivityError::DriverInitFailed)?;
        let mut wifi =
            BlockingWifi::wrap(driver, sysloop).map_err(|_| ConnectivityError::DriverInitFailed)?;

        let auth_method = if credentials.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: credentials
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: credentials
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        wifi.set_configuration(&config)
            .map_err(|_| ConnectivityError::DriverInitFailed)?;
        wifi.start().map_err(|_| ConnectivityError::DriverInitFailed)?;
        info!("WiFi: station started");

        Ok(Self {
            credentials,
            wifi: Mutex::new(wifi),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            sim_link_up: AtomicBool::new(false),
            sim_failures_left: AtomicU32::new(0),
        }
    }

    /// One blocking connect attempt, waiting for an IP address.
    pub fn connect(&self) -> Result<(), ConnectivityError> {
        info!("WiFi: connecting to '{}'", self.credentials.ssid());
        match self.platform_connect() {
            Ok(()) => {
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: {}", e);
                Err(e)
            }
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&self) -> Result<(), ConnectivityError> {
        let mut wifi = self.wifi.lock().unwrap_or_else(PoisonError::into_inner);
        wifi.connect().map_err(|_| ConnectivityError::ConnectionFailed)?;
        wifi.wait_netif_up()
            .map_err(|_| ConnectivityError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&self) -> Result<(), ConnectivityError> {
        let failing = self
            .sim_failures_left
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            log::warn!("WiFi(sim): simulated connect failure");
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim_link_up.store(true, Ordering::Release);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        let wifi = self.wifi.lock().unwrap_or_else(PoisonError::into_inner);
        wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up.load(Ordering::Acquire)
    }

    /// Simulate the access point dropping the link.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&self) {
        self.sim_link_up.store(false, Ordering::Release);
    }

    /// Make the next `n` connect attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&self, n: u32) {
        self.sim_failures_left.store(n, Ordering::Release);
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn reconnect(&self) -> bool {
        info!("WiFi: trying to connect again");
        self.connect().is_ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_ssid() {
        assert_eq!(
            Credentials::new("", "password123").unwrap_err(),
            ConnectivityError::InvalidSsid
        );
    }

    #[test]
    fn rejects_short_password() {
        assert_eq!(
            Credentials::new("MyNet", "short").unwrap_err(),
            ConnectivityError::InvalidPassword
        );
    }

    #[test]
    fn accepts_open_network() {
        assert!(Credentials::new("OpenCafe", "").is_ok());
    }

    #[test]
    fn starts_disconnected_until_connect() {
        let wifi = WifiAdapter::new(Credentials::new("HomeWiFi", "mysecret8").unwrap());
        assert!(!wifi.is_connected());
        wifi.connect().unwrap();
        assert!(wifi.is_connected());
    }

    #[test]
    fn reconnect_reports_failures() {
        let wifi = WifiAdapter::new(Credentials::new("HomeWiFi", "mysecret8").unwrap());
        wifi.sim_fail_next(2);
        assert!(!wifi.reconnect());
        assert!(!wifi.reconnect());
        assert!(wifi.reconnect());
        wifi.sim_drop_link();
        assert!(!wifi.is_connected());
    }
}
