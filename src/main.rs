//! HydraPet firmware entry point
//!
//! Composition root: builds every adapter, wires them into the
//! [`AppService`] and starts the long-running tasks.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LoadCell        SystemTimeAdapter      │
//! │  (Actuator+Indicator    (WeightSource)  (TimePort)             │
//! │   +Panel)                                                      │
//! │  WifiAdapter            MqttAdapter / LogPublisher             │
//! │  (Connectivity)         (PublishPort)                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        AppService · DispenseController (pure logic)    │    │
//! │  │        AlarmRegistry · HistoryBuffer                   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Tasks: alarm scanner · status publisher · dispatcher ·        │
//! │         tank watcher · MQTT subscription keeper                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::Ets;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use hydrapet::adapters::hardware::HardwareAdapter;
use hydrapet::adapters::log_sink::LogPublisher;
use hydrapet::adapters::mqtt::MqttAdapter;
use hydrapet::adapters::time::SystemTimeAdapter;
use hydrapet::adapters::wifi::{ConnectivityError, Credentials, WifiAdapter};
use hydrapet::alarms::AlarmRegistry;
use hydrapet::app::ports::{ConnectivityPort, PublishPort, TimePort};
use hydrapet::app::service::{AppService, Ports};
use hydrapet::app::tank_watch::TankWatcher;
use hydrapet::app::telemetry::StatusPublisher;
use hydrapet::config::SystemConfig;
use hydrapet::drivers::hw_init::{self, GpioLine};
use hydrapet::drivers::motor::MotorDriver;
use hydrapet::drivers::status_led::StatusLed;
use hydrapet::drivers::task_pin::{Core, spawn_on_core};
use hydrapet::history::HistoryBuffer;
use hydrapet::pins;
use hydrapet::remote::channels::INBOUND_CHANNEL;
use hydrapet::remote::dispatcher::Dispatcher;
use hydrapet::remote::topics::Topics;
use hydrapet::scheduler::AlarmScheduler;
use hydrapet::sensors::hx711::Hx711;
use hydrapet::sensors::load_cell::LoadCell;
use hydrapet::sensors::water_level::{PanelButton, TankLevelSensor};

/// Delay between boot-time Wi-Fi attempts.
const WIFI_BOOT_RETRY_MS: u32 = 1000;
/// Poll period of the MQTT subscription keeper.
const MQTT_SUBSCRIBE_POLL_MS: u32 = 500;

// Roughly 16 KB each: kept in static storage, off the main task stack.
static ALARMS: AlarmRegistry = AlarmRegistry::new();
static HISTORY: HistoryBuffer = HistoryBuffer::new();

// ── Configuration ─────────────────────────────────────────────

/// Defaults, optionally overridden by a JSON document baked in at build
/// time through `HYDRAPET_CONFIG_JSON`.
fn load_config() -> SystemConfig {
    let Some(json) = option_env!("HYDRAPET_CONFIG_JSON") else {
        info!("Config: using defaults");
        return SystemConfig::default();
    };
    match SystemConfig::from_json(json) {
        Ok(cfg) => {
            info!("Config: build-time overrides applied");
            cfg
        }
        Err(e) => {
            warn!("Config: {} in build-time overrides, using defaults", e);
            SystemConfig::default()
        }
    }
}

// ── Boot helpers ──────────────────────────────────────────────

/// Validate the credentials and start the station driver.
fn start_wifi(
    config: &SystemConfig,
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
) -> Result<WifiAdapter, ConnectivityError> {
    let credentials = Credentials::new(&config.wifi_ssid, &config.wifi_password)?;
    WifiAdapter::new(credentials, modem, sysloop, nvs)
}

/// MQTT client plus its subscription keeper, or `None` if the client
/// could not be created.
fn start_mqtt(config: &SystemConfig, clock: &Arc<dyn TimePort>) -> Option<Arc<dyn PublishPort>> {
    let topics = Topics::new(&config.device_id);
    match MqttAdapter::new(
        &config.broker_uri,
        &config.device_id,
        topics.subscriptions(),
        &INBOUND_CHANNEL,
    ) {
        Ok(mqtt) => {
            let mqtt = Arc::new(mqtt);
            let keeper = Arc::clone(&mqtt);
            let keeper_clock = Arc::clone(clock);
            spawn_task("mqtt_sub\0", Core::Pro, 4, move || {
                keeper.keep_subscribed(keeper_clock.as_ref(), MQTT_SUBSCRIBE_POLL_MS)
            });
            let publisher: Arc<dyn PublishPort> = mqtt;
            Some(publisher)
        }
        Err(e) => {
            error!("MQTT unavailable ({}), reports go to the log only", e);
            None
        }
    }
}

/// Keep trying until the station has an address, blinking once per failed
/// attempt.
fn connect_wifi(wifi: &WifiAdapter, led: &StatusLed, clock: &dyn TimePort) {
    while wifi.connect().is_err() {
        warn!("WiFi: connection not established, trying again...");
        clock.sleep_ms(WIFI_BOOT_RETRY_MS);
        led.blink_once();
    }
}

fn spawn_task(name: &'static str, core: Core, stack_kb: usize, f: impl FnOnce() + Send + 'static) {
    if let Err(e) = spawn_on_core(core, 5, stack_kb, name, f) {
        error!("Task '{}' not started: {}", name.trim_end_matches('\0'), e);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HydraPet v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    hw_init::init_peripherals().map_err(|e| anyhow!("HAL init failed: {e}"))?;

    let config = load_config();
    let clock: Arc<dyn TimePort> = Arc::new(SystemTimeAdapter::new());

    // ── 2. LED ────────────────────────────────────────────────
    let led = StatusLed::new(Arc::clone(&clock));

    // ── 3. Wi-Fi (offline if unprovisioned) ───────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = match start_wifi(&config, peripherals.modem, sysloop, nvs) {
        Ok(wifi) => {
            connect_wifi(&wifi, &led, clock.as_ref());
            Some(Arc::new(wifi))
        }
        Err(e) => {
            error!("WiFi: {}, running offline with reports on the log", e);
            None
        }
    };

    // ── 4. MQTT ───────────────────────────────────────────────
    let offline = Arc::new(LogPublisher::new());
    let offline_publisher: Arc<dyn PublishPort> = offline.clone();
    let offline_link: Arc<dyn ConnectivityPort> = offline;
    let (publisher, link) = match &wifi {
        Some(wifi) => {
            let link: Arc<dyn ConnectivityPort> = wifi.clone();
            (start_mqtt(&config, &clock).unwrap_or(offline_publisher), link)
        }
        None => (offline_publisher, offline_link),
    };

    // ── 5. Motor (off) and panel ──────────────────────────────
    let hardware = Arc::new(HardwareAdapter::new(
        MotorDriver::new(),
        led,
        TankLevelSensor::default(),
        PanelButton::default(),
    ));

    // ── 6. Load cell, tared at start-up ───────────────────────
    let hx711 = Hx711::new(
        GpioLine::new(pins::HX711_DATA_GPIO),
        GpioLine::new(pins::HX711_SCK_GPIO),
        Ets,
    );
    let scale = Arc::new(LoadCell::new(
        hx711,
        &config,
        &HISTORY,
        Arc::clone(&clock),
    ));
    scale.tare();

    // ── 7. Application service ────────────────────────────────
    let ports = Ports {
        scale,
        pump: hardware.clone(),
        indicator: hardware.clone(),
        panel: hardware.clone(),
        publisher,
        clock: Arc::clone(&clock),
    };
    let service = Arc::new(AppService::new(ports, &ALARMS, &HISTORY, &config));

    // ── 8. Tasks ──────────────────────────────────────────────
    let scanner = AlarmScheduler::new(&ALARMS, Arc::clone(&clock), &config);
    let delegate = Arc::clone(&service);
    spawn_task("alarms\0", Core::App, 6, move || scanner.run(delegate.as_ref()));

    let status = StatusPublisher::new(
        Arc::clone(&service),
        Arc::clone(&link),
        hardware.clone(),
        Arc::clone(&clock),
        &config,
    );
    spawn_task("status\0", Core::App, 8, move || status.run());

    let dispatcher = Dispatcher::new(Arc::clone(&service), config.default_alarm_target_grams);
    spawn_task("dispatch\0", Core::App, 8, move || dispatcher.run(&INBOUND_CHANNEL));

    let watcher = TankWatcher::new(
        Arc::clone(&service),
        hardware.clone(),
        Arc::clone(&link),
        hardware,
        Arc::clone(&clock),
        &config,
    );
    spawn_task("tank\0", Core::App, 6, move || watcher.run());

    info!(
        "System ready ({}, network: {})",
        config.device_id,
        if wifi.is_some() { "wifi" } else { "offline" }
    );

    // ── 9. Idle ──────────────────────────────────────────────
    loop {
        std::thread::sleep(Duration::from_secs(3600));
    }
}
