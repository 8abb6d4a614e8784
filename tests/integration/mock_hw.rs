//! Mock adapters for integration tests.
//!
//! Every port the service needs has a recording stand-in here, so tests can
//! assert on the full command and report history without touching GPIO or
//! the network.  The scale is coupled to the pump: while the pump runs,
//! every reading adds `flow_per_read` grams.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use hydrapet::adapters::time::VirtualClock;
use hydrapet::alarms::AlarmRegistry;
use hydrapet::app::ports::{
    ActuatorPort, ConnectivityPort, IndicatorPort, PanelPort, PublishPort, TimePort, WeightSource,
};
use hydrapet::app::service::{AppService, Ports};
use hydrapet::config::SystemConfig;
use hydrapet::history::HistoryBuffer;

// ── Pump ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpCall {
    On,
    Off,
}

#[derive(Default)]
pub struct MockPump {
    on: AtomicBool,
    pub calls: Mutex<Vec<PumpCall>>,
}

#[allow(dead_code)]
impl MockPump {
    pub fn calls(&self) -> Vec<PumpCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ActuatorPort for MockPump {
    fn motor_on(&self) {
        self.on.store(true, Ordering::SeqCst);
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(PumpCall::On);
    }

    fn motor_off(&self) {
        self.on.store(false, Ordering::SeqCst);
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(PumpCall::Off);
    }

    fn is_motor_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}

// ── Scale ─────────────────────────────────────────────────────

pub struct MockScale {
    grams: AtomicI32,
    flow_per_read: AtomicI32,
    pub tare_calls: AtomicU32,
    pump: Arc<MockPump>,
    history: &'static HistoryBuffer,
    clock: Arc<VirtualClock>,
}

#[allow(dead_code)]
impl MockScale {
    pub fn set_grams(&self, grams: i32) {
        self.grams.store(grams, Ordering::SeqCst);
    }

    pub fn set_flow_per_read(&self, grams: i32) {
        self.flow_per_read.store(grams, Ordering::SeqCst);
    }
}

impl WeightSource for MockScale {
    fn read_grams(&self) -> i32 {
        if self.pump.is_motor_on() {
            self.grams
                .fetch_add(self.flow_per_read.load(Ordering::SeqCst), Ordering::SeqCst);
        }
        let grams = self.grams.load(Ordering::SeqCst);
        self.history.record(grams, self.clock.now());
        grams
    }

    fn tare(&self) {
        self.tare_calls.fetch_add(1, Ordering::SeqCst);
        self.grams.store(0, Ordering::SeqCst);
    }
}

// ── LED ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLed {
    pub events: AtomicU32,
    pub faults: AtomicU32,
}

impl IndicatorPort for MockLed {
    fn indicate_fault(&self) {
        self.faults.fetch_add(1, Ordering::SeqCst);
    }

    fn indicate_event(&self) {
        self.events.fetch_add(1, Ordering::SeqCst);
    }

    fn is_led_on(&self) -> bool {
        false
    }
}

// ── Panel ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPanel {
    pub button: AtomicBool,
    pub tank_low: AtomicBool,
}

impl PanelPort for MockPanel {
    fn is_button_pressed(&self) -> bool {
        self.button.load(Ordering::SeqCst)
    }

    fn is_tank_low(&self) -> bool {
        self.tank_low.load(Ordering::SeqCst)
    }
}

// ── Publisher ─────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPublisher {
    sent: Mutex<Vec<(String, String)>>,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Payloads published to one topic, oldest first.
    pub fn on_topic(&self, topic: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl PublishPort for RecordingPublisher {
    fn publish(&self, topic: &str, payload: &str) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((topic.to_owned(), payload.to_owned()));
    }
}

// ── Network link ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockLink {
    pub connected: AtomicBool,
    pub failures_left: AtomicU32,
    pub attempts: AtomicU32,
}

impl ConnectivityPort for MockLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn reconnect(&self) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !failing {
            self.connected.store(true, Ordering::SeqCst);
        }
        !failing
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A fully wired service plus handles on every mock behind it.
#[allow(dead_code)]
pub struct Rig {
    pub service: Arc<AppService>,
    pub config: SystemConfig,
    pub scale: Arc<MockScale>,
    pub pump: Arc<MockPump>,
    pub led: Arc<MockLed>,
    pub panel: Arc<MockPanel>,
    pub publisher: Arc<RecordingPublisher>,
    pub link: Arc<MockLink>,
    pub clock: Arc<VirtualClock>,
    pub alarms: &'static AlarmRegistry,
    pub history: &'static HistoryBuffer,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        let config = SystemConfig::default();
        let clock = Arc::new(VirtualClock::default());
        // The device keeps both in statics; each rig leaks its own pair.
        let history: &'static HistoryBuffer = Box::leak(Box::new(HistoryBuffer::new()));
        let alarms: &'static AlarmRegistry = Box::leak(Box::new(AlarmRegistry::new()));
        let pump = Arc::new(MockPump::default());
        let scale = Arc::new(MockScale {
            grams: AtomicI32::new(0),
            flow_per_read: AtomicI32::new(0),
            tare_calls: AtomicU32::new(0),
            pump: Arc::clone(&pump),
            history,
            clock: Arc::clone(&clock),
        });
        let led = Arc::new(MockLed::default());
        let panel = Arc::new(MockPanel::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let link = Arc::new(MockLink::default());
        link.connected.store(true, Ordering::SeqCst);

        let ports = Ports {
            scale: scale.clone(),
            pump: pump.clone(),
            indicator: led.clone(),
            panel: panel.clone(),
            publisher: publisher.clone(),
            clock: clock.clone(),
        };
        let service = Arc::new(AppService::new(ports, alarms, history, &config));

        Self {
            service,
            config,
            scale,
            pump,
            led,
            panel,
            publisher,
            link,
            clock,
            alarms,
            history,
        }
    }

    /// Full topic for a table suffix under this rig's device id.
    pub fn topic(&self, suffix: &str) -> String {
        self.service.topics().full(suffix)
    }

    /// Block until the background fill run ends.
    pub fn wait_for_fill(&self) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while self.service.dispenser().is_filling() {
            assert!(std::time::Instant::now() < deadline, "fill run did not finish");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }
}
