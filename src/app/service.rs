//! Application service: the hexagonal core.
//!
//! [`AppService`] ties the scale, the alarm registry, the history ring and
//! the fill controller together behind one hardware-agnostic API.  All I/O
//! flows through the port traits handed in at construction, so the whole
//! service runs against mock adapters in tests.
//!
//! ```text
//!  WeightSource ──▶ ┌──────────────────────────┐ ──▶ PublishPort
//!    PanelPort  ──▶ │        AppService        │
//!                   │ Alarms · History · Fill  │
//! ActuatorPort  ◀── └──────────────────────────┘ ──▶ IndicatorPort
//! ```
//!
//! The service is shared as `Arc<AppService>` between the dispatcher, the
//! alarm scanner, the status publisher and the tank watcher; every method
//! takes `&self`.

use std::sync::Arc;

use chrono::NaiveDateTime;
use log::{error, info, warn};

use crate::TIMESTAMP_FORMAT;
use crate::alarms::{Alarm, AlarmRegistry, DueTime};
use crate::config::SystemConfig;
use crate::dispense::controller::DispenseController;
use crate::error::{AlarmError, DispenseError, Result};
use crate::history::{HistoryBuffer, Sample};
use crate::remote::codec::{self, HISTORY_CHUNK_SAMPLES};
use crate::remote::topics::Topics;

use super::commands::AppCommand;
use super::events::{AppEvent, StatusReport};
use super::ports::{
    ActuatorPort, IndicatorPort, PanelPort, PublishPort, SchedulerDelegate, TimePort, WeightSource,
};

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// Driven adapters the service needs, built in `main` (or a test rig).
#[derive(Clone)]
pub struct Ports {
    pub scale: Arc<dyn WeightSource>,
    pub pump: Arc<dyn ActuatorPort>,
    pub indicator: Arc<dyn IndicatorPort>,
    pub panel: Arc<dyn PanelPort>,
    pub publisher: Arc<dyn PublishPort>,
    pub clock: Arc<dyn TimePort>,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    ports: Ports,
    alarms: &'static AlarmRegistry,
    history: &'static HistoryBuffer,
    dispenser: Arc<DispenseController>,
    topics: Topics,
}

impl AppService {
    pub fn new(
        ports: Ports,
        alarms: &'static AlarmRegistry,
        history: &'static HistoryBuffer,
        config: &SystemConfig,
    ) -> Self {
        let dispenser = Arc::new(DispenseController::new(
            Arc::clone(&ports.scale),
            Arc::clone(&ports.pump),
            Arc::clone(&ports.indicator),
            Arc::clone(&ports.clock),
            config,
        ));
        Self {
            ports,
            alarms,
            history,
            dispenser,
            topics: Topics::new(&config.device_id),
        }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn dispenser(&self) -> &Arc<DispenseController> {
        &self.dispenser
    }

    // ── Exposed operations ────────────────────────────────────

    /// Start a fill in the background.  The outcome shows up in later
    /// weight reports and on the fault LED.
    pub fn request_fill(&self, target_grams: i32) -> core::result::Result<(), DispenseError> {
        self.dispenser.request_fill(target_grams)
    }

    pub fn add_alarm(&self, due_time: DueTime, target_weight_grams: i32) -> core::result::Result<(), AlarmError> {
        self.alarms.add(Alarm::new(due_time, target_weight_grams))
    }

    pub fn remove_alarm(&self, due_time: &DueTime) -> core::result::Result<Alarm, AlarmError> {
        self.alarms.remove(due_time)
    }

    pub fn list_alarms(&self) -> Vec<Alarm> {
        self.alarms.snapshot()
    }

    /// Current weight in grams.  Records a history sample.
    pub fn current_weight(&self) -> i32 {
        self.ports.scale.read_grams()
    }

    /// Acknowledge with one blink, then re-zero the scale.
    pub fn tare(&self) {
        self.ports.indicator.indicate_event();
        self.ports.scale.tare();
    }

    pub fn set_time(&self, t: NaiveDateTime) {
        self.ports.clock.set_wall_clock(t);
        info!("App: time set to {}", t.format(TIMESTAMP_FORMAT));
    }

    /// Diagnostic enumeration: empties the history ring.
    pub fn drain_history(&self) -> Vec<Sample> {
        self.history.drain_all()
    }

    /// Take one weight reading and combine it with panel and actuator state.
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            weight_grams: self.current_weight(),
            timestamp: self.ports.clock.now(),
            button_pressed: self.ports.panel.is_button_pressed(),
            led_on: self.ports.indicator.is_led_on(),
            motor_on: self.ports.pump.is_motor_on(),
        }
    }

    // ── Reporting ─────────────────────────────────────────────

    /// Encode and publish one report.
    pub fn publish(&self, event: &AppEvent) {
        match codec::encode(event) {
            Ok((suffix, payload)) => self.ports.publisher.publish(&self.topics.full(suffix), &payload),
            Err(e) => error!("App: failed to encode report: {}", e),
        }
    }

    /// Full status bundle: status document, weight, time and tank level,
    /// all from a single weight reading.
    pub fn publish_status(&self) {
        let status = self.status_report();
        self.publish(&AppEvent::Status(status));
        self.publish(&AppEvent::Water {
            grams: status.weight_grams,
        });
        self.publish(&AppEvent::Time(status.timestamp));
        self.publish_tank_level();
    }

    /// Drain the history ring and publish it in numbered parts, oldest
    /// samples first.  An empty ring still yields one (empty) part.
    pub fn publish_history(&self) {
        let samples = self.drain_history();
        let parts: Vec<&[Sample]> = if samples.is_empty() {
            vec![&samples[..]]
        } else {
            samples.chunks(HISTORY_CHUNK_SAMPLES).collect()
        };
        let count = parts.len();
        for (i, part) in parts.into_iter().enumerate() {
            self.publish(&AppEvent::History {
                part: i + 1,
                parts: count,
                samples: part.to_vec(),
            });
        }
    }

    pub fn publish_tank_level(&self) {
        self.publish(&AppEvent::TankLevel {
            low: self.ports.panel.is_tank_low(),
        });
    }

    // ── Command handling ──────────────────────────────────────

    /// Process one decoded inbound request.
    pub fn handle_command(&self, cmd: AppCommand) -> Result<()> {
        match cmd {
            AppCommand::SetTime(t) => self.set_time(t),
            AppCommand::GetTime => self.publish(&AppEvent::Time(self.ports.clock.now())),
            AppCommand::Fill { target_grams } => {
                info!("App: fill to {} g requested", target_grams);
                self.request_fill(target_grams)?;
            }
            AppCommand::GetWater => self.publish(&AppEvent::Water {
                grams: self.current_weight(),
            }),
            AppCommand::GetStatus => self.publish(&AppEvent::Status(self.status_report())),
            AppCommand::SetAlarm(alarm) => {
                self.add_alarm(alarm.due_time, alarm.target_weight_grams)?;
            }
            AppCommand::GetAlarms => self.publish(&AppEvent::Alarms(self.list_alarms())),
            AppCommand::DeleteAlarm(due_time) => {
                self.remove_alarm(&due_time)?;
            }
            AppCommand::Tare => self.tare(),
            AppCommand::GetHistory => self.publish_history(),
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Fired alarms start fills
// ───────────────────────────────────────────────────────────────

impl SchedulerDelegate for AppService {
    fn on_alarm_fired(&self, target_weight_grams: i32) {
        if let Err(e) = self.request_fill(target_weight_grams) {
            warn!("App: alarm fill of {} g not started: {}", target_weight_grams, e);
        }
    }
}
