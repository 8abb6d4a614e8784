//! Alarm firing scanner.
//!
//! Once per scan interval the scanner compares the wall clock with every
//! pending alarm.  Due alarms leave the registry in one locked pass; the
//! scanner then hands each one to a [`SchedulerDelegate`] with the
//! registry lock already released, so a fill that runs for tens of
//! seconds never blocks `add`, `remove` or `snapshot`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌─────────────────┐   │
//! │  │ MQTT set/    │   │ Alarm scan   │   │ MQTT set/water, │   │
//! │  │ del alarm    │   │ (1 Hz)       │   │ put/pourwater   │   │
//! │  └──────┬───────┘   └──────┬───────┘   └────────┬────────┘   │
//! │         │                  │                    │            │
//! │         ▼                  ▼                    │            │
//! │  ┌──────────────────────────────┐               │            │
//! │  │        AlarmRegistry         │               │            │
//! │  └──────────────┬───────────────┘               │            │
//! │                 │ take_due (lock released)      │            │
//! │                 ▼                               ▼            │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │     SchedulerDelegate  ──▶  DispenseController         │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! An alarm already in the past when first seen fires on the next scan.

use std::sync::Arc;

use log::info;

use crate::alarms::AlarmRegistry;
use crate::app::ports::{SchedulerDelegate, TimePort};
use crate::config::SystemConfig;

pub struct AlarmScheduler {
    registry: &'static AlarmRegistry,
    clock: Arc<dyn TimePort>,
    scan_interval_ms: u32,
}

impl AlarmScheduler {
    pub fn new(registry: &'static AlarmRegistry, clock: Arc<dyn TimePort>, config: &SystemConfig) -> Self {
        Self {
            registry,
            clock,
            scan_interval_ms: config.alarm_scan_interval_ms,
        }
    }

    /// Fire every alarm due at the current wall-clock time.  Returns how
    /// many fired.
    pub fn scan(&self, delegate: &dyn SchedulerDelegate) -> usize {
        let now = self.clock.now();
        let fired = self.registry.take_due(now);
        for alarm in &fired {
            info!(
                "Alarms: {} due, dispensing {} g",
                alarm.due_time, alarm.target_weight_grams
            );
            delegate.on_alarm_fired(alarm.target_weight_grams);
        }
        fired.len()
    }

    /// Scanner task body.  Never returns.
    pub fn run(&self, delegate: &dyn SchedulerDelegate) -> ! {
        info!("Alarms: scanner started ({} ms interval)", self.scan_interval_ms);
        loop {
            self.scan(delegate);
            self.clock.sleep_ms(self.scan_interval_ms);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
