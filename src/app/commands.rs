//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (MQTT today)
//! that the [`AppService`](super::service::AppService) interprets and
//! acts upon.  Payloads are already validated by the time a command
//! exists: targets are positive and due times are real calendar dates.

use chrono::NaiveDateTime;

use crate::alarms::{Alarm, DueTime};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Set the wall clock.
    SetTime(NaiveDateTime),

    /// Report the current wall-clock time.
    GetTime,

    /// Dispense until the bowl holds `target_grams`.
    Fill { target_grams: i32 },

    /// Report the current bowl weight.
    GetWater,

    /// Report weight, time, button, LED and pump state together.
    GetStatus,

    /// Schedule a fill.
    SetAlarm(Alarm),

    /// Report every pending alarm.
    GetAlarms,

    /// Cancel the first alarm with this due time.
    DeleteAlarm(DueTime),

    /// Re-zero the scale.
    Tare,

    /// Drain and report the measurement history.
    GetHistory,
}
