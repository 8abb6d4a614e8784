//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) produces these and hands
//! them to [`remote::codec`](crate::remote::codec) for encoding before they
//! reach the [`PublishPort`](super::ports::PublishPort).

use chrono::NaiveDateTime;

use crate::alarms::Alarm;
use crate::history::Sample;

/// Structured reports emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Pending alarms in registry order.
    Alarms(Vec<Alarm>),

    /// Current bowl weight.
    Water { grams: i32 },

    /// Current wall-clock time.
    Time(NaiveDateTime),

    /// Periodic or requested status snapshot.
    Status(StatusReport),

    /// Supply tank level.
    TankLevel { low: bool },

    /// One part of the drained measurement history, oldest first.
    /// `part` counts from 1 up to `parts`.
    History {
        part: usize,
        parts: usize,
        samples: Vec<Sample>,
    },
}

/// A point-in-time device snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub weight_grams: i32,
    pub timestamp: NaiveDateTime,
    pub button_pressed: bool,
    pub led_on: bool,
    pub motor_on: bool,
}
