//! Alarm registry.
//!
//! A bounded, insertion-ordered list of scheduled fills.  Every access goes
//! through one mutex; readers only ever receive copies.
//!
//! Alarm identity is calendar-field equality: two due times are the same
//! alarm only if year, month, day, hour, minute and second all match.  No
//! timezone or DST normalisation happens, so `remove` addresses alarms
//! exactly as they were submitted.

use core::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use log::{info, warn};

use crate::TIMESTAMP_FORMAT;
use crate::error::AlarmError;

/// Maximum number of pending alarms.
pub const ALARM_CAPACITY: usize = 1000;

// ═══════════════════════════════════════════════════════════════
//  Due time
// ═══════════════════════════════════════════════════════════════

/// Calendar timestamp at which an alarm becomes eligible to fire.
///
/// Always a valid calendar date and time of day; constructors reject
/// anything else instead of normalising it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DueTime {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl DueTime {
    pub fn new(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month.into(), day.into())?
            .and_hms_opt(hour.into(), minute.into(), second.into())
            .map(|_| Self {
                year,
                month,
                day,
                hour,
                minute,
                second,
            })
    }

    /// Parse `YYYY-MM-DDTHH:MM:SS`.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
            .ok()
            .map(Self::from_naive)
    }

    pub fn from_naive(t: NaiveDateTime) -> Self {
        Self {
            year: t.year(),
            month: t.month() as u8,
            day: t.day() as u8,
            hour: t.hour() as u8,
            minute: t.minute() as u8,
            // Leap-second representation folds into :59.
            second: t.second().min(59) as u8,
        }
    }

    pub fn to_naive(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(self.year, self.month.into(), self.day.into())
            .and_then(|d| d.and_hms_opt(self.hour.into(), self.minute.into(), self.second.into()))
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// True once `now` has reached or passed this due time.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.to_naive() <= now
    }
}

impl fmt::Display for DueTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

// ═══════════════════════════════════════════════════════════════
//  Alarm
// ═══════════════════════════════════════════════════════════════

/// A scheduled dispensing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alarm {
    pub due_time: DueTime,
    pub target_weight_grams: i32,
}

impl Alarm {
    pub fn new(due_time: DueTime, target_weight_grams: i32) -> Self {
        Self {
            due_time,
            target_weight_grams,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Registry
// ═══════════════════════════════════════════════════════════════

pub struct AlarmRegistry {
    alarms: Mutex<heapless::Vec<Alarm, ALARM_CAPACITY>>,
}

impl Default for AlarmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmRegistry {
    /// `const` so the device can keep the registry in a `static`.
    pub const fn new() -> Self {
        Self {
            alarms: Mutex::new(heapless::Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, heapless::Vec<Alarm, ALARM_CAPACITY>> {
        self.alarms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an alarm.  Rejected with [`AlarmError::Full`] at capacity,
    /// leaving the stored set untouched.
    pub fn add(&self, alarm: Alarm) -> Result<(), AlarmError> {
        let mut alarms = self.lock();
        if alarms.push(alarm).is_err() {
            warn!("Alarms: list full, rejecting {}", alarm.due_time);
            return Err(AlarmError::Full);
        }
        info!(
            "Alarms: added {} -> {} g ({} pending)",
            alarm.due_time,
            alarm.target_weight_grams,
            alarms.len()
        );
        Ok(())
    }

    /// Remove the first alarm whose due time matches field for field.
    /// Later entries shift down one slot, keeping their order.
    pub fn remove(&self, due_time: &DueTime) -> Result<Alarm, AlarmError> {
        let mut alarms = self.lock();
        let idx = alarms
            .iter()
            .position(|a| a.due_time == *due_time)
            .ok_or(AlarmError::NotFound)?;
        let removed = alarms.remove(idx);
        info!("Alarms: removed {}", removed.due_time);
        Ok(removed)
    }

    /// Point-in-time copy of every pending alarm, in registry order.
    pub fn snapshot(&self) -> Vec<Alarm> {
        self.lock().iter().copied().collect()
    }

    /// Remove every alarm due at `now` in a single locked pass and return
    /// them in registry order.  The lock is released before returning, so
    /// callers act on the fired alarms without holding it.
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<Alarm> {
        let mut fired = Vec::new();
        self.lock().retain(|a| {
            if a.due_time.is_due(now) {
                fired.push(*a);
                false
            } else {
                true
            }
        });
        fired
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
