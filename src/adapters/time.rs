//! Clock adapters implementing [`TimePort`].
//!
//! - [`SystemTimeAdapter`]: the real clock.  On ESP-IDF the monotonic clock
//!   is `esp_timer_get_time()` and the wall clock is the newlib system time
//!   (set with `settimeofday`, no timezone configured so local time is UTC).
//!   On host the wall clock is the machine's local time plus an offset that
//!   `set_wall_clock` adjusts, so simulations never touch the host clock.
//! - [`VirtualClock`]: deterministic clock where sleeping advances time
//!   instantly.  Drives fill, scanner and timeout logic in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
#[cfg(not(target_os = "espidf"))]
use chrono::Local;
#[cfg(target_os = "espidf")]
use chrono::Utc;
use log::info;

use crate::TIMESTAMP_FORMAT;
use crate::app::ports::TimePort;

// ── System clock ──────────────────────────────────────────────

pub struct SystemTimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    offset: Mutex<TimeDelta>,
}

impl Default for SystemTimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            offset: Mutex::new(TimeDelta::zero()),
        }
    }
}

impl TimePort for SystemTimeAdapter {
    #[cfg(target_os = "espidf")]
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    #[cfg(not(target_os = "espidf"))]
    fn now(&self) -> NaiveDateTime {
        let offset = *self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        Local::now().naive_local() + offset
    }

    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads the monotonic high-resolution timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }

    #[cfg(target_os = "espidf")]
    fn set_wall_clock(&self, t: NaiveDateTime) {
        let tv = esp_idf_svc::sys::timeval {
            tv_sec: t.and_utc().timestamp() as _,
            tv_usec: 0,
        };
        // SAFETY: settimeofday copies the timeval; a null timezone is allowed.
        let ret = unsafe { esp_idf_svc::sys::settimeofday(&tv, core::ptr::null()) };
        if ret == 0 {
            info!("Time: wall clock set to {}", t.format(TIMESTAMP_FORMAT));
        } else {
            log::warn!("Time: settimeofday failed ({})", ret);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_wall_clock(&self, t: NaiveDateTime) {
        let offset = t - Local::now().naive_local();
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) = offset;
        info!("Time(sim): wall clock set to {}", t.format(TIMESTAMP_FORMAT));
    }
}

// ── Virtual clock ─────────────────────────────────────────────

/// Clock where `sleep_ms` returns immediately after advancing both the
/// wall clock and the uptime counter.
pub struct VirtualClock {
    wall: Mutex<NaiveDateTime>,
    uptime_ms: AtomicU64,
}

impl Default for VirtualClock {
    fn default() -> Self {
        let epoch = NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(NaiveDateTime::MIN);
        Self::starting_at(epoch)
    }
}

impl VirtualClock {
    pub fn starting_at(wall: NaiveDateTime) -> Self {
        Self {
            wall: Mutex::new(wall),
            uptime_ms: AtomicU64::new(0),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.uptime_ms.fetch_add(ms, Ordering::SeqCst);
        let mut wall = self.wall.lock().unwrap_or_else(PoisonError::into_inner);
        *wall += TimeDelta::milliseconds(ms as i64);
    }
}

impl TimePort for VirtualClock {
    fn now(&self) -> NaiveDateTime {
        *self.wall.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn uptime_ms(&self) -> u64 {
        self.uptime_ms.load(Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }

    fn set_wall_clock(&self, t: NaiveDateTime) {
        *self.wall.lock().unwrap_or_else(PoisonError::into_inner) = t;
    }
}
