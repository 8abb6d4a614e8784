//! Measurement history ring.
//!
//! Fixed-capacity (1000-slot) ring of weight samples, oldest first.  Every
//! load-cell read appends one sample; once full, a write overwrites the
//! oldest unread sample.  Reads are destructive.
//!
//! The whole ring lives behind one mutex, so no caller can observe a
//! half-applied write.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use heapless::Deque;
use log::info;

use crate::TIMESTAMP_FORMAT;

// ── Constants ───────────────────────────────────────────────────────

/// Number of samples retained before the oldest is overwritten.
pub const HISTORY_CAPACITY: usize = 1000;

// ── Sample ──────────────────────────────────────────────────────────

/// One weight observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub weight_grams: i32,
    pub timestamp: NaiveDateTime,
}

// ── Ring buffer ─────────────────────────────────────────────────────

pub struct HistoryBuffer {
    ring: Mutex<Deque<Sample, HISTORY_CAPACITY>>,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    /// `const` so the device can keep the ring in a `static`.
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(Deque::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Deque<Sample, HISTORY_CAPACITY>> {
        // A panicking writer cannot leave the deque half-updated.
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a sample, overwriting the oldest one when full.
    pub fn record(&self, weight_grams: i32, timestamp: NaiveDateTime) {
        let sample = Sample {
            weight_grams,
            timestamp,
        };
        let mut ring = self.lock();
        if ring.is_full() {
            ring.pop_front();
        }
        // Cannot fail: a slot was freed above if needed.
        let _ = ring.push_back(sample);
    }

    /// Remove and return the oldest sample, or `None` when empty.
    pub fn pop_oldest(&self) -> Option<Sample> {
        self.lock().pop_front()
    }

    /// Pop every sample until the ring is empty, logging each one.
    pub fn drain_all(&self) -> Vec<Sample> {
        let mut drained = Vec::new();
        while let Some(sample) = self.pop_oldest() {
            info!(
                "History: {} g at {}",
                sample.weight_grams,
                sample.timestamp.format(TIMESTAMP_FORMAT)
            );
            drained.push(sample);
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(8, sec / 60, sec % 60)
            .unwrap()
    }

    #[test]
    fn empty_pop_is_none() {
        let h = HistoryBuffer::new();
        assert!(h.is_empty());
        assert_eq!(h.pop_oldest(), None);
        assert!(h.drain_all().is_empty());
    }

    #[test]
    fn ring_lives_in_static_storage() {
        static RING: HistoryBuffer = HistoryBuffer::new();
        RING.record(42, at(0));
        assert_eq!(RING.len(), 1);
        assert_eq!(RING.pop_oldest().map(|s| s.weight_grams), Some(42));
    }

    #[test]
    fn pops_oldest_first() {
        let h = HistoryBuffer::new();
        h.record(10, at(0));
        h.record(20, at(1));
        assert_eq!(h.len(), 2);
        assert_eq!(h.pop_oldest().map(|s| s.weight_grams), Some(10));
        assert_eq!(h.pop_oldest().map(|s| s.weight_grams), Some(20));
        assert_eq!(h.pop_oldest(), None);
    }

    #[test]
    fn overflow_keeps_most_recent() {
        let h = HistoryBuffer::new();
        for i in 0..(HISTORY_CAPACITY as i32 + 5) {
            h.record(i, at(0));
        }
        assert_eq!(h.len(), HISTORY_CAPACITY);
        let drained = h.drain_all();
        assert_eq!(drained.len(), HISTORY_CAPACITY);
        assert_eq!(drained[0].weight_grams, 5);
        assert_eq!(
            drained[HISTORY_CAPACITY - 1].weight_grams,
            HISTORY_CAPACITY as i32 + 4
        );
        assert!(h.is_empty());
    }
}
