//! Property and fuzz-style tests for robustness of core data structures.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use hydrapet::alarms::{ALARM_CAPACITY, Alarm, AlarmRegistry, DueTime};
use hydrapet::dispense::{FillMachine, FillState};
use hydrapet::history::{HISTORY_CAPACITY, HistoryBuffer};
use hydrapet::remote::codec;
use hydrapet::sensors::hx711::decode_i24;
use proptest::prelude::*;

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

// ── History ring ──────────────────────────────────────────────

proptest! {
    /// The ring keeps the newest min(N, capacity) samples, oldest first.
    #[test]
    fn history_keeps_newest_samples(n in 0usize..2500) {
        let ring = HistoryBuffer::new();
        let t0 = base_time();
        for i in 0..n {
            ring.record(i as i32, t0 + TimeDelta::seconds(i as i64));
        }

        let kept = n.min(HISTORY_CAPACITY);
        prop_assert_eq!(ring.len(), kept);

        let drained = ring.drain_all();
        prop_assert_eq!(drained.len(), kept);
        for (offset, sample) in drained.iter().enumerate() {
            prop_assert_eq!(sample.weight_grams, (n - kept + offset) as i32);
        }
        prop_assert!(ring.is_empty());
    }
}

// ── Alarm registry ────────────────────────────────────────────

fn due_time(offset_secs: u32) -> DueTime {
    DueTime::from_naive(base_time() + TimeDelta::seconds(i64::from(offset_secs)))
}

proptest! {
    /// Removing an alarm removes exactly one entry with that due time and
    /// leaves the relative order of the rest untouched.
    #[test]
    fn remove_preserves_order_of_the_rest(
        offsets in proptest::collection::vec(0u32..50, 1..40),
        pick in any::<prop::sample::Index>(),
    ) {
        let registry = AlarmRegistry::new();
        for (i, off) in offsets.iter().enumerate() {
            registry.add(Alarm::new(due_time(*off), i as i32 + 1)).unwrap();
        }

        let target = due_time(offsets[pick.index(offsets.len())]);
        let removed = registry.remove(&target).unwrap();
        prop_assert_eq!(removed.due_time, target);

        let mut expected: Vec<Alarm> = offsets
            .iter()
            .enumerate()
            .map(|(i, off)| Alarm::new(due_time(*off), i as i32 + 1))
            .collect();
        let first = expected.iter().position(|a| a.due_time == target).unwrap();
        prop_assert_eq!(removed, expected.remove(first));
        prop_assert_eq!(registry.snapshot(), expected);
    }

    /// `take_due` returns exactly the due alarms, in registry order, and
    /// keeps the rest.
    #[test]
    fn take_due_partitions_registry(
        offsets in proptest::collection::vec(0u32..100, 0..60),
        now_offset in 0u32..100,
    ) {
        let registry = AlarmRegistry::new();
        for off in &offsets {
            registry.add(Alarm::new(due_time(*off), 200)).unwrap();
        }
        let now = base_time() + TimeDelta::seconds(i64::from(now_offset));

        let fired = registry.take_due(now);
        let remaining = registry.snapshot();

        prop_assert_eq!(fired.len() + remaining.len(), offsets.len());
        prop_assert!(fired.iter().all(|a| a.due_time.is_due(now)));
        prop_assert!(remaining.iter().all(|a| !a.due_time.is_due(now)));

        let expected_fired: Vec<DueTime> = offsets
            .iter()
            .filter(|off| **off <= now_offset)
            .map(|off| due_time(*off))
            .collect();
        let fired_times: Vec<DueTime> = fired.iter().map(|a| a.due_time).collect();
        prop_assert_eq!(fired_times, expected_fired);
    }
}

#[test]
fn registry_rejects_beyond_capacity() {
    let registry = AlarmRegistry::new();
    for i in 0..ALARM_CAPACITY {
        registry.add(Alarm::new(due_time(i as u32), 100)).unwrap();
    }
    assert!(registry.add(Alarm::new(due_time(0), 100)).is_err());
    assert_eq!(registry.len(), ALARM_CAPACITY);
}

// ── Fill state machine ────────────────────────────────────────

proptest! {
    /// A run fed a monotone reading that gains at least the minimum per
    /// window never stalls before reaching the target.
    #[test]
    fn steady_progress_never_stalls(
        target in 20i32..2000,
        gain_per_tick in 1i32..50,
    ) {
        // 100 ms ticks, 30 ticks per 3 s window.
        let mut m = FillMachine::new(target, 3000, 10);
        prop_assert_eq!(m.begin(0, 0), FillState::Filling);
        let mut grams = 0;
        let mut now = 0u64;
        loop {
            now += 100;
            grams += gain_per_tick;
            let state = m.update(grams, now);
            prop_assert_ne!(state, FillState::Stalled);
            if state == FillState::Succeeded {
                prop_assert!(grams >= target);
                break;
            }
        }
    }

    /// A flat reading below target always stalls once the window elapses.
    #[test]
    fn flat_reading_stalls_after_window(initial in 0i32..500, extra in 1i32..500) {
        let target = initial + extra;
        let mut m = FillMachine::new(target, 3000, 10);
        prop_assert_eq!(m.begin(initial, 0), FillState::Filling);
        prop_assert_eq!(m.update(initial, 2900), FillState::Filling);
        prop_assert_eq!(m.update(initial, 3000), FillState::Stalled);
    }
}

// ── HX711 and codec robustness ────────────────────────────────

proptest! {
    /// Sign extension agrees with a plain arithmetic shift.
    #[test]
    fn decode_i24_matches_shift(raw in 0u32..0x0100_0000) {
        prop_assert_eq!(decode_i24(raw), ((raw << 8) as i32) >> 8);
    }

    /// Arbitrary payloads on any request topic decode or fail cleanly, and
    /// anything accepted carries a positive target.
    #[test]
    fn decode_never_panics(topic_idx in 0usize..11, payload in ".{0,64}") {
        let suffix = hydrapet::remote::topics::INBOUND[topic_idx];
        if let Ok(cmd) = codec::decode(suffix, &payload, 200) {
            match cmd {
                hydrapet::app::commands::AppCommand::Fill { target_grams } => {
                    prop_assert!(target_grams > 0);
                }
                hydrapet::app::commands::AppCommand::SetAlarm(alarm) => {
                    prop_assert!(alarm.target_weight_grams > 0);
                }
                _ => {}
            }
        }
    }
}
