//! Integration tests for the inbound message → AppService → ports pipeline.
//!
//! These run on the host (x86_64) and drive the dispatcher, the alarm
//! scanner and the long-running task bodies against the mock adapters,
//! asserting on pump commands, LED feedback and published reports.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::NaiveDate;
use hydrapet::alarms::DueTime;
use hydrapet::app::ports::TimePort;
use hydrapet::app::tank_watch::TankWatcher;
use hydrapet::app::telemetry::StatusPublisher;
use hydrapet::remote::channels::InboundMsg;
use hydrapet::remote::codec::{HISTORY_CHUNK_SAMPLES, MAX_PAYLOAD_BYTES};
use hydrapet::remote::dispatcher::Dispatcher;
use hydrapet::remote::topics;
use hydrapet::scheduler::AlarmScheduler;

use crate::mock_hw::{PumpCall, Rig};

fn dispatcher(rig: &Rig) -> Dispatcher {
    Dispatcher::new(Arc::clone(&rig.service), rig.config.default_alarm_target_grams)
}

fn send(rig: &Rig, suffix: &str, payload: &str) -> bool {
    let msg = InboundMsg::new(&rig.topic(suffix), payload.as_bytes()).unwrap();
    dispatcher(rig).handle(&msg)
}

// ── Fill requests ─────────────────────────────────────────────

#[test]
fn set_water_fills_to_target_and_stops_pump() {
    let rig = Rig::new();
    rig.scale.set_flow_per_read(5);

    assert!(send(&rig, topics::SET_WATER, "200"));
    rig.wait_for_fill();

    assert_eq!(rig.pump.calls(), vec![PumpCall::On, PumpCall::Off]);
    assert!(rig.service.current_weight() >= 200);
    assert_eq!(rig.led.faults.load(Ordering::SeqCst), 0);
}

#[test]
fn pour_water_accepts_json_target() {
    let rig = Rig::new();
    rig.scale.set_flow_per_read(10);

    assert!(send(&rig, topics::POUR_WATER, r#"{"target_weight": 50}"#));
    rig.wait_for_fill();

    assert_eq!(rig.pump.calls(), vec![PumpCall::On, PumpCall::Off]);
}

#[test]
fn full_bowl_never_starts_pump() {
    let rig = Rig::new();
    rig.scale.set_grams(250);

    assert!(send(&rig, topics::SET_WATER, "200"));
    rig.wait_for_fill();

    assert!(rig.pump.calls().is_empty());
}

#[test]
fn stalled_fill_stops_pump_and_signals_fault() {
    let rig = Rig::new();
    let started = rig.clock.uptime_ms();

    assert!(send(&rig, topics::SET_WATER, "100"));
    rig.wait_for_fill();

    assert_eq!(rig.pump.calls(), vec![PumpCall::On, PumpCall::Off]);
    assert_eq!(rig.led.faults.load(Ordering::SeqCst), 1);
    assert!(rig.clock.uptime_ms() - started >= u64::from(rig.config.stall_window_ms));
}

#[test]
fn non_positive_targets_are_rejected() {
    let rig = Rig::new();
    assert!(!send(&rig, topics::SET_WATER, "0"));
    assert!(!send(&rig, topics::SET_WATER, "-5"));
    assert!(!send(&rig, topics::POUR_WATER, r#"{"target_weight": 0}"#));
    assert!(!send(&rig, topics::SET_WATER, "lots"));
    assert!(rig.pump.calls().is_empty());
}

// ── Alarms ────────────────────────────────────────────────────

#[test]
fn alarm_set_list_delete_round_trip() {
    let rig = Rig::new();

    assert!(send(
        &rig,
        topics::SET_ALARM,
        r#"{"timestamp": "2025-01-01T08:00:00", "target_weight": 150}"#
    ));
    assert!(send(&rig, topics::SET_ALARM, r#"{"timestamp": "2025-01-01T20:30:00"}"#));

    assert!(send(&rig, topics::GET_ALARMS, ""));
    assert_eq!(
        rig.publisher.on_topic(&rig.topic(topics::INFO_ALARMS)),
        vec![
            r#"{"alarms":[{"timestamp":"2025-01-01T08:00:00","target_weight":150},{"timestamp":"2025-01-01T20:30:00","target_weight":200}]}"#
                .to_owned()
        ]
    );

    assert!(send(&rig, topics::DEL_ALARM, r#"{"timestamp": "2025-01-01T08:00:00"}"#));
    assert_eq!(rig.alarms.len(), 1);
    assert!(!send(&rig, topics::DEL_ALARM, r#"{"timestamp": "2025-01-01T08:00:00"}"#));
    assert_eq!(rig.alarms.len(), 1);
}

#[test]
fn impossible_calendar_dates_are_rejected() {
    let rig = Rig::new();
    assert!(!send(&rig, topics::SET_ALARM, r#"{"timestamp": "2025-02-30T08:00:00"}"#));
    assert!(!send(&rig, topics::SET_ALARM, r#"{"timestamp": "tomorrow"}"#));
    assert!(!send(&rig, topics::SET_ALARM, "not json"));
    assert!(rig.alarms.is_empty());
}

#[test]
fn due_alarm_starts_a_fill() {
    let rig = Rig::new();
    rig.scale.set_flow_per_read(5);
    let due = DueTime::from_naive(rig.clock.now());
    rig.service.add_alarm(due, 120).unwrap();

    let scanner = AlarmScheduler::new(rig.alarms, rig.clock.clone(), &rig.config);
    assert_eq!(scanner.scan(rig.service.as_ref()), 1);
    rig.wait_for_fill();

    assert!(rig.alarms.is_empty());
    assert_eq!(rig.pump.calls(), vec![PumpCall::On, PumpCall::Off]);
    assert_eq!(scanner.scan(rig.service.as_ref()), 0);
}

// ── Time, status and history ──────────────────────────────────

#[test]
fn set_time_then_get_time() {
    let rig = Rig::new();
    assert!(send(&rig, topics::SET_TIME, "2030-05-06T07:08:09"));
    let expected = NaiveDate::from_ymd_opt(2030, 5, 6)
        .unwrap()
        .and_hms_opt(7, 8, 9)
        .unwrap();
    assert_eq!(rig.clock.now(), expected);

    assert!(send(&rig, topics::GET_TIME, ""));
    assert_eq!(
        rig.publisher.on_topic(&rig.topic(topics::INFO_TIME)),
        vec![r#"{"current_time":"2030-05-06T07:08:09"}"#.to_owned()]
    );

    assert!(!send(&rig, topics::SET_TIME, "2030-13-01T00:00:00"));
    assert_eq!(rig.clock.now(), expected);
}

#[test]
fn status_request_reports_panel_and_actuators() {
    let rig = Rig::new();
    rig.scale.set_grams(42);
    rig.panel.button.store(true, Ordering::SeqCst);

    assert!(send(&rig, topics::GET_STATUS, ""));
    assert_eq!(
        rig.publisher.on_topic(&rig.topic(topics::INFO_ALL)),
        vec![
            r#"{"weight":42,"timestamp":"2025-01-01T00:00:00","button_state":"PRESSED","led_state":"OFF","motor_state":"OFF"}"#
                .to_owned()
        ]
    );
    assert_eq!(rig.history.len(), 1);
}

#[test]
fn tare_blinks_then_zeroes() {
    let rig = Rig::new();
    rig.scale.set_grams(30);
    assert!(send(&rig, topics::SET_TARE, ""));
    assert_eq!(rig.led.events.load(Ordering::SeqCst), 1);
    assert_eq!(rig.scale.tare_calls.load(Ordering::SeqCst), 1);
    assert_eq!(rig.service.current_weight(), 0);
}

#[test]
fn history_request_drains_samples() {
    let rig = Rig::new();
    rig.scale.set_grams(7);
    rig.service.current_weight();
    rig.clock.advance_ms(1000);
    rig.service.current_weight();

    assert!(send(&rig, topics::GET_HISTORY, ""));
    assert_eq!(
        rig.publisher.on_topic(&rig.topic(topics::INFO_HISTORY)),
        vec![
            r#"{"part":1,"parts":1,"samples":[{"weight":7,"timestamp":"2025-01-01T00:00:00"},{"weight":7,"timestamp":"2025-01-01T00:00:01"}]}"#
                .to_owned()
        ]
    );
    assert!(rig.history.is_empty());
}

#[test]
fn large_history_is_published_in_bounded_parts() {
    let rig = Rig::new();
    for grams in 0..(HISTORY_CHUNK_SAMPLES as i32 * 2 + 3) {
        rig.scale.set_grams(grams);
        rig.service.current_weight();
    }

    assert!(send(&rig, topics::GET_HISTORY, ""));
    let parts = rig.publisher.on_topic(&rig.topic(topics::INFO_HISTORY));
    assert_eq!(parts.len(), 3);
    for (i, payload) in parts.iter().enumerate() {
        assert!(payload.len() <= MAX_PAYLOAD_BYTES);
        assert!(payload.starts_with(&format!(r#"{{"part":{},"parts":3,"samples":["#, i + 1)));
    }
    assert!(parts[0].contains(r#"{"weight":0,"#));
    assert!(parts[2].ends_with(r#"{"weight":34,"timestamp":"2025-01-01T00:00:00"}]}"#));
    assert!(rig.history.is_empty());
}

#[test]
fn empty_history_publishes_one_empty_part() {
    let rig = Rig::new();
    assert!(send(&rig, topics::GET_HISTORY, ""));
    assert_eq!(
        rig.publisher.on_topic(&rig.topic(topics::INFO_HISTORY)),
        vec![r#"{"part":1,"parts":1,"samples":[]}"#.to_owned()]
    );
}

#[test]
fn foreign_and_unknown_topics_are_ignored() {
    let rig = Rig::new();
    let foreign = InboundMsg::new("hydrapet0002/update/get/time", b"").unwrap();
    assert!(!dispatcher(&rig).handle(&foreign));
    assert!(!send(&rig, "update/get/everything", ""));
    assert!(rig.publisher.sent().is_empty());
}

// ── Periodic status publisher ─────────────────────────────────

#[test]
fn status_cycle_publishes_full_bundle_and_blinks() {
    let rig = Rig::new();
    rig.scale.set_grams(90);
    rig.panel.tank_low.store(true, Ordering::SeqCst);
    let status = StatusPublisher::new(
        Arc::clone(&rig.service),
        rig.link.clone(),
        rig.led.clone(),
        rig.clock.clone(),
        &rig.config,
    );

    status.publish_once();

    let topics_sent: Vec<String> = rig.publisher.sent().into_iter().map(|(t, _)| t).collect();
    assert_eq!(
        topics_sent,
        vec![
            rig.topic(topics::INFO_ALL),
            rig.topic(topics::INFO_WATER),
            rig.topic(topics::INFO_TIME),
            rig.topic(topics::INFO_TANK),
        ]
    );
    assert_eq!(
        rig.publisher.on_topic(&rig.topic(topics::INFO_WATER)),
        vec![r#"{"water_state":90}"#.to_owned()]
    );
    assert_eq!(
        rig.publisher.on_topic(&rig.topic(topics::INFO_TANK)),
        vec!["Below 30%".to_owned()]
    );
    assert_eq!(rig.led.events.load(Ordering::SeqCst), 1);
    assert_eq!(rig.history.len(), 1);
}

#[test]
fn status_cycle_waits_for_network() {
    let rig = Rig::new();
    rig.link.connected.store(false, Ordering::SeqCst);
    let status = StatusPublisher::new(
        Arc::clone(&rig.service),
        rig.link.clone(),
        rig.led.clone(),
        rig.clock.clone(),
        &rig.config,
    );

    let link = rig.link.clone();
    let restorer = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        link.connected.store(true, Ordering::SeqCst);
    });
    status.publish_once();
    restorer.join().unwrap();

    assert!(rig.clock.uptime_ms() >= u64::from(rig.config.connectivity_retry_ms));
    assert_eq!(rig.publisher.sent().len(), 4);
}

// ── Tank watcher ──────────────────────────────────────────────

fn watcher(rig: &Rig) -> TankWatcher {
    TankWatcher::new(
        Arc::clone(&rig.service),
        rig.panel.clone(),
        rig.link.clone(),
        rig.led.clone(),
        rig.clock.clone(),
        &rig.config,
    )
}

#[test]
fn tank_drop_is_reported_once() {
    let rig = Rig::new();
    let watcher = watcher(&rig);

    assert!(!watcher.poll_once());
    rig.panel.tank_low.store(true, Ordering::SeqCst);
    assert!(watcher.poll_once());
    assert!(!watcher.poll_once());

    assert_eq!(
        rig.publisher.on_topic(&rig.topic(topics::INFO_TANK)),
        vec!["Below 30%".to_owned()]
    );
    assert_eq!(rig.led.events.load(Ordering::SeqCst), 1);

    rig.panel.tank_low.store(false, Ordering::SeqCst);
    assert!(!watcher.poll_once());
    rig.panel.tank_low.store(true, Ordering::SeqCst);
    assert!(watcher.poll_once());
}

#[test]
fn tank_low_at_boot_is_not_an_edge() {
    let rig = Rig::new();
    rig.panel.tank_low.store(true, Ordering::SeqCst);
    assert!(!watcher(&rig).poll_once());
    assert!(rig.publisher.sent().is_empty());
}

#[test]
fn tank_drop_reconnects_before_reporting() {
    let rig = Rig::new();
    rig.link.connected.store(false, Ordering::SeqCst);
    rig.link.failures_left.store(2, Ordering::SeqCst);
    let watcher = watcher(&rig);
    assert!(!watcher.poll_once());

    rig.panel.tank_low.store(true, Ordering::SeqCst);
    assert!(watcher.poll_once());

    assert_eq!(rig.link.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(rig.clock.uptime_ms(), 2 * u64::from(rig.config.reconnect_retry_ms));
    assert_eq!(rig.publisher.sent().len(), 1);
}
