//! MQTT payload codec.
//!
//! Decodes `(topic suffix, payload)` pairs into [`AppCommand`]s and encodes
//! [`AppEvent`]s into `(topic suffix, payload)` pairs.  Timestamps travel as
//! `YYYY-MM-DDTHH:MM:SS`; JSON bodies go through `serde_json`.
//!
//! Anything that fails to decode is rejected here and never reaches the
//! application core.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::topics;
use crate::TIMESTAMP_FORMAT;
use crate::alarms::{Alarm, DueTime};
use crate::app::commands::AppCommand;
use crate::app::events::{AppEvent, StatusReport};

pub const TANK_LOW_TEXT: &str = "Below 30%";
pub const TANK_FULL_TEXT: &str = "Water tank is full";

/// Largest outbound payload; also the MQTT client's buffer size.
pub const MAX_PAYLOAD_BYTES: usize = 1024;
/// Samples per history part, so the widest part stays under
/// [`MAX_PAYLOAD_BYTES`].
pub const HISTORY_CHUNK_SAMPLES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Not one of the subscribed request topics.
    UnknownTopic,
    /// Not valid JSON for this request.
    Malformed,
    /// Timestamp missing, mis-formatted, or not a real calendar date.
    BadTimestamp,
    /// Target weight missing or not strictly positive.
    BadTarget,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownTopic => write!(f, "unknown topic"),
            Self::Malformed => write!(f, "malformed payload"),
            Self::BadTimestamp => write!(f, "invalid timestamp"),
            Self::BadTarget => write!(f, "invalid target weight"),
        }
    }
}

// ── Wire shapes ───────────────────────────────────────────────

#[derive(Deserialize)]
struct SetAlarmRequest {
    timestamp: String,
    #[serde(default)]
    target_weight: Option<i32>,
}

#[derive(Deserialize)]
struct DeleteAlarmRequest {
    timestamp: String,
}

#[derive(Deserialize)]
struct PourRequest {
    target_weight: i32,
}

#[derive(Serialize)]
struct AlarmRecord {
    timestamp: String,
    target_weight: i32,
}

#[derive(Serialize)]
struct AlarmList {
    alarms: Vec<AlarmRecord>,
}

#[derive(Serialize)]
struct WaterReport {
    water_state: i32,
}

#[derive(Serialize)]
struct TimeReport {
    current_time: String,
}

#[derive(Serialize)]
struct StatusDocument {
    weight: i32,
    timestamp: String,
    button_state: &'static str,
    led_state: &'static str,
    motor_state: &'static str,
}

#[derive(Serialize)]
struct SampleRecord {
    weight: i32,
    timestamp: String,
}

#[derive(Serialize)]
struct HistoryReport {
    part: usize,
    parts: usize,
    samples: Vec<SampleRecord>,
}

// ── Decoding ──────────────────────────────────────────────────

/// Decode one inbound message.  `suffix` is the topic with the device
/// prefix already stripped.
pub fn decode(suffix: &str, payload: &str, default_alarm_target: i32) -> Result<AppCommand, DecodeError> {
    match suffix {
        topics::SET_TIME => parse_timestamp(payload).map(AppCommand::SetTime),
        topics::GET_TIME => Ok(AppCommand::GetTime),
        topics::SET_WATER => parse_target(payload).map(|target_grams| AppCommand::Fill { target_grams }),
        topics::POUR_WATER => decode_pour(payload).map(|target_grams| AppCommand::Fill { target_grams }),
        topics::GET_WATER => Ok(AppCommand::GetWater),
        topics::GET_STATUS => Ok(AppCommand::GetStatus),
        topics::SET_ALARM => {
            let req: SetAlarmRequest = serde_json::from_str(payload).map_err(|_| DecodeError::Malformed)?;
            let due = parse_due_time(&req.timestamp)?;
            let target = req.target_weight.unwrap_or(default_alarm_target);
            if target <= 0 {
                return Err(DecodeError::BadTarget);
            }
            Ok(AppCommand::SetAlarm(Alarm::new(due, target)))
        }
        topics::GET_ALARMS => Ok(AppCommand::GetAlarms),
        topics::DEL_ALARM => {
            let req: DeleteAlarmRequest = serde_json::from_str(payload).map_err(|_| DecodeError::Malformed)?;
            parse_due_time(&req.timestamp).map(AppCommand::DeleteAlarm)
        }
        topics::SET_TARE => Ok(AppCommand::Tare),
        topics::GET_HISTORY => Ok(AppCommand::GetHistory),
        _ => Err(DecodeError::UnknownTopic),
    }
}

/// Bare integer or `{"target_weight": N}`.
fn decode_pour(payload: &str) -> Result<i32, DecodeError> {
    if let Ok(target) = parse_target(payload) {
        return Ok(target);
    }
    let req: PourRequest = serde_json::from_str(payload).map_err(|_| DecodeError::Malformed)?;
    positive(req.target_weight)
}

fn parse_target(payload: &str) -> Result<i32, DecodeError> {
    let value = payload.trim().parse::<i32>().map_err(|_| DecodeError::BadTarget)?;
    positive(value)
}

fn positive(value: i32) -> Result<i32, DecodeError> {
    if value > 0 { Ok(value) } else { Err(DecodeError::BadTarget) }
}

fn parse_timestamp(payload: &str) -> Result<NaiveDateTime, DecodeError> {
    let text = payload.trim().trim_matches('"');
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|_| DecodeError::BadTimestamp)
}

fn parse_due_time(text: &str) -> Result<DueTime, DecodeError> {
    DueTime::parse(text).ok_or(DecodeError::BadTimestamp)
}

// ── Encoding ──────────────────────────────────────────────────

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

fn format_time(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

fn status_document(s: &StatusReport) -> StatusDocument {
    StatusDocument {
        weight: s.weight_grams,
        timestamp: format_time(&s.timestamp),
        button_state: if s.button_pressed { "PRESSED" } else { "RELEASED" },
        led_state: on_off(s.led_on),
        motor_state: on_off(s.motor_on),
    }
}

/// Encode one outbound report.  Returns the topic suffix and the payload.
pub fn encode(event: &AppEvent) -> Result<(&'static str, String), serde_json::Error> {
    let encoded = match event {
        AppEvent::Alarms(alarms) => {
            let doc = AlarmList {
                alarms: alarms
                    .iter()
                    .map(|a| AlarmRecord {
                        timestamp: a.due_time.to_string(),
                        target_weight: a.target_weight_grams,
                    })
                    .collect(),
            };
            (topics::INFO_ALARMS, serde_json::to_string(&doc)?)
        }
        AppEvent::Water { grams } => (
            topics::INFO_WATER,
            serde_json::to_string(&WaterReport { water_state: *grams })?,
        ),
        AppEvent::Time(t) => (
            topics::INFO_TIME,
            serde_json::to_string(&TimeReport {
                current_time: format_time(t),
            })?,
        ),
        AppEvent::Status(s) => (topics::INFO_ALL, serde_json::to_string(&status_document(s))?),
        AppEvent::TankLevel { low } => (
            topics::INFO_TANK,
            String::from(if *low { TANK_LOW_TEXT } else { TANK_FULL_TEXT }),
        ),
        AppEvent::History {
            part,
            parts,
            samples,
        } => {
            let doc = HistoryReport {
                part: *part,
                parts: *parts,
                samples: samples
                    .iter()
                    .map(|s| SampleRecord {
                        weight: s.weight_grams,
                        timestamp: format_time(&s.timestamp),
                    })
                    .collect(),
            };
            (topics::INFO_HISTORY, serde_json::to_string(&doc)?)
        }
    };
    Ok(encoded)
}
