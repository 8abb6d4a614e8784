//! Remote control over MQTT.
//!
//! ```text
//!  MQTT callback ──▶ channels ──▶ dispatcher ──▶ codec::decode ──▶ AppService
//!  AppService ──▶ codec::encode ──▶ PublishPort
//! ```
//!
//! `topics` holds the topic table shared by both directions.

pub mod channels;
pub mod codec;
pub mod dispatcher;
pub mod topics;
