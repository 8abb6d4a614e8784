//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to                  |
//! |------------|------------------|------------------------------|
//! | `hardware` | ActuatorPort     | pump motor GPIO              |
//! |            | IndicatorPort    | status LED GPIO              |
//! |            | PanelPort        | tank switch, panel button    |
//! | `log_sink` | PublishPort      | Serial log output            |
//! | `mqtt`     | PublishPort      | ESP-IDF MQTT client          |
//! | `time`     | TimePort         | ESP32 system timer / RTC     |
//! | `wifi`     | ConnectivityPort | ESP-IDF WiFi STA             |
//!
//! The scale port ([`WeightSource`](crate::app::ports::WeightSource)) is
//! implemented directly by [`LoadCell`](crate::sensors::load_cell::LoadCell).

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
