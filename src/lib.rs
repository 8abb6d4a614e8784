//! HydraPet firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alarms;
pub mod app;
pub mod config;
pub mod dispense;
pub mod error;
pub mod history;
pub mod pins;
pub mod remote;
pub mod scheduler;

// Hardware-facing modules; the ESP-IDF implementations are guarded by cfg
// attributes inside, with simulation stubs on host.
pub mod adapters;
pub mod drivers;
pub mod sensors;

#[cfg(target_os = "espidf")]
mod esp_link_shims;

/// Calendar format used on the wire and in logs: `YYYY-MM-DDTHH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
