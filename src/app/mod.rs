//! Application core: domain logic behind port traits.
//!
//! This module contains the request handling and reporting rules for the
//! HydraPet dispenser.  All interaction with hardware and the network
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.
//!
//! The long-running task bodies live next to the service they drive:
//! [`telemetry`] publishes the periodic status bundle and [`tank_watch`]
//! reports supply tank drops.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod tank_watch;
pub mod telemetry;
