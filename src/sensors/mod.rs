//! Sensor subsystem.
//!
//! - [`hx711`] bit-bangs the load cell amplifier.
//! - [`load_cell`] turns raw counts into tared grams and records history.
//! - [`water_level`] reads the supply tank switch and the panel button.

pub mod hx711;
pub mod load_cell;
pub mod water_level;
