//! Pump motor driver (relay / MOSFET on a single GPIO).
//!
//! Plain on/off, no speed control.  Both commands are idempotent: a
//! redundant command still rewrites the pin but logs nothing.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIO via hw_init.
//! On host/test: the write lands in the simulated output register.

use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::drivers::hw_init;
use crate::pins;

pub struct MotorDriver {
    running: AtomicBool,
}

impl Default for MotorDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorDriver {
    /// Takes the motor over and forces it off.
    pub fn new() -> Self {
        hw_init::gpio_write(pins::MOTOR_GPIO, false);
        Self {
            running: AtomicBool::new(false),
        }
    }

    pub fn on(&self) {
        hw_init::gpio_write(pins::MOTOR_GPIO, true);
        if !self.running.swap(true, Ordering::AcqRel) {
            info!("Motor: ON");
        }
    }

    pub fn off(&self) {
        hw_init::gpio_write(pins::MOTOR_GPIO, false);
        if self.running.swap(false, Ordering::AcqRel) {
            info!("Motor: OFF");
        }
    }

    pub fn is_on(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
