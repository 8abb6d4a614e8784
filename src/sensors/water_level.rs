//! Supply tank level switch.
//!
//! A float switch on [`pins::TANK_LEVEL_GPIO`] with the internal pull-up
//! enabled.  The input reads HIGH while the water is below 30 %.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the real GPIO level via hw_init.
//! On host/test: reads the simulated input register (idle HIGH, so a bare
//! host build reports a low tank until a test drives the pin).

use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankLevel {
    Ok,
    BelowThirtyPercent,
}

impl TankLevel {
    pub fn is_low(self) -> bool {
        self == Self::BelowThirtyPercent
    }
}

pub struct TankLevelSensor {
    gpio: i32,
}

impl Default for TankLevelSensor {
    fn default() -> Self {
        Self::new(pins::TANK_LEVEL_GPIO)
    }
}

impl TankLevelSensor {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub fn read(&self) -> TankLevel {
        if hw_init::gpio_read(self.gpio) {
            TankLevel::BelowThirtyPercent
        } else {
            TankLevel::Ok
        }
    }
}

/// Active-low push-button with pull-up.  Only its level is reported.
pub struct PanelButton {
    gpio: i32,
}

impl Default for PanelButton {
    fn default() -> Self {
        Self::new(pins::BUTTON_GPIO)
    }
}

impl PanelButton {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub fn is_pressed(&self) -> bool {
        !hw_init::gpio_read(self.gpio)
    }
}
