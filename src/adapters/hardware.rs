//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the pump motor, the status LED, the tank switch and the panel
//! button, exposing them through [`ActuatorPort`], [`IndicatorPort`] and
//! [`PanelPort`].  The load cell has its own adapter
//! ([`LoadCell`](crate::sensors::load_cell::LoadCell)).  On non-espidf
//! targets, the underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{ActuatorPort, IndicatorPort, PanelPort};
use crate::drivers::motor::MotorDriver;
use crate::drivers::status_led::StatusLed;
use crate::sensors::water_level::{PanelButton, TankLevelSensor};

/// Concrete adapter that combines the GPIO peripherals behind port traits.
pub struct HardwareAdapter {
    motor: MotorDriver,
    led: StatusLed,
    tank: TankLevelSensor,
    button: PanelButton,
}

impl HardwareAdapter {
    pub fn new(motor: MotorDriver, led: StatusLed, tank: TankLevelSensor, button: PanelButton) -> Self {
        Self {
            motor,
            led,
            tank,
            button,
        }
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn motor_on(&self) {
        self.motor.on();
    }

    fn motor_off(&self) {
        self.motor.off();
    }

    fn is_motor_on(&self) -> bool {
        self.motor.is_on()
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl IndicatorPort for HardwareAdapter {
    fn indicate_fault(&self) {
        self.led.blink_pair();
    }

    fn indicate_event(&self) {
        self.led.blink_once();
    }

    fn is_led_on(&self) -> bool {
        self.led.is_on()
    }
}

// ── PanelPort implementation ──────────────────────────────────

impl PanelPort for HardwareAdapter {
    fn is_button_pressed(&self) -> bool {
        self.button.is_pressed()
    }

    fn is_tank_low(&self) -> bool {
        self.tank.read().is_low()
    }
}
