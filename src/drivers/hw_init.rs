//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions using raw ESP-IDF sys calls and exposes the
//! raw read/write helpers every driver goes through.  Called once from
//! `main()` before any task starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use core::convert::Infallible;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, Ordering};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(_: HwInitError) -> Self {
        Self::Init("GPIO configuration failed")
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any task is spawned.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // (pin, pull-up)
    let input_pins = [
        (pins::HX711_DATA_GPIO, false),
        (pins::TANK_LEVEL_GPIO, true),
        (pins::BUTTON_GPIO, true),
    ];

    for &(pin, pull_up) in &input_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: if pull_up {
                gpio_pullup_t_GPIO_PULLUP_ENABLE
            } else {
                gpio_pullup_t_GPIO_PULLUP_DISABLE
            },
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Simulated input levels, one bit per GPIO.  Idle level is HIGH, matching
/// the pull-ups on the real board.
#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: AtomicU64 = AtomicU64::new(u64::MAX);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    SIM_LEVELS.load(Ordering::Relaxed) & (1u64 << pin) != 0
}

/// Drive a simulated input level (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_input(pin: i32, high: bool) {
    if high {
        SIM_LEVELS.fetch_or(1u64 << pin, Ordering::Relaxed);
    } else {
        SIM_LEVELS.fetch_and(!(1u64 << pin), Ordering::Relaxed);
    }
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [pins::HX711_SCK_GPIO, pins::MOTOR_GPIO, pins::LED_GPIO];

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin as _, 0) };
    }

    info!("hw_init: GPIO outputs configured (pump off, LED off)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an output pin configured in
    // init_gpio_outputs().
    unsafe { gpio_set_level(pin as _, u32::from(high)); }
}

/// Last level written per GPIO on host, readable through `sim_output`.
#[cfg(not(target_os = "espidf"))]
static SIM_OUTPUTS: AtomicU64 = AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    if high {
        SIM_OUTPUTS.fetch_or(1u64 << pin, Ordering::Relaxed);
    } else {
        SIM_OUTPUTS.fetch_and(!(1u64 << pin), Ordering::Relaxed);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_output(pin: i32) -> bool {
    SIM_OUTPUTS.load(Ordering::Relaxed) & (1u64 << pin) != 0
}

// ── embedded-hal lines ────────────────────────────────────────

/// A configured GPIO exposed through the `embedded-hal` digital traits, so
/// bit-banged drivers stay generic over the pin type.
#[derive(Debug, Clone, Copy)]
pub struct GpioLine {
    pin: i32,
}

impl GpioLine {
    pub const fn new(pin: i32) -> Self {
        Self { pin }
    }
}

impl ErrorType for GpioLine {
    type Error = Infallible;
}

impl InputPin for GpioLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.pin))
    }
}

impl OutputPin for GpioLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, true);
        Ok(())
    }
}
