//! Single status LED driver.
//!
//! One active-high LED on [`pins::LED_GPIO`].  Besides plain on/off it
//! plays two blocking patterns:
//!
//! | Pattern      | Timing                          | Used for            |
//! |--------------|---------------------------------|---------------------|
//! | `blink_once` | 200 ms on                       | acknowledgements    |
//! | `blink_pair` | 500 ms on / 500 ms off, 5 times | stalled fill fault  |
//!
//! Patterns take their timing from a [`TimePort`] and are serialised, so a
//! status blink never interleaves with a running fault pattern.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIO via hw_init.
//! On host/test: the write lands in the simulated output register.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::app::ports::TimePort;
use crate::drivers::hw_init;
use crate::pins;

const BLINK_ONCE_MS: u32 = 200;
const BLINK_PAIR_HALF_PERIOD_MS: u32 = 500;
const BLINK_PAIR_CYCLES: u32 = 5;

pub struct StatusLed {
    on: AtomicBool,
    pattern: Mutex<()>,
    clock: Arc<dyn TimePort>,
}

impl StatusLed {
    /// Takes the LED over and switches it off.
    pub fn new(clock: Arc<dyn TimePort>) -> Self {
        let led = Self {
            on: AtomicBool::new(false),
            pattern: Mutex::new(()),
            clock,
        };
        led.set(false);
        led
    }

    pub fn set(&self, on: bool) {
        hw_init::gpio_write(pins::LED_GPIO, on);
        self.on.store(on, Ordering::Release);
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }

    /// One short blink, then off.
    pub fn blink_once(&self) {
        let _pattern = self.pattern.lock().unwrap_or_else(PoisonError::into_inner);
        self.set(true);
        self.clock.sleep_ms(BLINK_ONCE_MS);
        self.set(false);
    }

    /// Fault pattern: five 1 s on/off cycles, ends off.
    pub fn blink_pair(&self) {
        let _pattern = self.pattern.lock().unwrap_or_else(PoisonError::into_inner);
        for _ in 0..BLINK_PAIR_CYCLES {
            self.set(true);
            self.clock.sleep_ms(BLINK_PAIR_HALF_PERIOD_MS);
            self.set(false);
            self.clock.sleep_ms(BLINK_PAIR_HALF_PERIOD_MS);
        }
    }
}
