//! HX711 24-bit load-cell ADC, bit-banged over two lines.
//!
//! DOUT goes LOW when a conversion is ready.  The host then clocks PD_SCK
//! 24 times, sampling DOUT after each rising edge (MSB first), and sends
//! extra pulses to select channel and gain for the *next* conversion.
//!
//! The protocol is not re-entrant; callers serialise access (see
//! [`LoadCell`](super::load_cell::LoadCell)).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;

/// Extra clock pulses after the 24 data bits.
/// 1 => channel A, gain 128
/// 2 => channel B, gain 32
/// 3 => channel A, gain 64
const GAIN_128_PULSES: u8 = 1;

/// Clock high/low hold time.  The datasheet requires at least 0.2 µs and at
/// most 50 µs high.
const HALF_PERIOD_US: u32 = 1;

pub struct Hx711<DT, SCK, D> {
    data: DT,
    clock: SCK,
    delay: D,
}

impl<DT, SCK, D> Hx711<DT, SCK, D>
where
    DT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    /// Takes ownership of the lines.  PD_SCK is driven low, which keeps the
    /// chip powered up.
    pub fn new(data: DT, mut clock: SCK, delay: D) -> Self {
        if clock.set_low().is_err() {
            log::warn!("HX711: failed to drive PD_SCK low at init");
        }
        Self { data, clock, delay }
    }

    /// True when DOUT is low, i.e. a conversion can be clocked out.
    pub fn is_ready(&mut self) -> Result<bool, SensorError> {
        self.data.is_low().map_err(|_| SensorError::GpioFailed)
    }

    /// Clock out one conversion and return it sign-extended.
    ///
    /// Only call once [`is_ready`](Self::is_ready) reported `true`.
    pub fn read_counts(&mut self) -> Result<i32, SensorError> {
        let mut raw: u32 = 0;
        for _ in 0..24 {
            self.pulse_high()?;
            raw <<= 1;
            if self.data.is_high().map_err(|_| SensorError::GpioFailed)? {
                raw |= 1;
            }
            self.pulse_low()?;
        }

        for _ in 0..GAIN_128_PULSES {
            self.pulse_high()?;
            self.pulse_low()?;
        }

        Ok(decode_i24(raw))
    }

    fn pulse_high(&mut self) -> Result<(), SensorError> {
        self.clock.set_high().map_err(|_| SensorError::GpioFailed)?;
        self.delay.delay_us(HALF_PERIOD_US);
        Ok(())
    }

    fn pulse_low(&mut self) -> Result<(), SensorError> {
        self.clock.set_low().map_err(|_| SensorError::GpioFailed)?;
        self.delay.delay_us(HALF_PERIOD_US);
        Ok(())
    }
}

/// Interpret the low 24 bits of `raw` as two's complement.
pub const fn decode_i24(raw: u32) -> i32 {
    if raw & (1 << 23) != 0 {
        (raw | 0xFF00_0000) as i32
    } else {
        (raw & 0x00FF_FFFF) as i32
    }
}
