//! Calibrated bowl scale on top of the HX711.
//!
//! Converts raw counts into grams using a tare offset and a fixed
//! counts-per-gram divisor, and records every weight it hands out into the
//! shared [`HistoryBuffer`].
//!
//! ## Soft failures
//!
//! A conversion that does not become ready within the timeout (unplugged
//! amplifier, broken DOUT line) reads as raw `0`.  Callers never see an
//! error from the scale; they see a weight.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info, warn};

use super::hx711::Hx711;
use crate::app::ports::{TimePort, WeightSource};
use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::history::HistoryBuffer;

pub struct LoadCell<DT, SCK, D> {
    /// Held for the whole bit sequence so two readers never interleave.
    hx711: Mutex<Hx711<DT, SCK, D>>,
    tare_offset: AtomicI32,
    counts_per_gram: f32,
    poll_interval_ms: u32,
    ready_timeout_ms: u32,
    history: &'static HistoryBuffer,
    clock: Arc<dyn TimePort>,
}

impl<DT, SCK, D> LoadCell<DT, SCK, D>
where
    DT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    pub fn new(
        hx711: Hx711<DT, SCK, D>,
        config: &SystemConfig,
        history: &'static HistoryBuffer,
        clock: Arc<dyn TimePort>,
    ) -> Self {
        Self {
            hx711: Mutex::new(hx711),
            tare_offset: AtomicI32::new(0),
            counts_per_gram: config.counts_per_gram,
            poll_interval_ms: config.sensor_poll_interval_ms,
            ready_timeout_ms: config.sensor_ready_timeout_ms,
            history,
            clock,
        }
    }

    /// One raw conversion, or `0` if the chip never became ready.
    pub fn read_raw(&self) -> i32 {
        match self.try_read_raw() {
            Ok(counts) => {
                debug!("HX711: raw = {}", counts);
                counts
            }
            Err(SensorError::NotReady) => {
                warn!("HX711: timeout after {} ms", self.ready_timeout_ms);
                0
            }
            Err(e) => {
                warn!("HX711: read failed: {}", e);
                0
            }
        }
    }

    fn try_read_raw(&self) -> Result<i32, SensorError> {
        let start = self.clock.uptime_ms();
        loop {
            {
                let mut hx = self.hx711.lock().unwrap_or_else(PoisonError::into_inner);
                if hx.is_ready()? {
                    return hx.read_counts();
                }
            }
            if self.clock.uptime_ms().saturating_sub(start) >= u64::from(self.ready_timeout_ms) {
                return Err(SensorError::NotReady);
            }
            self.clock.sleep_ms(self.poll_interval_ms);
        }
    }

    /// Capture the current raw reading as the zero point.
    pub fn tare(&self) {
        let offset = self.read_raw();
        self.tare_offset.store(offset, Ordering::Relaxed);
        info!("HX711: tare offset = {}", offset);
    }

    pub fn tare_offset(&self) -> i32 {
        self.tare_offset.load(Ordering::Relaxed)
    }

    /// Weight in grams, truncated toward zero.  Records a history sample.
    pub fn get_weight_grams(&self) -> i32 {
        let counts = self.read_raw().wrapping_sub(self.tare_offset());
        let grams = (counts as f32 / self.counts_per_gram) as i32;
        self.history.record(grams, self.clock.now());
        grams
    }
}

impl<DT, SCK, D> WeightSource for LoadCell<DT, SCK, D>
where
    DT: InputPin + Send,
    SCK: OutputPin + Send,
    D: DelayNs + Send,
{
    fn read_grams(&self) -> i32 {
        self.get_weight_grams()
    }

    fn tare(&self) {
        LoadCell::tare(self);
    }
}
