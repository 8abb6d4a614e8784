//! Fill runner: drives the pump from a [`FillMachine`] and the scale.
//!
//! One fill at a time.  A second request while a run is in progress is
//! rejected with [`DispenseError::Busy`] and never touches the pump.  A run
//! cannot be cancelled; it ends on reaching the target, on a stall, or on
//! reset.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info, warn};

use super::{FillMachine, FillState};
use crate::app::ports::{ActuatorPort, IndicatorPort, TimePort, WeightSource};
use crate::config::SystemConfig;
use crate::drivers::task_pin::{self, Core};
use crate::error::DispenseError;

const FILL_TASK_PRIORITY: u8 = 5;
const FILL_TASK_STACK_KB: usize = 8;

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillReport {
    /// `Succeeded` or `Stalled`.
    pub outcome: FillState,
    pub target_grams: i32,
    /// Last weight observed.
    pub final_grams: i32,
    pub elapsed_ms: u64,
    /// False when the bowl already met the target.
    pub pumped: bool,
}

pub struct DispenseController {
    scale: Arc<dyn WeightSource>,
    pump: Arc<dyn ActuatorPort>,
    indicator: Arc<dyn IndicatorPort>,
    clock: Arc<dyn TimePort>,
    poll_interval_ms: u32,
    stall_window_ms: u32,
    stall_min_gain_grams: i32,
    busy: AtomicBool,
}

/// Held for the length of a run.  On drop, including by panic, the pump
/// is stopped and the busy flag cleared.
struct RunGuard<'a>(&'a DispenseController);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.0.pump.is_motor_on() {
            warn!("Fill: run ended with pump running, stopping it");
            self.0.pump.motor_off();
        }
        self.0.busy.store(false, Ordering::Release);
    }
}

impl DispenseController {
    pub fn new(
        scale: Arc<dyn WeightSource>,
        pump: Arc<dyn ActuatorPort>,
        indicator: Arc<dyn IndicatorPort>,
        clock: Arc<dyn TimePort>,
        config: &SystemConfig,
    ) -> Self {
        Self {
            scale,
            pump,
            indicator,
            clock,
            poll_interval_ms: config.fill_poll_interval_ms,
            stall_window_ms: config.stall_window_ms,
            stall_min_gain_grams: config.stall_min_gain_grams,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_filling(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Result<(), DispenseError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| DispenseError::Busy)
    }

    fn check_target(target_grams: i32) -> Result<(), DispenseError> {
        if target_grams <= 0 {
            warn!("Fill: rejecting non-positive target {} g", target_grams);
            return Err(DispenseError::InvalidTarget);
        }
        Ok(())
    }

    /// Start a fill on its own task and return immediately.
    ///
    /// The outcome is only visible through later weight reports and the
    /// fault indicator.
    pub fn request_fill(self: &Arc<Self>, target_grams: i32) -> Result<(), DispenseError> {
        Self::check_target(target_grams)?;
        if let Err(e) = self.try_acquire() {
            warn!("Fill: request for {} g rejected, run in progress", target_grams);
            return Err(e);
        }

        let this = Arc::clone(self);
        let spawned = task_pin::spawn_on_core(
            Core::App,
            FILL_TASK_PRIORITY,
            FILL_TASK_STACK_KB,
            "fill\0",
            move || {
                let _guard = RunGuard(&this);
                this.fill(target_grams);
            },
        );

        match spawned {
            Ok(_) => Ok(()),
            Err(e) => {
                self.busy.store(false, Ordering::Release);
                error!("Fill: could not spawn fill task: {}", e);
                Err(DispenseError::SpawnFailed)
            }
        }
    }

    /// Run a fill to completion on the calling task.
    pub fn run_fill(&self, target_grams: i32) -> Result<FillReport, DispenseError> {
        Self::check_target(target_grams)?;
        self.try_acquire()?;
        let _guard = RunGuard(self);
        Ok(self.fill(target_grams))
    }

    /// Body of one run.  The caller holds the busy flag.
    fn fill(&self, target_grams: i32) -> FillReport {
        let mut machine =
            FillMachine::new(target_grams, self.stall_window_ms, self.stall_min_gain_grams);

        let initial = self.scale.read_grams();
        if machine.begin(initial, self.clock.uptime_ms()) == FillState::Succeeded {
            info!("Fill: bowl already at {} g (target {} g)", initial, target_grams);
            return FillReport {
                outcome: FillState::Succeeded,
                target_grams,
                final_grams: initial,
                elapsed_ms: 0,
                pumped: false,
            };
        }

        info!("Fill: {} g -> {} g, pump on", initial, target_grams);
        self.pump.motor_on();
        // The first stall window opens once water can flow.
        let started = self.clock.uptime_ms();
        machine.rearm(started);

        loop {
            let grams = self.scale.read_grams();
            let now = self.clock.uptime_ms();
            match machine.update(grams, now) {
                FillState::Succeeded => {
                    self.pump.motor_off();
                    info!("Fill: target reached at {} g after {} ms", grams, now - started);
                    return self.report(FillState::Succeeded, target_grams, grams, now - started);
                }
                FillState::Stalled => {
                    self.pump.motor_off();
                    error!(
                        "Fill: stalled at {} g (target {} g), no progress in {} ms",
                        grams, target_grams, self.stall_window_ms
                    );
                    self.indicator.indicate_fault();
                    return self.report(FillState::Stalled, target_grams, grams, now - started);
                }
                FillState::Idle | FillState::Filling => {}
            }
            self.clock.sleep_ms(self.poll_interval_ms);
        }
    }

    fn report(&self, outcome: FillState, target_grams: i32, final_grams: i32, elapsed_ms: u64) -> FillReport {
        FillReport {
            outcome,
            target_grams,
            final_grams,
            elapsed_ms,
            pumped: true,
        }
    }
}
