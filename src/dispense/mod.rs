//! Closed-loop fill state machine.
//!
//! ```text
//!            begin(w0)                 update(w, t)
//!   ┌──────┐  w0 <  target  ┌─────────┐  w >= target       ┌───────────┐
//!   │ Idle │───────────────▶│ Filling │───────────────────▶│ Succeeded │
//!   └──────┘                └─────────┘                    └───────────┘
//!      │  w0 >= target           │  t - t_cp >= window
//!      │                         │  and w - w_cp < min_gain ┌─────────┐
//!      └──▶ Succeeded            └─────────────────────────▶│ Stalled │
//!                                                           └─────────┘
//! ```
//!
//! The stall check is a re-arming window: whenever a full window has
//! elapsed with enough gain, the checkpoint moves to the current weight
//! and time.  The machine is pure; [`controller`] owns the pump, the clock
//! and the poll loop.

pub mod controller;

use crate::config::SystemConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillState {
    Idle,
    Filling,
    Succeeded,
    Stalled,
}

impl FillState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Stalled)
    }
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    grams: i32,
    at_ms: u64,
}

pub struct FillMachine {
    target_grams: i32,
    stall_window_ms: u64,
    stall_min_gain_grams: i32,
    state: FillState,
    checkpoint: Checkpoint,
}

impl FillMachine {
    pub fn new(target_grams: i32, stall_window_ms: u32, stall_min_gain_grams: i32) -> Self {
        Self {
            target_grams,
            stall_window_ms: u64::from(stall_window_ms),
            stall_min_gain_grams,
            state: FillState::Idle,
            checkpoint: Checkpoint { grams: 0, at_ms: 0 },
        }
    }

    pub fn from_config(target_grams: i32, config: &SystemConfig) -> Self {
        Self::new(target_grams, config.stall_window_ms, config.stall_min_gain_grams)
    }

    pub fn state(&self) -> FillState {
        self.state
    }

    pub fn target_grams(&self) -> i32 {
        self.target_grams
    }

    /// Entry guard.  A bowl that already meets the target succeeds without
    /// ever entering `Filling`.
    pub fn begin(&mut self, initial_grams: i32, now_ms: u64) -> FillState {
        if self.state != FillState::Idle {
            return self.state;
        }
        self.state = if initial_grams >= self.target_grams {
            FillState::Succeeded
        } else {
            self.checkpoint = Checkpoint {
                grams: initial_grams,
                at_ms: now_ms,
            };
            FillState::Filling
        };
        self.state
    }

    /// Move the stall checkpoint's time to `now_ms`, keeping its weight.
    /// No-op outside `Filling`.
    pub fn rearm(&mut self, now_ms: u64) {
        if self.state == FillState::Filling {
            self.checkpoint.at_ms = now_ms;
        }
    }

    /// Feed one poll.  No-op outside `Filling`.
    pub fn update(&mut self, grams: i32, now_ms: u64) -> FillState {
        if self.state != FillState::Filling {
            return self.state;
        }

        if grams >= self.target_grams {
            self.state = FillState::Succeeded;
        } else if now_ms.saturating_sub(self.checkpoint.at_ms) >= self.stall_window_ms {
            if grams.saturating_sub(self.checkpoint.grams) < self.stall_min_gain_grams {
                self.state = FillState::Stalled;
            } else {
                self.checkpoint = Checkpoint {
                    grams,
                    at_ms: now_ms,
                };
            }
        }
        self.state
    }
}
