//! Manual override arbiter.
//!
//! A user selection on the speed slider suspends automatic control for
//! `manual.timeout_min` minutes.  Selecting 0 is a stop request: it ends
//! any override and switches the fan off immediately.
//!
//! ```text
//!  select(1..=4) ──▶ override on, fan → level
//!  select(0)     ──▶ override off, fan → Off (manual_stop)
//!  poll          ──▶ elapsed ≥ timeout? override off (that cycle does nothing else)
//! ```

use log::{info, warn};

use crate::fsm::{FanSpeed, Reason, SpeedDecision};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverrideState {
    pub active: bool,
    /// Time of the last manual selection.
    pub start_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ManualOverride {
    state: OverrideState,
}

impl ManualOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn state(&self) -> OverrideState {
        self.state
    }

    /// Reinstate an override loaded from persistent storage.
    pub fn restore(&mut self, state: OverrideState) {
        self.state = state;
    }

    /// Interpret a slider selection.
    ///
    /// Returns `None` when the selection echoes the current speed (the
    /// slider reporting back a value the controller itself wrote).
    /// Out-of-range levels are clamped.  The caller cancels any cooldown
    /// and applies the returned decision.
    pub fn select(&mut self, level: u8, current: FanSpeed, now_ms: u64) -> Option<SpeedDecision> {
        let target = FanSpeed::from_level(level);
        if target.level() != level {
            warn!("[MANUAL] Selection {level} out of range, using {target}");
        }
        if target == current {
            return None;
        }

        if target == FanSpeed::Off {
            info!("[MANUAL] User initiated stop");
            self.state.active = false;
            Some(SpeedDecision::new(FanSpeed::Off, Reason::ManualStop))
        } else {
            info!("[MANUAL] User selected speed {target}");
            self.state.active = true;
            self.state.start_ms = Some(now_ms);
            Some(SpeedDecision::new(target, Reason::ManualSlider))
        }
    }

    /// Clear the override once it has run for `timeout_min`.  Returns
    /// `true` on the cycle that clears it.
    pub fn check_expiry(&mut self, now_ms: u64, timeout_min: f32) -> bool {
        if !self.state.active {
            return false;
        }
        let elapsed_min = self
            .state
            .start_ms
            .map_or(f32::INFINITY, |t| now_ms.saturating_sub(t) as f32 / 60_000.0);
        if elapsed_min >= timeout_min {
            info!("[MANUAL] Timer expired, resuming automatic control");
            self.state.active = false;
            return true;
        }
        false
    }
}
