//! Read-only view handed to every speed-table handler.
//!
//! The service builds one `ControlContext` per control cycle from the
//! signal bundle, the current speed record and the live configuration.
//! Handlers only read from it; their output is the returned decision.

use crate::config::HoodConfig;
use crate::sensors::signals::Signals;

use super::SpeedState;

#[derive(Debug, Clone, Copy)]
pub struct ControlContext<'a> {
    pub now_ms: u64,
    pub signals: Signals,
    pub speed: SpeedState,
    pub config: &'a HoodConfig,
}

impl<'a> ControlContext<'a> {
    pub fn new(now_ms: u64, signals: Signals, speed: SpeedState, config: &'a HoodConfig) -> Self {
        Self {
            now_ms,
            signals,
            speed,
            config,
        }
    }

    /// The current level has been held for the downshift dwell.
    pub fn is_stable(&self) -> bool {
        self.speed
            .held_for(self.now_ms, self.config.thresholds.down.stable_s)
    }

    /// Covered pot: heat rising while humidity drops.
    pub fn lid_likely(&self) -> bool {
        let lid = &self.config.thresholds.lid;
        self.signals.temp_slope >= lid.temp_slope_min_c_pm
            && self.signals.rh_slope <= lid.rh_slope_max_pct_pm
    }

    /// Any sign that the hob is still producing heat.
    pub fn heat_present(&self) -> bool {
        let th = &self.config.thresholds;
        self.signals.temp_diff > th.on_low.temp_diff_c
            || self.signals.temp_slope > th.heat_signal_slope_c_pm
    }
}
