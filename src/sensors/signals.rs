//! Per-cycle signal bundle.
//!
//! Every consumer (speed machine, cooldown, alarm detector, dashboard)
//! reads the same derived numbers, computed once per completed poll from
//! the smoothed history.

use crate::config::HoodConfig;

use super::Channel;
use super::history::History;

/// Differentials and trailing slopes for one control cycle.
///
/// Differentials are `hood − room`; slopes are per minute over the named
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Signals {
    /// Number of samples in the history when the bundle was computed.
    pub samples: usize,

    pub temp_diff: f32,
    pub rh_diff: f32,

    /// Short window (`timing.win.short_s`).
    pub temp_slope: f32,
    pub rh_slope: f32,

    /// Long window (`timing.win.long_s`).
    pub temp_slope_long: f32,
    pub rh_slope_long: f32,

    /// Cooldown early-exit window (`cooldown.low_exit.early_sec`).
    pub temp_slope_early: f32,
    pub rh_slope_early: f32,

    /// Hood temperature slope over the dashboard heating window.
    pub heating_slope: f32,
}

impl Signals {
    pub fn compute(history: &History, config: &HoodConfig) -> Self {
        let win = &config.timing.win;
        let early = config.thresholds.cooldown.low_exit.early_sec;
        Self {
            samples: history.len(),
            temp_diff: history.differential(Channel::HoodTemp, Channel::RoomTemp),
            rh_diff: history.differential(Channel::HoodHumidity, Channel::RoomHumidity),
            temp_slope: history.slope(Channel::HoodTemp, win.short_s),
            rh_slope: history.slope(Channel::HoodHumidity, win.short_s),
            temp_slope_long: history.slope(Channel::HoodTemp, win.long_s),
            rh_slope_long: history.slope(Channel::HoodHumidity, win.long_s),
            temp_slope_early: history.slope(Channel::HoodTemp, early),
            rh_slope_early: history.slope(Channel::HoodHumidity, early),
            heating_slope: history.slope(Channel::HoodTemp, config.dashboard.heating_window_s),
        }
    }

    /// At least two samples, so differential-based triggers are trusted.
    pub fn has_trend(&self) -> bool {
        self.samples >= 2
    }
}
