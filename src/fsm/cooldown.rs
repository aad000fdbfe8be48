//! Post-cooking cooldown sub-machine.
//!
//! When the heat signal disappears with the fan running, the fan is not
//! switched straight off.  It decays through a short ramp instead:
//!
//! ```text
//!  heat lost ──▶ heavy? ──yes──▶ MED ──[med_hold_s]──▶ LOW ──[settled | fast cooling]──▶ OFF
//!                  │                                    ▲
//!                  └────no─────────────────────────────┘
//!
//!  any time:  renewed activity ──▶ cancelled (speed machine resumes)
//!             elapsed ≥ hard_cap_min ──▶ OFF
//! ```

use core::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::HoodConfig;
use crate::sensors::signals::Signals;

use super::{FanSpeed, Reason, SpeedDecision, SpeedState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CooldownKind {
    /// Significant residual heat or humidity: start from Med.
    Heavy,
    /// Start from Low.
    Light,
}

impl CooldownKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heavy => "heavy",
            Self::Light => "light",
        }
    }
}

impl fmt::Display for CooldownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownState {
    pub start_ms: u64,
    pub kind: CooldownKind,
}

#[derive(Debug, Clone, Default)]
pub struct Cooldown {
    state: Option<CooldownState>,
}

impl Cooldown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<CooldownState> {
        self.state
    }

    /// Reinstate a cooldown loaded from persistent storage.
    pub fn restore(&mut self, state: CooldownState) {
        self.state = Some(state);
    }

    /// Enter cooldown, classifying it from the residual differentials.
    pub fn begin(&mut self, now_ms: u64, signals: &Signals, config: &HoodConfig) -> SpeedDecision {
        let heavy_c = &config.thresholds.cooldown.heavy_entry_criteria;
        let heavy = signals.temp_diff >= heavy_c.temp_diff_c || signals.rh_diff >= heavy_c.rh_diff_pct;
        let kind = if heavy {
            CooldownKind::Heavy
        } else {
            CooldownKind::Light
        };
        self.state = Some(CooldownState {
            start_ms: now_ms,
            kind,
        });
        info!("[STATE] Cooldown mode ({kind})");
        match kind {
            CooldownKind::Heavy => SpeedDecision::new(FanSpeed::Med, Reason::CooldownHeavy),
            CooldownKind::Light => SpeedDecision::new(FanSpeed::Low, Reason::CooldownLight),
        }
    }

    /// Cancel on renewed cooking activity.  Returns `true` if the cooldown
    /// was interrupted.
    pub fn check_interrupt(&mut self, signals: &Signals, config: &HoodConfig) -> bool {
        if self.state.is_none() {
            return false;
        }
        let t = &config.thresholds.cooldown.override_trigger;
        if signals.temp_slope > t.temp_slope_c_pm || signals.rh_slope > t.rh_slope_pct_pm {
            info!("[STATE] Cooldown interrupted (new activity detected)");
            self.state = None;
            return true;
        }
        false
    }

    /// Advance an active cooldown by one cycle.
    pub fn step(
        &mut self,
        now_ms: u64,
        speed: &SpeedState,
        signals: &Signals,
        config: &HoodConfig,
    ) -> Option<SpeedDecision> {
        let st = self.state?;
        let c = &config.thresholds.cooldown;
        let elapsed_s = now_ms.saturating_sub(st.start_ms) / 1000;

        if speed.level == FanSpeed::Off {
            info!("[STATE] Cooldown cleared, fan already off");
            self.state = None;
            return None;
        }

        if elapsed_s >= c.hard_cap_min.saturating_mul(60) {
            self.state = None;
            return Some(SpeedDecision::new(FanSpeed::Off, Reason::CooldownHardCap));
        }

        if speed.level >= FanSpeed::Med {
            return (elapsed_s >= c.med_hold_s)
                .then(|| SpeedDecision::new(FanSpeed::Low, Reason::CooldownDropLow));
        }

        let exit = &c.low_exit;
        let settled = signals.temp_diff.abs() <= exit.temp_diff_max_c
            && signals.rh_diff.abs() <= exit.rh_diff_max_pct
            && speed.held_for(now_ms, config.thresholds.down.stable_s);
        let early = signals.temp_slope_early <= exit.early_temp_slope_max_c_pm
            && signals.rh_slope_early.abs() <= exit.early_rh_abs_slope_max_pct_pm;

        if settled || early {
            self.state = None;
            let reason = if settled {
                Reason::CooldownExit
            } else {
                Reason::CooldownEarly
            };
            return Some(SpeedDecision::new(FanSpeed::Off, reason));
        }
        None
    }

    pub fn cancel(&mut self) {
        self.state = None;
    }

    /// Rough seconds until the ramp finishes, for the state summary line.
    pub fn remaining_estimate_s(&self, now_ms: u64, config: &HoodConfig) -> Option<i64> {
        let st = self.state?;
        let th = &config.thresholds;
        let hold = match st.kind {
            CooldownKind::Heavy => th.cooldown.med_hold_s,
            CooldownKind::Light => 0,
        };
        let elapsed = (now_ms.saturating_sub(st.start_ms) / 1000) as i64;
        Some((hold + th.down.stable_s + 60) as i64 - elapsed)
    }
}
