//! Hazard alarm detector.
//!
//! Runs every control cycle before the cooldown and speed machines and
//! watches the long-window trends for two dangerous cooking patterns:
//!
//! - **Forgotten boil**: the pot has boiled dry.  Hood temperature keeps
//!   climbing while humidity falls.
//! - **Burning sauce**: a very hot hood with no humidity above the room
//!   reading, still heating.
//!
//! ## Alarm lifecycle
//!
//! 1. The detector arms once the fan has been on for `arm_after_s`.
//! 2. A matching pattern raises the alarm: the fan goes to Turbo and the
//!    hazard switch is turned on.
//! 3. While active, the alarm owns the fan.  Each cycle it checks whether
//!    the hood is cooling or humidity is recovering.
//! 4. On clear, the fan drops to High and `last_cleared` is stamped; a new
//!    alarm cannot be raised for `rearm_delay_s`.

use core::fmt;

use log::{info, warn};

use crate::config::HoodConfig;
use crate::fsm::{FanSpeed, Reason, SpeedDecision, SpeedState};
use crate::sensors::signals::Signals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmKind {
    ForgottenBoil,
    BurningSauce,
}

impl AlarmKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ForgottenBoil => "forgotten_boil",
            Self::BurningSauce => "burning_sauce",
        }
    }

    fn reason(self) -> Reason {
        match self {
            Self::ForgottenBoil => Reason::AlarmForgottenBoil,
            Self::BurningSauce => Reason::AlarmBurningSauce,
        }
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an active alarm was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearCause {
    Cooling,
    HumidityRecovering,
}

impl fmt::Display for ClearCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cooling => f.write_str("cooling"),
            Self::HumidityRecovering => f.write_str("rh_recover"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlarmTransition {
    Raised {
        kind: AlarmKind,
        decision: SpeedDecision,
    },
    Cleared {
        cause: ClearCause,
        decision: SpeedDecision,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmState {
    pub kind: Option<AlarmKind>,
    pub since_ms: Option<u64>,
    /// Survives across alarm cycles for the re-arm delay.
    pub last_cleared_ms: Option<u64>,
}

impl AlarmState {
    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlarmDetector {
    state: AlarmState,
}

impl AlarmDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Evaluate one cycle.
    ///
    /// Clearing is only considered for an alarm that was already active
    /// when the cycle started, so a freshly raised alarm always holds for
    /// at least one poll.
    pub fn evaluate(
        &mut self,
        now_ms: u64,
        speed: &SpeedState,
        signals: &Signals,
        config: &HoodConfig,
    ) -> Option<AlarmTransition> {
        if self.state.is_active() {
            return self.check_clear(now_ms, signals, config);
        }

        if !Self::armed(now_ms, speed, config) || self.rearm_blocked(now_ms, config) {
            return None;
        }

        let kind = Self::detect(signals, config)?;
        self.state.kind = Some(kind);
        self.state.since_ms = Some(now_ms);
        warn!("[ALARM] TRIGGERED: {kind}");
        Some(AlarmTransition::Raised {
            kind,
            decision: SpeedDecision::new(FanSpeed::Turbo, kind.reason()),
        })
    }

    /// Fan on and running long enough for the long-window slopes to mean
    /// something.
    fn armed(now_ms: u64, speed: &SpeedState, config: &HoodConfig) -> bool {
        speed.level.is_on()
            && speed
                .secs_since_on(now_ms)
                .is_some_and(|s| s >= config.alarm.arm_after_s)
    }

    fn rearm_blocked(&self, now_ms: u64, config: &HoodConfig) -> bool {
        self.state.last_cleared_ms.is_some_and(|t| {
            now_ms.saturating_sub(t) < config.alarm.rearm_delay_s.saturating_mul(1000)
        })
    }

    fn detect(s: &Signals, config: &HoodConfig) -> Option<AlarmKind> {
        let fb = &config.alarm.forgotten_boil;
        if s.temp_diff >= fb.temp_diff_c
            && s.temp_slope_long >= fb.temp_slope_long_c_pm
            && s.rh_slope_long <= fb.rh_slope_long_max_pct_pm
        {
            return Some(AlarmKind::ForgottenBoil);
        }
        let bs = &config.alarm.burning_sauce;
        if s.temp_diff >= bs.temp_diff_c
            && s.rh_diff.abs() <= bs.rh_diff_max_pct
            && s.temp_slope_long >= bs.temp_slope_long_c_pm
        {
            return Some(AlarmKind::BurningSauce);
        }
        None
    }

    fn check_clear(
        &mut self,
        now_ms: u64,
        s: &Signals,
        config: &HoodConfig,
    ) -> Option<AlarmTransition> {
        let c = &config.alarm.clear;
        let cause = if s.temp_slope_long <= c.cooling_temp_slope_long_max_c_pm {
            ClearCause::Cooling
        } else if s.rh_slope >= 0.0 || s.rh_diff.abs() <= c.rh_recover_diff_max_pct {
            ClearCause::HumidityRecovering
        } else {
            return None;
        };

        self.state.kind = None;
        self.state.since_ms = None;
        self.state.last_cleared_ms = Some(now_ms);
        info!("[ALARM] CLEARED ({cause})");
        Some(AlarmTransition::Cleared {
            cause,
            decision: SpeedDecision::new(FanSpeed::High, Reason::AlarmCleared),
        })
    }
}
