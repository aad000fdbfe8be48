//! System configuration parameters
//!
//! All tunable parameters for the hood controller, grouped the way the
//! device configuration is laid out on disk (`devices`, `manual`, `speeds`,
//! `timing`, `thresholds`, `alarm`).  Unit-suffixed JSON keys such as
//! `temp_slope_Cpm` are kept through `serde(rename)` so existing config
//! files load unchanged.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HoodConfig {
    pub devices: DeviceConfig,
    pub manual: ManualConfig,
    pub speeds: SpeedConfig,
    pub timing: TimingConfig,
    pub thresholds: ThresholdConfig,
    pub alarm: AlarmConfig,
    pub persistence: PersistenceConfig,
    pub dashboard: DashboardConfig,
}

// ---------------------------------------------------------------------------
// Hardware mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Relay output line per speed (s1 = Low … s4 = Turbo).
    pub outputs: OutputLines,
    /// Remote switch toggled while a hazard alarm is active.
    pub spare_switch: u8,
    /// Remote switch driving the hood light.
    pub light_switch: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            outputs: OutputLines::default(),
            spare_switch: 0,
            light_switch: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputLines {
    pub s1: u8,
    pub s2: u8,
    pub s3: u8,
    pub s4: u8,
}

impl Default for OutputLines {
    fn default() -> Self {
        Self {
            s1: 0,
            s2: 1,
            s3: 2,
            s4: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Manual control
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    /// Minutes after a manual selection before automatic control resumes.
    pub timeout_min: f32,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self { timeout_min: 5.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Level used when cooking is first detected.
    pub start_on: u8,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self { start_on: 1 }
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub win: WindowConfig,
    /// EMA weight of the newest raw reading.
    pub ema_alpha: f32,
    /// Gap between the two Low-line pulses that switch the fan off.
    pub double_press_ms: u64,
    /// A poll chain older than this is considered stuck.
    pub poll_stuck_s: u64,
    pub light_delay_ms: u64,
    pub status_delay_ms: u64,
    pub dashboard_delay_ms: u64,
    pub hazard_delay_ms: u64,
    pub save_debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            win: WindowConfig::default(),
            ema_alpha: 0.35,
            double_press_ms: 1500,
            poll_stuck_s: 45,
            light_delay_ms: 600,
            status_delay_ms: 800,
            dashboard_delay_ms: 100,
            hazard_delay_ms: 1500,
            save_debounce_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Poll period.
    pub sample_s: u64,
    /// Window for the short-term slopes driving the speed machine.
    pub short_s: u64,
    /// Window for the long-term slopes driving the alarm and upshift projection.
    pub long_s: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            sample_s: 30,
            short_s: 120,
            long_s: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// Automation thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub on_low: OnLowThresholds,
    pub up_1_to_2: UpLowToMedThresholds,
    pub up_2_to_3: UpMedToHighThresholds,
    pub lid: LidThresholds,
    /// Temperature slope above which heat is still considered present.
    #[serde(rename = "heat_signal_slope_Cpm")]
    pub heat_signal_slope_c_pm: f32,
    pub down: DownThresholds,
    pub lockout_s: u64,
    pub cooldown: CooldownThresholds,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            on_low: OnLowThresholds::default(),
            up_1_to_2: UpLowToMedThresholds::default(),
            up_2_to_3: UpMedToHighThresholds::default(),
            lid: LidThresholds::default(),
            heat_signal_slope_c_pm: 0.05,
            down: DownThresholds::default(),
            lockout_s: 90,
            cooldown: CooldownThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnLowThresholds {
    #[serde(rename = "temp_slope_Cpm")]
    pub temp_slope_c_pm: f32,
    #[serde(rename = "temp_diff_C")]
    pub temp_diff_c: f32,
    #[serde(rename = "rh_slope_PCTpm")]
    pub rh_slope_pct_pm: f32,
    #[serde(rename = "rh_diff_PCT")]
    pub rh_diff_pct: f32,
    /// Minimum slope that must accompany a differential-based start.
    #[serde(rename = "diff_slope_min_pm")]
    pub diff_slope_min_pm: f32,
}

impl Default for OnLowThresholds {
    fn default() -> Self {
        Self {
            temp_slope_c_pm: 0.7,
            temp_diff_c: 3.8,
            rh_slope_pct_pm: 1.5,
            rh_diff_pct: 12.0,
            diff_slope_min_pm: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpLowToMedThresholds {
    #[serde(rename = "temp_slope_Cpm")]
    pub temp_slope_c_pm: f32,
    #[serde(rename = "temp_diff_C")]
    pub temp_diff_c: f32,
    #[serde(rename = "rh_slope_PCTpm")]
    pub rh_slope_pct_pm: f32,
    #[serde(rename = "rh_diff_PCT")]
    pub rh_diff_pct: f32,
}

impl Default for UpLowToMedThresholds {
    fn default() -> Self {
        Self {
            temp_slope_c_pm: 0.7,
            temp_diff_c: 4.5,
            rh_slope_pct_pm: 1.5,
            rh_diff_pct: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpMedToHighThresholds {
    #[serde(rename = "temp_slope_Cpm")]
    pub temp_slope_c_pm: f32,
    #[serde(rename = "temp_diff_C")]
    pub temp_diff_c: f32,
    /// Projected temperature rise over five minutes (long slope × 5).
    #[serde(rename = "long_temp_increase_C")]
    pub long_temp_increase_c: f32,
}

impl Default for UpMedToHighThresholds {
    fn default() -> Self {
        Self {
            temp_slope_c_pm: 0.9,
            temp_diff_c: 4.0,
            long_temp_increase_c: 3.0,
        }
    }
}

/// Covered-pot heuristic: rising heat with falling humidity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidThresholds {
    #[serde(rename = "temp_slope_min_Cpm")]
    pub temp_slope_min_c_pm: f32,
    #[serde(rename = "rh_slope_max_PCTpm")]
    pub rh_slope_max_pct_pm: f32,
}

impl Default for LidThresholds {
    fn default() -> Self {
        Self {
            temp_slope_min_c_pm: 0.2,
            rh_slope_max_pct_pm: -0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownThresholds {
    /// Dwell required at a level before stepping down.
    pub stable_s: u64,
    pub from3: DownFromHigh,
    pub from2: DownFromMed,
}

impl Default for DownThresholds {
    fn default() -> Self {
        Self {
            stable_s: 150,
            from3: DownFromHigh::default(),
            from2: DownFromMed::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownFromHigh {
    #[serde(rename = "temp_slope_max_Cpm")]
    pub temp_slope_max_c_pm: f32,
    #[serde(rename = "temp_diff_max_C")]
    pub temp_diff_max_c: f32,
}

impl Default for DownFromHigh {
    fn default() -> Self {
        Self {
            temp_slope_max_c_pm: 0.2,
            temp_diff_max_c: 3.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownFromMed {
    #[serde(rename = "temp_slope_max_Cpm")]
    pub temp_slope_max_c_pm: f32,
    #[serde(rename = "temp_diff_max_C")]
    pub temp_diff_max_c: f32,
    #[serde(rename = "rh_diff_max_PCT")]
    pub rh_diff_max_pct: f32,
}

impl Default for DownFromMed {
    fn default() -> Self {
        Self {
            temp_slope_max_c_pm: 0.1,
            temp_diff_max_c: 5.0,
            rh_diff_max_pct: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownThresholds {
    /// Renewed cooking activity that cancels a cooldown.
    pub override_trigger: CooldownTrigger,
    pub heavy_entry_criteria: HeavyEntryCriteria,
    pub med_hold_s: u64,
    pub low_exit: LowExitThresholds,
    pub hard_cap_min: u64,
}

impl Default for CooldownThresholds {
    fn default() -> Self {
        Self {
            override_trigger: CooldownTrigger::default(),
            heavy_entry_criteria: HeavyEntryCriteria::default(),
            med_hold_s: 180,
            low_exit: LowExitThresholds::default(),
            hard_cap_min: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownTrigger {
    #[serde(rename = "temp_slope_Cpm")]
    pub temp_slope_c_pm: f32,
    #[serde(rename = "rh_slope_PCTpm")]
    pub rh_slope_pct_pm: f32,
}

impl Default for CooldownTrigger {
    fn default() -> Self {
        Self {
            temp_slope_c_pm: 0.8,
            rh_slope_pct_pm: 1.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeavyEntryCriteria {
    #[serde(rename = "temp_diff_C")]
    pub temp_diff_c: f32,
    #[serde(rename = "rh_diff_PCT")]
    pub rh_diff_pct: f32,
}

impl Default for HeavyEntryCriteria {
    fn default() -> Self {
        Self {
            temp_diff_c: 4.0,
            rh_diff_pct: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowExitThresholds {
    #[serde(rename = "temp_diff_max_C")]
    pub temp_diff_max_c: f32,
    #[serde(rename = "rh_diff_max_PCT")]
    pub rh_diff_max_pct: f32,
    /// Window for the fast-cooling early exit.
    pub early_sec: u64,
    #[serde(rename = "early_temp_slope_max_Cpm")]
    pub early_temp_slope_max_c_pm: f32,
    #[serde(rename = "early_rh_abs_slope_max_PCTpm")]
    pub early_rh_abs_slope_max_pct_pm: f32,
}

impl Default for LowExitThresholds {
    fn default() -> Self {
        Self {
            temp_diff_max_c: 2.2,
            rh_diff_max_pct: 4.0,
            early_sec: 180,
            early_temp_slope_max_c_pm: -0.5,
            early_rh_abs_slope_max_pct_pm: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Safety alarms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    pub forgotten_boil: ForgottenBoilThresholds,
    pub burning_sauce: BurningSauceThresholds,
    pub clear: AlarmClearThresholds,
    pub arm_after_s: u64,
    pub rearm_delay_s: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            forgotten_boil: ForgottenBoilThresholds::default(),
            burning_sauce: BurningSauceThresholds::default(),
            clear: AlarmClearThresholds::default(),
            arm_after_s: 120,
            rearm_delay_s: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgottenBoilThresholds {
    #[serde(rename = "temp_diff_C")]
    pub temp_diff_c: f32,
    #[serde(rename = "temp_slope_long_Cpm")]
    pub temp_slope_long_c_pm: f32,
    #[serde(rename = "rh_slope_long_max_PCTpm")]
    pub rh_slope_long_max_pct_pm: f32,
}

impl Default for ForgottenBoilThresholds {
    fn default() -> Self {
        Self {
            temp_diff_c: 8.0,
            temp_slope_long_c_pm: 0.5,
            rh_slope_long_max_pct_pm: -0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurningSauceThresholds {
    #[serde(rename = "temp_diff_C")]
    pub temp_diff_c: f32,
    #[serde(rename = "rh_diff_max_PCT")]
    pub rh_diff_max_pct: f32,
    #[serde(rename = "temp_slope_long_Cpm")]
    pub temp_slope_long_c_pm: f32,
}

impl Default for BurningSauceThresholds {
    fn default() -> Self {
        Self {
            temp_diff_c: 12.0,
            rh_diff_max_pct: 1.5,
            temp_slope_long_c_pm: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmClearThresholds {
    /// Long-window temperature slope at or below which the hood is cooling.
    #[serde(rename = "cooling_temp_slope_long_max_Cpm")]
    pub cooling_temp_slope_long_max_c_pm: f32,
    /// Humidity differential at or below which humidity has recovered.
    #[serde(rename = "rh_recover_diff_max_PCT")]
    pub rh_recover_diff_max_pct: f32,
}

impl Default for AlarmClearThresholds {
    fn default() -> Self {
        Self {
            cooling_temp_slope_long_max_c_pm: -0.1,
            rh_recover_diff_max_pct: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence & dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// A stored override older than this is discarded at startup.
    pub max_restore_age_s: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            max_restore_age_s: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub heating_window_s: u64,
    #[serde(rename = "heating_slope_Cpm")]
    pub heating_slope_c_pm: f32,
    /// Number of completed polls between state summary log lines.
    pub summary_every_polls: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            heating_window_s: 60,
            heating_slope_c_pm: 0.5,
            summary_every_polls: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl HoodConfig {
    /// Range-check the configuration.
    ///
    /// Rejects values that would make the controller oscillate or never
    /// react, rather than silently clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if !(t.ema_alpha > 0.0 && t.ema_alpha <= 1.0) {
            return Err(ConfigError::ValidationFailed(
                "timing.ema_alpha must be in (0, 1]",
            ));
        }
        if !(5..=600).contains(&t.win.sample_s) {
            return Err(ConfigError::ValidationFailed(
                "timing.win.sample_s must be 5–600",
            ));
        }
        if t.win.short_s == 0 || t.win.long_s < t.win.short_s {
            return Err(ConfigError::ValidationFailed(
                "timing.win.long_s must be >= short_s > 0",
            ));
        }
        if t.poll_stuck_s <= t.win.sample_s / 2 {
            return Err(ConfigError::ValidationFailed(
                "timing.poll_stuck_s must exceed half the sample period",
            ));
        }
        if !(1..=4).contains(&self.speeds.start_on) {
            return Err(ConfigError::ValidationFailed("speeds.start_on must be 1–4"));
        }
        if self.manual.timeout_min <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "manual.timeout_min must be positive",
            ));
        }
        let th = &self.thresholds;
        if th.on_low.temp_slope_c_pm <= th.heat_signal_slope_c_pm {
            return Err(ConfigError::ValidationFailed(
                "on_low.temp_slope_Cpm must exceed heat_signal_slope_Cpm",
            ));
        }
        if th.down.from3.temp_diff_max_c >= th.up_2_to_3.temp_diff_c {
            return Err(ConfigError::ValidationFailed(
                "down.from3.temp_diff_max_C must be < up_2_to_3.temp_diff_C",
            ));
        }
        let hard_cap_s = th.cooldown.hard_cap_min.checked_mul(60);
        if th.cooldown.hard_cap_min == 0
            || hard_cap_s.is_none_or(|cap_s| cap_s <= th.cooldown.med_hold_s)
        {
            return Err(ConfigError::ValidationFailed(
                "cooldown.hard_cap_min must outlast cooldown.med_hold_s",
            ));
        }
        if th.cooldown.override_trigger.temp_slope_c_pm <= 0.0
            || th.cooldown.override_trigger.rh_slope_pct_pm <= 0.0
        {
            return Err(ConfigError::ValidationFailed(
                "cooldown.override_trigger slopes must be positive",
            ));
        }
        let a = &self.alarm;
        if a.burning_sauce.temp_diff_c <= th.on_low.temp_diff_c
            || a.forgotten_boil.temp_diff_c <= th.on_low.temp_diff_c
        {
            return Err(ConfigError::ValidationFailed(
                "alarm temp_diff_C thresholds must exceed on_low.temp_diff_C",
            ));
        }
        if a.rearm_delay_s < th.lockout_s {
            return Err(ConfigError::ValidationFailed(
                "alarm.rearm_delay_s must be >= thresholds.lockout_s",
            ));
        }
        if self.persistence.max_restore_age_s == 0 {
            return Err(ConfigError::ValidationFailed(
                "persistence.max_restore_age_s must be positive",
            ));
        }
        Ok(())
    }
}
