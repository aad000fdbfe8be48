//! Speed handlers and table builder.
//!
//! Each row is a plain `fn` pointer: no closures, no dynamic dispatch.
//!
//! ```text
//!  OFF ──[slope / diff+slope]──▶ LOW ──[slope / diff]──▶ MED ──[rise, no lid]──▶ HIGH
//!                                 ▲                        │  ▲                     │
//!                                 └────[quiet, stable]─────┘  └──[cooling, stable]──┘
//!
//!  TURBO is reached only by alarm or manual input and holds until
//!  heat loss hands the fan to the cooldown sub-machine.
//! ```
//!
//! Downshift rules need the level to have been held for `down.stable_s`
//! and are checked before the upshift rules.

use super::context::ControlContext;
use super::{FanSpeed, Reason, SpeedDecision, SpeedDescriptor};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_speed_table() -> [SpeedDescriptor; FanSpeed::COUNT] {
    [
        SpeedDescriptor {
            speed: FanSpeed::Off,
            name: "Off",
            on_update: off_update,
        },
        SpeedDescriptor {
            speed: FanSpeed::Low,
            name: "Low",
            on_update: low_update,
        },
        SpeedDescriptor {
            speed: FanSpeed::Med,
            name: "Med",
            on_update: med_update,
        },
        SpeedDescriptor {
            speed: FanSpeed::High,
            name: "High",
            on_update: high_update,
        },
        SpeedDescriptor {
            speed: FanSpeed::Turbo,
            name: "Turbo",
            on_update: turbo_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF: detect the start of cooking
// ═══════════════════════════════════════════════════════════════════════════

fn off_update(ctx: &ControlContext<'_>) -> Option<SpeedDecision> {
    let th = &ctx.config.thresholds.on_low;
    let s = &ctx.signals;
    let start = FanSpeed::from_level(ctx.config.speeds.start_on);

    if s.temp_slope >= th.temp_slope_c_pm {
        return Some(SpeedDecision::with_value(start, Reason::OnTempSlope, s.temp_slope));
    }
    if s.rh_slope >= th.rh_slope_pct_pm {
        return Some(SpeedDecision::with_value(start, Reason::OnRhSlope, s.rh_slope));
    }
    // A large differential alone can be a warm room; require some rise too.
    if s.has_trend() {
        if s.temp_diff >= th.temp_diff_c && s.temp_slope > th.diff_slope_min_pm {
            return Some(SpeedDecision::with_value(start, Reason::OnTempDiff, s.temp_diff));
        }
        if s.rh_diff >= th.rh_diff_pct && s.rh_slope > th.diff_slope_min_pm {
            return Some(SpeedDecision::with_value(start, Reason::OnRhDiff, s.rh_diff));
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOW
// ═══════════════════════════════════════════════════════════════════════════

fn low_update(ctx: &ControlContext<'_>) -> Option<SpeedDecision> {
    let th = &ctx.config.thresholds.up_1_to_2;
    let s = &ctx.signals;

    let up = s.temp_slope >= th.temp_slope_c_pm
        || s.temp_diff >= th.temp_diff_c
        || s.rh_slope >= th.rh_slope_pct_pm
        || s.rh_diff >= th.rh_diff_pct;
    up.then(|| SpeedDecision::with_value(FanSpeed::Med, Reason::UpLowToMed, s.temp_slope))
}

// ═══════════════════════════════════════════════════════════════════════════
//  MED
// ═══════════════════════════════════════════════════════════════════════════

fn med_update(ctx: &ControlContext<'_>) -> Option<SpeedDecision> {
    let th = &ctx.config.thresholds;
    let s = &ctx.signals;

    if ctx.is_stable() {
        let d = &th.down.from2;
        if s.temp_slope <= d.temp_slope_max_c_pm
            && s.temp_diff <= d.temp_diff_max_c
            && s.rh_diff <= d.rh_diff_max_pct
        {
            return Some(SpeedDecision::with_value(
                FanSpeed::Low,
                Reason::DownMedToLow,
                s.temp_slope,
            ));
        }
    }

    if ctx.lid_likely() {
        return None;
    }
    let u = &th.up_2_to_3;
    let fast_rise = s.temp_slope >= u.temp_slope_c_pm && s.temp_diff >= u.temp_diff_c;
    // Long slope projected over five minutes.
    let sustained = s.temp_slope_long * 5.0 >= u.long_temp_increase_c;
    (fast_rise || sustained)
        .then(|| SpeedDecision::with_value(FanSpeed::High, Reason::UpMedToHigh, s.temp_slope))
}

// ═══════════════════════════════════════════════════════════════════════════
//  HIGH
// ═══════════════════════════════════════════════════════════════════════════

fn high_update(ctx: &ControlContext<'_>) -> Option<SpeedDecision> {
    if !ctx.is_stable() {
        return None;
    }
    let d = &ctx.config.thresholds.down.from3;
    let s = &ctx.signals;
    (s.temp_slope <= d.temp_slope_max_c_pm || s.temp_diff <= d.temp_diff_max_c)
        .then(|| SpeedDecision::with_value(FanSpeed::Med, Reason::DownHighToMed, s.temp_slope))
}

// ═══════════════════════════════════════════════════════════════════════════
//  TURBO
// ═══════════════════════════════════════════════════════════════════════════

fn turbo_update(_ctx: &ControlContext<'_>) -> Option<SpeedDecision> {
    None
}
