//! Dashboard text derivation.
//!
//! Pure functions that turn controller state into the strings shown on the
//! device's virtual components: a status label, a compact visual line with
//! trend glyphs and a verbose numeric line.

use core::fmt;

use crate::sensors::signals::Signals;

/// Snapshot of the four numbers the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Trend {
    pub temp_diff: f32,
    pub rh_diff: f32,
    pub temp_slope: f32,
    pub rh_slope: f32,
}

impl From<&Signals> for Trend {
    fn from(s: &Signals) -> Self {
        Self {
            temp_diff: s.temp_diff,
            rh_diff: s.rh_diff,
            temp_slope: s.temp_slope,
            rh_slope: s.rh_slope,
        }
    }
}

// ── Status label ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLabel {
    Ready,
    Cooking,
    Heating,
    Venting,
    Manual,
    Alarm,
}

impl StatusLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Cooking => "COOKING",
            Self::Heating => "HEATING",
            Self::Venting => "VENTING",
            Self::Manual => "MANUAL",
            Self::Alarm => "ALARM",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for [`status_label`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatusInputs {
    pub fan_on: bool,
    pub alarm: bool,
    pub manual: bool,
    pub cooldown: bool,
    /// Hood temperature slope over the heating window.
    pub heating_slope: f32,
}

/// Priority: ALARM > MANUAL > VENTING > HEATING > COOKING > READY.
/// Only an alarm is shown with the fan off.
pub fn status_label(inp: &StatusInputs, heating_slope_c_pm: f32) -> StatusLabel {
    if inp.alarm {
        return StatusLabel::Alarm;
    }
    if !inp.fan_on {
        return StatusLabel::Ready;
    }
    if inp.manual {
        StatusLabel::Manual
    } else if inp.cooldown {
        StatusLabel::Venting
    } else if inp.heating_slope > heating_slope_c_pm {
        StatusLabel::Heating
    } else {
        StatusLabel::Cooking
    }
}

// ── Trend glyphs ──────────────────────────────────────────────

const RISE_FAST: &str = "⏫";
const RISE: &str = "🔼";
const FALL_FAST: &str = "⏬";
const FALL: &str = "🔽";
const TEMP_STABLE: &str = "◀️";
const RH_STABLE: &str = "▶️";

/// Arrow for a slope with a small (`low`) and large (`high`) threshold.
pub fn trend_glyph(slope: f32, low: f32, high: f32, stable: &'static str) -> &'static str {
    if slope > high {
        RISE_FAST
    } else if slope > low {
        RISE
    } else if slope < -high {
        FALL_FAST
    } else if slope < -low {
        FALL
    } else {
        stable
    }
}

/// `🌡️{tdiff}{glyph}|💧{rhdiff}{glyph}`
pub fn visual_line(t: &Trend) -> String {
    let tg = trend_glyph(t.temp_slope, 0.3, 2.0, TEMP_STABLE);
    let rg = trend_glyph(t.rh_slope, 1.0, 5.0, RH_STABLE);
    format!("🌡️{:.1}{}|💧{:.1}{}", t.temp_diff, tg, t.rh_diff, rg)
}

/// `T:{tdiff}/{tslope} H:{rhdiff}/{rhslope}`
pub fn verbose_line(t: &Trend) -> String {
    format!(
        "T:{:.1}/{:.1} H:{:.1}/{:.1}",
        t.temp_diff, t.temp_slope, t.rh_diff, t.rh_slope
    )
}
