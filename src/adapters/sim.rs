//! Simulated kitchen.
//!
//! Implements every device-facing port against a small physical model so
//! the host binary can run the controller end-to-end.  The hood pair
//! follows a repeating cooking profile on top of a steady room:
//!
//! ```text
//!  minute   0 ── 3        idle
//!           3 ── 20       cooking: temp +1.0 °C/min (cap 6), RH +3 %/min (cap 15)
//!          20 ── 35       cooling: exponential decay, tau 3 min
//!          35 ── 45       idle, then repeat
//! ```
//!
//! A running fan pulls the hood readings toward the room.  The relay model
//! mirrors the real hood: pressing Low while at Low switches the fan off.

use log::{debug, info};

use crate::app::ports::{ActuatorPort, DashboardPort, HazardPort, SensorPort};
use crate::config::OutputLines;
use crate::dashboard::StatusLabel;
use crate::error::{ActuatorError, SensorError};
use crate::fsm::FanSpeed;
use crate::sensors::Channel;

const ROOM_TEMP_C: f32 = 22.0;
const ROOM_RH_PCT: f32 = 45.0;
const CYCLE_MIN: f32 = 45.0;

/// `(temp_diff, rh_diff)` of the unventilated hood at `minute` into the
/// cycle.
fn cooking_profile(minute: f32) -> (f32, f32) {
    let m = minute.rem_euclid(CYCLE_MIN);
    let peak = |t: f32| ((t - 3.0) * 1.0).clamp(0.0, 6.0);
    let peak_rh = |t: f32| ((t - 3.0) * 3.0).clamp(0.0, 15.0);
    let (t, rh) = if m < 3.0 {
        (0.0, 0.0)
    } else if m < 20.0 {
        (peak(m), peak_rh(m))
    } else if m < 35.0 {
        let decay = (-(m - 20.0) / 3.0).exp();
        (peak(20.0) * decay, peak_rh(20.0) * decay)
    } else {
        (0.0, 0.0)
    };
    (t + 0.3, rh + 1.0)
}

pub struct SimulatedKitchen {
    origin_ms: u64,
    now_ms: u64,
    lines: OutputLines,
    fan: FanSpeed,
    light: bool,
    hazard: bool,
    status: Option<StatusLabel>,
    slider: FanSpeed,
}

impl SimulatedKitchen {
    pub fn new(origin_ms: u64, lines: OutputLines) -> Self {
        Self {
            origin_ms,
            now_ms: origin_ms,
            lines,
            fan: FanSpeed::Off,
            light: false,
            hazard: false,
            status: None,
            slider: FanSpeed::Off,
        }
    }

    /// Advance the model to `now_ms`.
    pub fn set_time(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn fan(&self) -> FanSpeed {
        self.fan
    }

    pub fn light(&self) -> bool {
        self.light
    }

    pub fn hazard(&self) -> bool {
        self.hazard
    }

    pub fn status(&self) -> Option<StatusLabel> {
        self.status
    }

    pub fn slider(&self) -> FanSpeed {
        self.slider
    }

    fn minute(&self) -> f32 {
        self.now_ms.saturating_sub(self.origin_ms) as f32 / 60_000.0
    }

    /// Fraction of the hood excess left after extraction.
    fn extraction(&self) -> f32 {
        1.0 - 0.08 * f32::from(self.fan.level())
    }
}

impl SensorPort for SimulatedKitchen {
    fn read(&mut self, channel: Channel) -> Result<Option<f32>, SensorError> {
        let (t_ex, rh_ex) = cooking_profile(self.minute());
        let k = self.extraction();
        let value = match channel {
            Channel::HoodTemp => ROOM_TEMP_C + t_ex * k,
            Channel::HoodHumidity => ROOM_RH_PCT + rh_ex * k,
            Channel::RoomTemp => ROOM_TEMP_C,
            Channel::RoomHumidity => ROOM_RH_PCT,
        };
        Ok(Some(value))
    }
}

impl ActuatorPort for SimulatedKitchen {
    fn press_line(&mut self, line: u8) -> Result<(), ActuatorError> {
        let l = self.lines;
        self.fan = match line {
            x if x == l.s1 => {
                if self.fan == FanSpeed::Low {
                    FanSpeed::Off
                } else {
                    FanSpeed::Low
                }
            }
            x if x == l.s2 => FanSpeed::Med,
            x if x == l.s3 => FanSpeed::High,
            x if x == l.s4 => FanSpeed::Turbo,
            _ => return Err(ActuatorError::LineWriteFailed(line)),
        };
        debug!("SIM | line {} pressed, hood fan now {}", line, self.fan);
        Ok(())
    }

    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.light = on;
        debug!("SIM | light {}", if on { "on" } else { "off" });
        Ok(())
    }
}

impl HazardPort for SimulatedKitchen {
    fn set_switch(&mut self, id: u8, on: bool) -> Result<(), ActuatorError> {
        self.hazard = on;
        info!("SIM | hazard switch {} -> {}", id, on);
        Ok(())
    }
}

impl DashboardPort for SimulatedKitchen {
    fn set_status(&mut self, label: StatusLabel) {
        if self.status != Some(label) {
            info!("DASH | status {}", label);
        }
        self.status = Some(label);
    }

    fn set_visual(&mut self, line: &str) {
        info!("DASH | {}", line);
    }

    fn set_verbose(&mut self, line: &str) {
        debug!("DASH | {}", line);
    }

    fn set_speed(&mut self, speed: FanSpeed) {
        self.slider = speed;
    }
}
