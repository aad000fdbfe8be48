//! Speed-button relay driver.
//!
//! The hood has no speed input of its own, only four momentary buttons
//! wired to relay outputs.  Pressing a speed button selects that speed; the
//! fan is switched off by pressing Low once when it runs at Low, or twice
//! (`double_press_ms` apart) from any other speed.  The hood light follows
//! the fan with a short delay.
//!
//! ```text
//!  → Low..Turbo : press s1..s4 ──[light_delay]──▶ light on
//!  Low → Off    : press s1, light off
//!  * → Off      : press s1 ──[double_press]──▶ press s1, light off
//! ```
//!
//! Delayed steps are parked in the [`Scheduler`]; the service calls
//! [`RelayDriver::second_pulse`] and [`RelayDriver::light_on`] when they
//! fire.

use log::{debug, info};

use crate::app::ports::ActuatorPort;
use crate::config::{OutputLines, TimingConfig};
use crate::error::Result;
use crate::fsm::{FanSpeed, SpeedChange};
use crate::scheduler::{DeferredAction, Scheduler, TimerSlot};

pub struct RelayDriver {
    lines: OutputLines,
    /// Last light state we commanded.
    light_on: bool,
}

impl RelayDriver {
    pub fn new(lines: OutputLines) -> Self {
        Self {
            lines,
            light_on: false,
        }
    }

    pub fn set_lines(&mut self, lines: OutputLines) {
        self.lines = lines;
    }

    /// Output line for a running speed; `None` for Off.
    pub fn line_for(&self, speed: FanSpeed) -> Option<u8> {
        match speed {
            FanSpeed::Off => None,
            FanSpeed::Low => Some(self.lines.s1),
            FanSpeed::Med => Some(self.lines.s2),
            FanSpeed::High => Some(self.lines.s3),
            FanSpeed::Turbo => Some(self.lines.s4),
        }
    }

    pub fn light_is_on(&self) -> bool {
        self.light_on
    }

    /// Issue the relay sequence for an applied speed change.
    pub fn drive(
        &mut self,
        change: &SpeedChange,
        hw: &mut impl ActuatorPort,
        scheduler: &mut Scheduler,
        now_ms: u64,
        timing: &TimingConfig,
    ) -> Result<()> {
        if let Some(line) = self.line_for(change.to) {
            scheduler.schedule(DeferredAction::LightOn, now_ms, timing.light_delay_ms);
            hw.press_line(line)?;
            return Ok(());
        }

        scheduler.cancel(TimerSlot::LightDelay);
        if change.from == FanSpeed::Low {
            info!("[SPEED] Low -> Off (single pulse)");
            hw.press_line(self.lines.s1)?;
            self.set_light(hw, false)
        } else {
            info!("[SPEED] {} -> Off (double pulse)", change.from.label());
            scheduler.schedule(DeferredAction::TurnOffPulse, now_ms, timing.double_press_ms);
            hw.press_line(self.lines.s1)?;
            Ok(())
        }
    }

    /// Second half of the double-press Off.
    pub fn second_pulse(&mut self, hw: &mut impl ActuatorPort) -> Result<()> {
        info!("[SPEED] Pulse 2 (-> Off)");
        hw.press_line(self.lines.s1)?;
        self.set_light(hw, false)
    }

    pub fn light_on(&mut self, hw: &mut impl ActuatorPort) -> Result<()> {
        self.set_light(hw, true)
    }

    fn set_light(&mut self, hw: &mut impl ActuatorPort, on: bool) -> Result<()> {
        if self.light_on == on {
            return Ok(());
        }
        self.light_on = on;
        hw.set_light(on)?;
        debug!("Light -> {}", if on { "ON" } else { "OFF" });
        Ok(())
    }
}
