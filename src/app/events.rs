//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::SensorError;
use crate::fsm::cooldown::CooldownKind;
use crate::fsm::{FanSpeed, Reason};
use crate::safety::{AlarmKind, ClearCause};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.  `restored` is set when override or
    /// cooldown state was carried over from storage.
    Started { restored: bool },

    /// An applied speed change.
    SpeedChanged {
        from: FanSpeed,
        to: FanSpeed,
        reason: Reason,
    },

    AlarmRaised(AlarmKind),

    AlarmCleared(ClearCause),

    CooldownStarted(CooldownKind),

    /// Renewed cooking activity cancelled the cooldown ramp.
    CooldownInterrupted,

    /// The manual override timed out; automatic control resumes.
    OverrideExpired,

    /// A poll chain was abandoned; no control action this cycle.
    PollAborted(SensorError),

    /// Periodic state summary.
    Summary(StateSummary),
}

/// Snapshot for the periodic summary line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSummary {
    pub speed: FanSpeed,
    /// Cooldown kind and rough seconds remaining.
    pub cooldown: Option<(CooldownKind, i64)>,
    pub manual: bool,
}

impl StateSummary {
    /// Fan off with no cooldown pending.
    pub fn is_standby(&self) -> bool {
        !self.speed.is_on() && self.cooldown.is_none()
    }
}
