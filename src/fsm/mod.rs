//! Function-pointer fan speed state machine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  SpeedTable                                     │
//! │  ┌─────────┬────────┬──────────────────────────┐│
//! │  │ speed   │ name   │ on_update                ││
//! │  ├─────────┼────────┼──────────────────────────┤│
//! │  │ Off     │ "Off"  │ fn(ctx) -> Option<Dec>   ││
//! │  │ Low     │ "Low"  │ fn(ctx) -> Option<Dec>   ││
//! │  │ Med     │ "Med"  │ fn(ctx) -> Option<Dec>   ││
//! │  │ High    │ "High" │ fn(ctx) -> Option<Dec>   ││
//! │  │ Turbo   │ "Turbo"│ fn(ctx) -> Option<Dec>   ││
//! │  └─────────┴────────┴──────────────────────────┘│
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Each control cycle the service asks the **current** row's `on_update`
//! for a [`SpeedDecision`].  Decisions from every source (this table, the
//! cooldown sub-machine, the alarm detector, manual input) go through the
//! single entry point [`Fsm::apply`], which is the only place the level
//! and its timestamps change.

pub mod context;
pub mod cooldown;
pub mod states;

use core::fmt;

use context::ControlContext;
use log::info;

// ---------------------------------------------------------------------------
// Speed identity
// ---------------------------------------------------------------------------

/// Fan speed level.  Must stay in sync with [`states::build_speed_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum FanSpeed {
    #[default]
    Off = 0,
    Low = 1,
    Med = 2,
    High = 3,
    Turbo = 4,
}

impl FanSpeed {
    pub const COUNT: usize = 5;

    /// Convert a table index back to `FanSpeed`.  Out-of-range indices
    /// assert in debug builds and fall back to `Off`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Off,
            1 => Self::Low,
            2 => Self::Med,
            3 => Self::High,
            4 => Self::Turbo,
            _ => {
                debug_assert!(false, "invalid speed index: {idx}");
                Self::Off
            }
        }
    }

    /// Clamp an arbitrary level into `0..=4`.
    pub fn from_level(level: u8) -> Self {
        Self::from_index(usize::from(level.min(4)))
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn is_on(self) -> bool {
        self != Self::Off
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Low => "Low",
            Self::Med => "Med",
            Self::High => "High",
            Self::Turbo => "Turbo",
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Why a speed change was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    OnTempSlope,
    OnRhSlope,
    OnTempDiff,
    OnRhDiff,
    UpLowToMed,
    UpMedToHigh,
    DownHighToMed,
    DownMedToLow,
    CooldownHeavy,
    CooldownLight,
    CooldownDropLow,
    CooldownExit,
    CooldownEarly,
    CooldownHardCap,
    AlarmForgottenBoil,
    AlarmBurningSauce,
    AlarmCleared,
    ManualSlider,
    ManualStop,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnTempSlope => "on_temp_slope",
            Self::OnRhSlope => "on_rh_slope",
            Self::OnTempDiff => "on_temp_diff_and_slope",
            Self::OnRhDiff => "on_rh_diff_and_slope",
            Self::UpLowToMed => "up_1_to_2",
            Self::UpMedToHigh => "up_2_to_3",
            Self::DownHighToMed => "down_3_to_2",
            Self::DownMedToLow => "down_2_to_1",
            Self::CooldownHeavy => "cooldown_heavy",
            Self::CooldownLight => "cooldown_light",
            Self::CooldownDropLow => "cooldown_drop_low",
            Self::CooldownExit => "cooldown_exit",
            Self::CooldownEarly => "cooldown_early",
            Self::CooldownHardCap => "cooldown_hardcap",
            Self::AlarmForgottenBoil => "alarm_forgotten_boil",
            Self::AlarmBurningSauce => "alarm_burning_sauce",
            Self::AlarmCleared => "alarm_cleared",
            Self::ManualSlider => "manual_slider",
            Self::ManualStop => "manual_stop",
        }
    }

    pub fn is_manual(self) -> bool {
        matches!(self, Self::ManualSlider | Self::ManualStop)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested speed, with the trigger and the signal value behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedDecision {
    pub target: FanSpeed,
    pub reason: Reason,
    pub value: Option<f32>,
}

impl SpeedDecision {
    pub fn new(target: FanSpeed, reason: Reason) -> Self {
        Self {
            target,
            reason,
            value: None,
        }
    }

    pub fn with_value(target: FanSpeed, reason: Reason, value: f32) -> Self {
        Self {
            target,
            reason,
            value: Some(value),
        }
    }
}

/// An applied transition, handed to the actuation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedChange {
    pub from: FanSpeed,
    pub to: FanSpeed,
    pub reason: Reason,
}

// ---------------------------------------------------------------------------
// Speed record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpeedState {
    pub level: FanSpeed,
    /// Time of the last applied change.
    pub last_change_ms: Option<u64>,
    /// Time of the last `Off → on` transition.
    pub last_on_ms: Option<u64>,
}

impl SpeedState {
    /// Whole seconds since the last change; `None` if never changed.
    pub fn secs_since_change(&self, now_ms: u64) -> Option<u64> {
        self.last_change_ms
            .map(|t| now_ms.saturating_sub(t) / 1000)
    }

    /// Whole seconds since the fan last switched on.
    pub fn secs_since_on(&self, now_ms: u64) -> Option<u64> {
        self.last_on_ms.map(|t| now_ms.saturating_sub(t) / 1000)
    }

    /// `true` once the level has been held for at least `dwell_s`.
    pub fn held_for(&self, now_ms: u64, dwell_s: u64) -> bool {
        self.last_change_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= dwell_s.saturating_mul(1000))
    }
}

// ---------------------------------------------------------------------------
// Table types
// ---------------------------------------------------------------------------

/// Per-cycle update handler.  Returns a decision, or `None` to hold.
pub type SpeedUpdateFn = fn(&ControlContext<'_>) -> Option<SpeedDecision>;

/// Static descriptor for a single speed row.
pub struct SpeedDescriptor {
    pub speed: FanSpeed,
    pub name: &'static str,
    pub on_update: SpeedUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `FanSpeed as usize`.
    table: [SpeedDescriptor; FanSpeed::COUNT],
    state: SpeedState,
    transitions: u32,
}

impl Fsm {
    pub fn new(table: [SpeedDescriptor; FanSpeed::COUNT]) -> Self {
        Self {
            table,
            state: SpeedState::default(),
            transitions: 0,
        }
    }

    /// Ask the current row for a decision.  Pure: nothing changes until
    /// the caller passes the decision to [`Fsm::apply`].
    pub fn tick(&self, ctx: &ControlContext<'_>) -> Option<SpeedDecision> {
        (self.table[self.state.level as usize].on_update)(ctx)
    }

    /// Single speed-change entry point.
    ///
    /// A target equal to the current level is a no-op.  Every applied
    /// change stamps `last_change_ms`; an `Off → on` change also stamps
    /// `last_on_ms`.
    pub fn apply(&mut self, decision: SpeedDecision, now_ms: u64) -> Option<SpeedChange> {
        let from = self.state.level;
        let to = decision.target;
        if to == from {
            return None;
        }

        match decision.value {
            Some(v) => info!(
                "[SPEED] {} -> {} ({} {:.2})",
                self.table[from as usize].name,
                self.table[to as usize].name,
                decision.reason,
                v
            ),
            None => info!(
                "[SPEED] {} -> {} ({})",
                self.table[from as usize].name,
                self.table[to as usize].name,
                decision.reason
            ),
        }

        self.state.level = to;
        self.state.last_change_ms = Some(now_ms);
        if !from.is_on() && to.is_on() {
            self.state.last_on_ms = Some(now_ms);
        }
        self.transitions = self.transitions.wrapping_add(1);

        Some(SpeedChange {
            from,
            to,
            reason: decision.reason,
        })
    }

    /// `true` while automatic transitions are blocked after a change.
    pub fn in_lockout(&self, now_ms: u64, lockout_s: u64) -> bool {
        !self.state.held_for(now_ms, lockout_s)
    }

    pub fn speed(&self) -> FanSpeed {
        self.state.level
    }

    pub fn state(&self) -> &SpeedState {
        &self.state
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }
}
