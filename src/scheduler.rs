//! Deferred side-effect scheduler.
//!
//! The controller never sleeps inline.  Anything that must happen a little
//! later (the second Off pulse, switching the light, a debounced state
//! write, dashboard updates, the hazard switch) is parked in a fixed slot
//! with a due time, and the timer task drains due actions.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  slot              pending action           delay         │
//! │  SaveState         SaveState                save_debounce │
//! │  TurnOffSequence   TurnOffPulse             double_press  │
//! │  LightDelay        LightOn                  light_delay   │
//! │  StatusSync        StatusSync{..}           status_delay  │
//! │  DashboardRefresh  DashboardRefresh(..)     dashboard     │
//! │  HazardNotify      HazardSwitch(on)         hazard_delay  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Each slot holds at most one action.  Scheduling into a busy slot
//! replaces the pending action and restarts its delay, so bursts coalesce
//! into a single effect.

use heapless::Vec;
use log::debug;

use crate::dashboard::Trend;
use crate::fsm::FanSpeed;

// ═══════════════════════════════════════════════════════════════
//  Slot & action types
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimerSlot {
    SaveState = 0,
    TurnOffSequence = 1,
    LightDelay = 2,
    StatusSync = 3,
    DashboardRefresh = 4,
    HazardNotify = 5,
}

impl TimerSlot {
    pub const COUNT: usize = 6;

    pub fn name(self) -> &'static str {
        match self {
            Self::SaveState => "save_state",
            Self::TurnOffSequence => "turn_off_sequence",
            Self::LightDelay => "light_delay",
            Self::StatusSync => "status_sync",
            Self::DashboardRefresh => "dashboard_refresh",
            Self::HazardNotify => "hazard_notify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeferredAction {
    /// Write the override/cooldown blob.
    SaveState,
    /// Second Low-line pulse of the double-press Off, then light off.
    TurnOffPulse,
    LightOn,
    /// Refresh the status label and, unless the change came from the
    /// slider itself, push `speed` back to the slider.
    StatusSync { speed: FanSpeed, sync_slider: bool },
    DashboardRefresh(Trend),
    HazardSwitch(bool),
}

impl DeferredAction {
    pub fn slot(&self) -> TimerSlot {
        match self {
            Self::SaveState => TimerSlot::SaveState,
            Self::TurnOffPulse => TimerSlot::TurnOffSequence,
            Self::LightOn => TimerSlot::LightDelay,
            Self::StatusSync { .. } => TimerSlot::StatusSync,
            Self::DashboardRefresh(_) => TimerSlot::DashboardRefresh,
            Self::HazardSwitch(_) => TimerSlot::HazardNotify,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    due_ms: u64,
    action: DeferredAction,
}

/// Actions fired by one [`Scheduler::take_due`] call, in slot order.
pub type DueActions = Vec<DeferredAction, { TimerSlot::COUNT }>;

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    slots: [Option<Pending>; TimerSlot::COUNT],
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `action` in its slot, due `delay_ms` from `now_ms`.
    pub fn schedule(&mut self, action: DeferredAction, now_ms: u64, delay_ms: u64) {
        let slot = action.slot();
        let entry = &mut self.slots[slot as usize];
        if entry.is_some() {
            debug!("Scheduler: '{}' rescheduled", slot.name());
        }
        *entry = Some(Pending {
            due_ms: now_ms.saturating_add(delay_ms),
            action,
        });
    }

    /// Drop a pending action.  Returns `true` if one was pending.
    pub fn cancel(&mut self, slot: TimerSlot) -> bool {
        let was = self.slots[slot as usize].take().is_some();
        if was {
            debug!("Scheduler: '{}' cancelled", slot.name());
        }
        was
    }

    pub fn is_pending(&self, slot: TimerSlot) -> bool {
        self.slots[slot as usize].is_some()
    }

    /// Remove and return every action due at `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> DueActions {
        let mut due = DueActions::new();
        for entry in &mut self.slots {
            if entry.is_some_and(|p| p.due_ms <= now_ms) {
                if let Some(p) = entry.take() {
                    // Capacity is TimerSlot::COUNT, one action per slot.
                    let pushed = due.push(p.action);
                    debug_assert!(pushed.is_ok(), "DueActions sized below TimerSlot::COUNT");
                }
            }
        }
        due
    }

    /// Earliest due time across all slots.
    pub fn next_due(&self) -> Option<u64> {
        self.slots.iter().flatten().map(|p| p.due_ms).min()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
