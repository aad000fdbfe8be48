//! Mock hood adapter for integration tests.
//!
//! Serves fixed per-channel readings and records every actuator,
//! hazard-switch and dashboard call so tests can assert on the full
//! command history without a real relay board.

use hoodfan::app::events::AppEvent;
use hoodfan::app::ports::{ActuatorPort, DashboardPort, EventSink, HazardPort, SensorPort};
use hoodfan::dashboard::StatusLabel;
use hoodfan::error::{ActuatorError, SensorError};
use hoodfan::fsm::FanSpeed;
use hoodfan::sensors::{Channel, RawReadings};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HoodCall {
    Press(u8),
    Light(bool),
    Switch { id: u8, on: bool },
    Status(StatusLabel),
    Visual(String),
    Verbose(String),
    Slider(FanSpeed),
}

/// How a channel should misbehave on the next reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    Unreachable,
    Empty,
    NotANumber,
}

// ── MockHood ──────────────────────────────────────────────────

pub struct MockHood {
    pub readings: RawReadings,
    pub fault: Option<(Channel, Fault)>,
    pub reads: Vec<Channel>,
    pub calls: Vec<HoodCall>,
}

#[allow(dead_code)]
impl MockHood {
    /// Room at 22 °C / 45 %, hood equal to the room.
    pub fn new() -> Self {
        Self {
            readings: RawReadings {
                hood_temp: 22.0,
                hood_rh: 45.0,
                room_temp: 22.0,
                room_rh: 45.0,
            },
            fault: None,
            reads: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn set_hood(&mut self, temp: f32, rh: f32) {
        self.readings.hood_temp = temp;
        self.readings.hood_rh = rh;
    }

    /// Relay and light calls only, in order.
    pub fn relay_calls(&self) -> Vec<HoodCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, HoodCall::Press(_) | HoodCall::Light(_)))
            .cloned()
            .collect()
    }

    pub fn presses(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HoodCall::Press(line) => Some(*line),
                _ => None,
            })
            .collect()
    }

    pub fn switch_calls(&self) -> Vec<(u8, bool)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HoodCall::Switch { id, on } => Some((*id, *on)),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<StatusLabel> {
        self.calls.iter().rev().find_map(|c| match c {
            HoodCall::Status(label) => Some(*label),
            _ => None,
        })
    }

    pub fn last_slider(&self) -> Option<FanSpeed> {
        self.calls.iter().rev().find_map(|c| match c {
            HoodCall::Slider(speed) => Some(*speed),
            _ => None,
        })
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockHood {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHood {
    fn read(&mut self, channel: Channel) -> Result<Option<f32>, SensorError> {
        self.reads.push(channel);
        match self.fault {
            Some((ch, Fault::Unreachable)) if ch == channel => {
                Err(SensorError::Unreachable(channel))
            }
            Some((ch, Fault::Empty)) if ch == channel => Ok(None),
            Some((ch, Fault::NotANumber)) if ch == channel => Ok(Some(f32::NAN)),
            _ => Ok(Some(self.readings.get(channel))),
        }
    }
}

impl ActuatorPort for MockHood {
    fn press_line(&mut self, line: u8) -> Result<(), ActuatorError> {
        self.calls.push(HoodCall::Press(line));
        Ok(())
    }

    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(HoodCall::Light(on));
        Ok(())
    }
}

impl HazardPort for MockHood {
    fn set_switch(&mut self, id: u8, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(HoodCall::Switch { id, on });
        Ok(())
    }
}

impl DashboardPort for MockHood {
    fn set_status(&mut self, label: StatusLabel) {
        self.calls.push(HoodCall::Status(label));
    }

    fn set_visual(&mut self, line: &str) {
        self.calls.push(HoodCall::Visual(line.to_string()));
    }

    fn set_verbose(&mut self, line: &str) {
        self.calls.push(HoodCall::Verbose(line.to_string()));
    }

    fn set_speed(&mut self, speed: FanSpeed) {
        self.calls.push(HoodCall::Slider(speed));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speed_changes(&self) -> Vec<&AppEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::SpeedChanged { .. }))
            .collect()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.iter().any(|e| e == event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
