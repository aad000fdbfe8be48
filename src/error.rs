//! Unified error types for the hood controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! pass through the acquisition chain and actuation layer without allocation.

use core::fmt;

use crate::sensors::Channel;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned unusable data.
    Sensor(SensorError),
    /// A relay or remote switch command failed.
    Actuator(ActuatorError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The remote sensor did not answer.
    Unreachable(Channel),
    /// The sensor answered without a value.
    Missing(Channel),
    /// The value was NaN or infinite.
    NonFinite(Channel),
}

impl SensorError {
    pub fn channel(self) -> Channel {
        match self {
            Self::Unreachable(c) | Self::Missing(c) | Self::NonFinite(c) => c,
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable(c) => write!(f, "{c} unreachable"),
            Self::Missing(c) => write!(f, "{c} returned no value"),
            Self::NonFinite(c) => write!(f, "{c} returned a non-finite value"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Relay line pulse failed.
    LineWriteFailed(u8),
    /// Remote switch (light / hazard) did not acknowledge.
    SwitchUnreachable(u8),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineWriteFailed(line) => write!(f, "relay line {line} write failed"),
            Self::SwitchUnreachable(id) => write!(f, "switch {id} unreachable"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
