//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (remote sensors, speed relays, hazard switch, dashboard
//! components, storage) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the decision engine never touches a device directly.
//!
//! All port errors are typed.  The service logs them and keeps its local
//! state authoritative; nothing is retried.

use crate::config::HoodConfig;
use crate::dashboard::StatusLabel;
use crate::error::{ActuatorError, SensorError};
use crate::fsm::FanSpeed;
use crate::sensors::Channel;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: devices → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one reading per call, issued in chain order.
pub trait SensorPort {
    /// `Ok(None)` means the device answered without a usable value.
    fn read(&mut self, channel: Channel) -> Result<Option<f32>, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → relay lines)
// ───────────────────────────────────────────────────────────────

/// The hood's speed buttons and its light, behind relay outputs.
pub trait ActuatorPort {
    /// Momentarily close one output line.
    fn press_line(&mut self, line: u8) -> Result<(), ActuatorError>;

    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Hazard port (driven adapter: domain → remote switch)
// ───────────────────────────────────────────────────────────────

/// Spare remote switch that mirrors the hazard alarm.
pub trait HazardPort {
    fn set_switch(&mut self, id: u8, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Dashboard port (driven adapter: domain → virtual components)
// ───────────────────────────────────────────────────────────────

pub trait DashboardPort {
    fn set_status(&mut self, label: StatusLabel);

    fn set_visual(&mut self, line: &str);

    fn set_verbose(&mut self, line: &str);

    /// Move the speed slider without triggering a manual selection.
    fn set_speed(&mut self, speed: FanSpeed);
}

/// Everything the control cycle talks to.
pub trait HoodIo: SensorPort + ActuatorPort + HazardPort + DashboardPort {}

impl<T: SensorPort + ActuatorPort + HazardPort + DashboardPort> HoodIo for T {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the controller configuration.
///
/// Implementations MUST run [`HoodConfig::validate`] before persisting.
/// Out-of-range values are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Returns [`HoodConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<HoodConfig, ConfigError>;

    fn save(&self, config: &HoodConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ key-value store)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.  Keys are namespaced per subsystem and
/// writes are atomic.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
