//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (speed slider,
//! console, provisioning) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.

use crate::config::HoodConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// User moved the speed slider (0 = stop, 1–4 = speed).
    SelectSpeed(u8),

    /// Hot-reload configuration.  Rejected unless it validates.
    UpdateConfig(Box<HoodConfig>),
}
