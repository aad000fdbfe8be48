//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the service that runs the hood controller: the poll
//! chain, the control cycle and the deferred side effects.  All
//! interaction with devices happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without a real hood.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
