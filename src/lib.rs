//! Hood fan controller library.
//!
//! Exposes the decision engine and its adapters for the host binary,
//! integration testing and fuzzing.  Device access goes through the port
//! traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod drivers;
pub mod error;
pub mod events;
pub mod fsm;
pub mod manual;
pub mod persistence;
pub mod safety;
pub mod scheduler;
pub mod sensors;
