//! Wall-clock adapters.
//!
//! The controller works in Unix-epoch milliseconds so that persisted
//! timestamps stay meaningful across restarts.
//!
//! - [`SystemClock`] reads the host clock.
//! - [`ScaledClock`] runs a virtual clock `speedup` times faster than real
//!   time, for the simulation binary.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of "now" for the control tasks.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScaledClock {
    origin_ms: u64,
    started: Instant,
    speedup: u32,
}

impl ScaledClock {
    pub fn new(origin_ms: u64, speedup: u32) -> Self {
        Self {
            origin_ms,
            started: Instant::now(),
            speedup: speedup.max(1),
        }
    }

    pub fn speedup(&self) -> u32 {
        self.speedup
    }
}

impl Clock for ScaledClock {
    fn now_ms(&self) -> u64 {
        let real_ms = self.started.elapsed().as_millis() as u64;
        self.origin_ms
            .saturating_add(real_ms.saturating_mul(u64::from(self.speedup)))
    }
}
