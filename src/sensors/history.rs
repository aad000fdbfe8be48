//! Smoothed sample history.
//!
//! Every completed acquisition is passed through a per-channel exponential
//! moving average and appended to a fixed-size ring buffer.  Slopes are
//! computed over a trailing time window measured from the newest sample.
//!
//! ```text
//!  ring: [ s5 | s6 | s7 | s0 | s1 | s2 | s3 | s4 ]
//!                      ▲ head (oldest once full)
//! ```

use log::debug;

use super::{Channel, RawReadings};

/// Maximum number of retained samples.
pub const HISTORY_CAP: usize = 20;

/// One smoothed snapshot of all four channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// Wall-clock milliseconds since the Unix epoch.
    pub ts_ms: u64,
    pub hood_temp: f32,
    pub hood_rh: f32,
    pub room_temp: f32,
    pub room_rh: f32,
}

impl Sample {
    pub fn get(&self, channel: Channel) -> f32 {
        match channel {
            Channel::HoodTemp => self.hood_temp,
            Channel::HoodHumidity => self.hood_rh,
            Channel::RoomTemp => self.room_temp,
            Channel::RoomHumidity => self.room_rh,
        }
    }
}

// ---------------------------------------------------------------------------
// Smoother
// ---------------------------------------------------------------------------

/// Per-channel EMA state.  A channel without a previous value passes the raw
/// reading through unchanged.
#[derive(Debug, Clone)]
pub struct Smoother {
    alpha: f32,
    prev: [Option<f32>; Channel::COUNT],
}

impl Smoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            prev: [None; Channel::COUNT],
        }
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    /// Forget all previous values; the next reading is taken as-is.
    pub fn reset(&mut self) {
        self.prev = [None; Channel::COUNT];
    }

    pub fn apply(&mut self, raw: &RawReadings) -> RawReadings {
        let mut out = RawReadings::default();
        for channel in Channel::ORDER {
            let x = raw.get(channel);
            let slot = &mut self.prev[channel as usize];
            let smoothed = match *slot {
                Some(p) => self.alpha * x + (1.0 - self.alpha) * p,
                None => x,
            };
            *slot = Some(smoothed);
            out.set(channel, smoothed);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Bounded, chronologically ordered sample store.
#[derive(Debug, Clone)]
pub struct History {
    ring: [Sample; HISTORY_CAP],
    /// Index of the next write (oldest entry once full).
    head: usize,
    count: usize,
    smoother: Smoother,
}

impl History {
    pub fn new(ema_alpha: f32) -> Self {
        Self {
            ring: [Sample::default(); HISTORY_CAP],
            head: 0,
            count: 0,
            smoother: Smoother::new(ema_alpha),
        }
    }

    /// Change the EMA weight for subsequent samples.
    pub fn set_alpha(&mut self, ema_alpha: f32) {
        self.smoother.set_alpha(ema_alpha);
    }

    /// Smooth `raw`, stamp it with `now_ms` and append it, evicting the
    /// oldest entry once the buffer is full.
    ///
    /// A timestamp older than the newest entry (wall clock stepped back)
    /// is raised to the newest entry's timestamp so the buffer stays
    /// non-decreasing.
    pub fn record(&mut self, raw: &RawReadings, now_ms: u64) -> Sample {
        let ts_ms = match self.latest() {
            Some(last) if now_ms < last.ts_ms => {
                debug!(
                    "History: clock stepped back {} ms, re-stamping sample",
                    last.ts_ms - now_ms
                );
                last.ts_ms
            }
            _ => now_ms,
        };

        let s = self.smoother.apply(raw);
        let sample = Sample {
            ts_ms,
            hood_temp: s.hood_temp,
            hood_rh: s.hood_rh,
            room_temp: s.room_temp,
            room_rh: s.room_rh,
        };

        self.ring[self.head] = sample;
        self.head = (self.head + 1) % HISTORY_CAP;
        if self.count < HISTORY_CAP {
            self.count += 1;
        }
        sample
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Chronological access: `0` is the oldest retained sample.
    pub fn get(&self, idx: usize) -> Option<&Sample> {
        if idx >= self.count {
            return None;
        }
        let oldest = (self.head + HISTORY_CAP - self.count) % HISTORY_CAP;
        Some(&self.ring[(oldest + idx) % HISTORY_CAP])
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.count.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Oldest-to-newest iterator.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        (0..self.count).filter_map(move |i| self.get(i))
    }

    /// Rate of change of `channel` per minute over the trailing `window_s`.
    ///
    /// The start point is the newest sample at least `window_s` older than
    /// the newest one, or the oldest retained sample if the history is
    /// shorter than the window.  Returns `0.0` while there is no signal yet
    /// (fewer than two samples, or no elapsed time).
    pub fn slope(&self, channel: Channel, window_s: u64) -> f32 {
        if self.count < 2 {
            return 0.0;
        }
        let Some(end) = self.latest() else {
            return 0.0;
        };
        let window_ms = window_s.saturating_mul(1000);

        let mut start = end;
        for i in (0..self.count - 1).rev() {
            let Some(s) = self.get(i) else { break };
            start = s;
            if end.ts_ms - s.ts_ms >= window_ms {
                break;
            }
        }

        let minutes = (end.ts_ms - start.ts_ms) as f32 / 60_000.0;
        if minutes <= 0.0 {
            return 0.0;
        }
        (end.get(channel) - start.get(channel)) / minutes
    }

    /// `hood − room` on the newest sample; `0.0` when empty.
    pub fn differential(&self, hood: Channel, room: Channel) -> f32 {
        self.latest()
            .map_or(0.0, |s| s.get(hood) - s.get(room))
    }

    /// Drop every sample and the smoothing state.
    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
        self.smoother.reset();
    }
}
