//! Ordered four-channel acquisition chain.
//!
//! The remote sensors answer asynchronously and only one request may be in
//! flight at a time, so a poll is a small step machine:
//!
//! ```text
//!  begin ──▶ HoodTemp ──▶ HoodHumidity ──▶ RoomTemp ──▶ RoomHumidity ──▶ Complete
//!              │               │               │               │
//!              └───────────────┴──── error / missing / NaN ────┴──▶ Aborted
//! ```
//!
//! A busy flag stamped with the poll start time keeps polls from
//! overlapping.  If a chain hangs (a reply never arrives) the flag is
//! force-cleared once it is older than `poll_stuck_s`, and the new chain
//! runs under a fresh generation so a late reply from the abandoned one is
//! recognised and dropped.

use log::{debug, warn};

use crate::error::SensorError;

use super::{Channel, RawReadings};

/// Handle for the single read currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    generation: u32,
    channel: Channel,
}

impl PollTicket {
    /// The channel this ticket asks for.
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

/// Result of feeding one reading into the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadOutcome {
    /// Issue the next read.
    Next(PollTicket),
    /// All four channels are in; the chain is idle again.
    Complete(RawReadings),
    /// The chain was abandoned; no control action this cycle.
    Aborted(SensorError),
    /// Reply for a chain that is no longer current; ignored.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Acquisition {
    busy_since_ms: Option<u64>,
    generation: u32,
    step: usize,
    partial: RawReadings,
    stuck_ms: u64,
}

impl Acquisition {
    pub fn new(poll_stuck_s: u64) -> Self {
        Self {
            busy_since_ms: None,
            generation: 0,
            step: 0,
            partial: RawReadings::default(),
            stuck_ms: poll_stuck_s.saturating_mul(1000),
        }
    }

    /// Start a new chain.  Returns `None` while a previous chain is still
    /// in flight and not yet considered stuck.
    pub fn begin(&mut self, now_ms: u64) -> Option<PollTicket> {
        if let Some(since) = self.busy_since_ms {
            let age = now_ms.saturating_sub(since);
            if age <= self.stuck_ms {
                debug!("Acquisition: previous poll still running ({age} ms)");
                return None;
            }
            warn!(
                "Acquisition: poll stuck at {} for {} s, resetting",
                Channel::ORDER[self.step.min(Channel::COUNT - 1)],
                age / 1000
            );
        }

        self.generation = self.generation.wrapping_add(1);
        self.step = 0;
        self.partial = RawReadings::default();
        self.busy_since_ms = Some(now_ms);
        Some(PollTicket {
            generation: self.generation,
            channel: Channel::HoodTemp,
        })
    }

    /// Feed the reply for `ticket` into the chain.
    pub fn complete(
        &mut self,
        ticket: PollTicket,
        reply: Result<Option<f32>, SensorError>,
    ) -> ReadOutcome {
        let current = self.busy_since_ms.is_some()
            && ticket.generation == self.generation
            && Channel::from_index(self.step) == Some(ticket.channel);
        if !current {
            debug!("Acquisition: dropping stale reply for {}", ticket.channel);
            return ReadOutcome::Stale;
        }

        let value = match reply {
            Ok(Some(v)) if v.is_finite() => v,
            Ok(Some(_)) => return self.abort(SensorError::NonFinite(ticket.channel)),
            Ok(None) => return self.abort(SensorError::Missing(ticket.channel)),
            Err(e) => return self.abort(e),
        };

        self.partial.set(ticket.channel, value);
        self.step += 1;
        match Channel::from_index(self.step) {
            Some(channel) => ReadOutcome::Next(PollTicket {
                generation: self.generation,
                channel,
            }),
            None => {
                self.busy_since_ms = None;
                ReadOutcome::Complete(self.partial)
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy_since_ms.is_some()
    }

    fn abort(&mut self, err: SensorError) -> ReadOutcome {
        warn!("Acquisition: {err}, skipping this cycle");
        self.busy_since_ms = None;
        ReadOutcome::Aborted(err)
    }
}
