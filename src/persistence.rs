//! Persisted controller state.
//!
//! The override flag and the cooldown ramp survive a restart so that a
//! reboot mid-cooking does not hand the fan back to the automatic machine
//! (or drop a running cooldown).  The blob is small JSON with short keys:
//!
//! ```text
//! {"ovr":true,"mts":1718000000,"cd":false,"cts":null,"typ":null}
//! ```
//!
//! Timestamps are Unix seconds.  A blob whose override start is older than
//! `persistence.max_restore_age_s` is ignored.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};
use crate::fsm::cooldown::{CooldownKind, CooldownState};
use crate::manual::OverrideState;

pub const STATE_NAMESPACE: &str = "hood";
pub const STATE_KEY: &str = "state";

/// Upper bound on the encoded blob.
pub const MAX_STATE_BLOB: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(rename = "ovr", default)]
    pub override_active: bool,
    #[serde(rename = "mts", default)]
    pub override_start_s: Option<u64>,
    #[serde(rename = "cd", default)]
    pub cooldown_active: bool,
    #[serde(rename = "cts", default)]
    pub cooldown_start_s: Option<u64>,
    #[serde(rename = "typ", default)]
    pub cooldown_kind: Option<CooldownKind>,
}

impl PersistedState {
    pub fn capture(ovr: OverrideState, cooldown: Option<CooldownState>) -> Self {
        Self {
            override_active: ovr.active,
            override_start_s: ovr.start_ms.map(|ms| ms / 1000),
            cooldown_active: cooldown.is_some(),
            cooldown_start_s: cooldown.map(|c| c.start_ms / 1000),
            cooldown_kind: cooldown.map(|c| c.kind),
        }
    }

    pub fn override_state(&self) -> OverrideState {
        OverrideState {
            active: self.override_active,
            start_ms: self.override_start_s.map(|s| s.saturating_mul(1000)),
        }
    }

    /// The stored cooldown, if the blob carries a complete one.
    pub fn cooldown_state(&self) -> Option<CooldownState> {
        if !self.cooldown_active {
            return None;
        }
        Some(CooldownState {
            start_ms: self.cooldown_start_s?.saturating_mul(1000),
            kind: self.cooldown_kind?,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Fresh when the override start lies less than `max_age_s` in the past.
    /// A blob without an override start is never fresh.
    pub fn is_fresh(&self, now_ms: u64, max_age_s: u64) -> bool {
        self.override_start_s
            .is_some_and(|mts| (now_ms / 1000).saturating_sub(mts) < max_age_s)
    }
}

/// Outcome of [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restore {
    Fresh(PersistedState),
    Stale,
    Corrupt,
    Missing,
}

/// Read and classify the stored blob.
pub fn load(storage: &impl StoragePort, now_ms: u64, max_age_s: u64) -> Restore {
    let mut buf = [0u8; MAX_STATE_BLOB];
    let len = match storage.read(STATE_NAMESPACE, STATE_KEY, &mut buf) {
        Ok(len) => len,
        Err(StorageError::NotFound) => return Restore::Missing,
        Err(e) => {
            warn!("[PERSIST] Failed to read saved state: {e}");
            return Restore::Missing;
        }
    };

    match PersistedState::decode(&buf[..len]) {
        Ok(state) if state.is_fresh(now_ms, max_age_s) => {
            info!(
                "[PERSIST] Restored state (override={}, cooldown={})",
                state.override_active, state.cooldown_active
            );
            Restore::Fresh(state)
        }
        Ok(_) => {
            info!("[PERSIST] Saved state too old, using defaults");
            Restore::Stale
        }
        Err(e) => {
            warn!("[PERSIST] Saved state corrupt ({e}), using defaults");
            Restore::Corrupt
        }
    }
}

pub fn save(storage: &mut impl StoragePort, state: &PersistedState) -> Result<(), StorageError> {
    let bytes = state.encode().map_err(|_| StorageError::IoError)?;
    if bytes.len() > MAX_STATE_BLOB {
        return Err(StorageError::Full);
    }
    storage.write(STATE_NAMESPACE, STATE_KEY, &bytes)
}
