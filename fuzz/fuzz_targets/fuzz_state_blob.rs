//! Fuzz target: persisted state blob
//!
//! Feeds arbitrary bytes through the startup restore path and verifies:
//! - No panics under arbitrary byte inputs
//! - A fresh blob always has an override start inside the restore window
//! - A restored cooldown always carries both its start and its kind
//!
//! cargo fuzz run fuzz_state_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use hoodfan::app::ports::{StorageError, StoragePort};
use hoodfan::persistence::{self, MAX_STATE_BLOB, Restore, STATE_KEY, STATE_NAMESPACE};

const NOW_MS: u64 = 1_718_000_000_000;

/// Single-slot store holding the fuzzed blob.
struct Slot(Vec<u8>);

impl StoragePort for Slot {
    fn read(&self, _namespace: &str, _key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        if self.0.len() > buf.len() {
            return Err(StorageError::IoError);
        }
        buf[..self.0.len()].copy_from_slice(&self.0);
        Ok(self.0.len())
    }

    fn write(&mut self, _namespace: &str, _key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.0 = data.to_vec();
        Ok(())
    }

    fn delete(&mut self, _namespace: &str, _key: &str) -> Result<(), StorageError> {
        self.0.clear();
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        namespace == STATE_NAMESPACE && key == STATE_KEY && !self.0.is_empty()
    }
}

fuzz_target!(|data: &[u8]| {
    let slot = Slot(data.iter().copied().take(MAX_STATE_BLOB * 2).collect());

    if let Restore::Fresh(state) = persistence::load(&slot, NOW_MS, 3600) {
        let mts = state.override_start_s.unwrap();
        assert!(mts.saturating_add(3600) > NOW_MS / 1000);
        if let Some(cd) = state.cooldown_state() {
            assert!(state.cooldown_start_s.is_some());
            assert_eq!(state.cooldown_kind, Some(cd.kind));
        }

        // A fresh blob must survive a save/load cycle unchanged.
        let mut copy = Slot(Vec::new());
        persistence::save(&mut copy, &state).unwrap();
        assert_eq!(persistence::load(&copy, NOW_MS, 3600), Restore::Fresh(state));
    }
});
