//! Fuzz target: configuration JSON
//!
//! Parses arbitrary bytes as a `HoodConfig` and verifies:
//! - No panics in parsing or validation
//! - Any config that validates is accepted by a fresh service
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use hoodfan::app::service::AppService;
use hoodfan::config::HoodConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = serde_json::from_slice::<HoodConfig>(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let app = AppService::new(cfg.clone());
        assert_eq!(app.config(), &cfg);
    }
});
