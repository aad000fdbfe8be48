//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the controller against
//! the mock hood.  All tests run on the host with simulated time.

mod app_service_tests;
mod mock_hw;
mod scenario_tests;
