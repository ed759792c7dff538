//! Integration test suite: drives the control cores through their
//! public poll interfaces with recording mock adapters, exactly as the
//! task loops do on the target.

#![cfg(not(target_os = "espidf"))]

mod mock_hw;
mod regulator_tests;
mod sterilizer_tests;
