//! WaxSteril firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod buffer;
pub mod config;
pub mod diagnostics;
pub mod fuzzy;
pub mod mailbox;
pub mod regulator;
pub mod safety;
pub mod sterilizer;

pub mod app;
pub mod error;
pub mod pins;

// Hardware-facing modules compile on the host too; the peripheral paths
// are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
