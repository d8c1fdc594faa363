//! Skylink firmware library.
//!
//! Exposes the bridge, queue and adapter modules for integration testing.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod bridge;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod queue;
