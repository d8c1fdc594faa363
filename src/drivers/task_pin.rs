//! Core-pinned task spawning and stack monitoring for ESP32 dual-core.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size. On non-ESP targets, falls back to plain thread spawn.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread. This means the config→spawn pair must not be
//! interleaved with other thread creation on the same thread.
//!
//! `std::thread::sleep` maps onto `vTaskDelay`, so a sleeping bridge task
//! yields the core to lower-priority work.

use crate::error::{Error, Result};

/// CPU core identifiers for the ESP32 Xtensa dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): protocol stacks (WiFi, lwIP).
    Pro = 0,
    /// Core 1 (APP_CPU): sensor and application logic.
    App = 1,
}

/// Spawn a thread pinned to a specific core with explicit priority and stack.
///
/// On ESP-IDF, uses `esp_pthread_set_cfg()` to configure core affinity,
/// priority, and stack size before `std::thread::spawn`. The `name` parameter
/// must be a null-terminated string (e.g. `"br-vario\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_bytes: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>> {
    // SAFETY: the config is fully initialised from the IDF default and
    // `name` is a 'static null-terminated string.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = stack_bytes as _;
        cfg.thread_name = name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            log::error!("esp_pthread_set_cfg failed: {}", ret);
            return Err(Error::Spawn);
        }
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}B)",
        display_name,
        core,
        priority,
        stack_bytes
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
        .map_err(|_| Error::Spawn)
}

/// Simulation fallback. Ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_bytes: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}B)",
        display_name,
        stack_bytes
    );

    // Host stack frames are far larger than Xtensa ones.
    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_bytes.max(64 * 1024))
        .spawn(f)
        .map_err(|_| Error::Spawn)
}

/// Minimum free stack (bytes) the calling task has ever had.
#[cfg(target_os = "espidf")]
pub fn stack_high_water_mark() -> Option<u32> {
    // SAFETY: a null handle queries the calling task.
    Some(unsafe { esp_idf_sys::uxTaskGetStackHighWaterMark(core::ptr::null_mut()) } as u32)
}

/// Not observable on the host.
#[cfg(not(target_os = "espidf"))]
pub fn stack_high_water_mark() -> Option<u32> {
    None
}
