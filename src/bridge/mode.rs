//! Process-wide binary-transfer flag.
//!
//! While a bulk binary transfer (flight-log download) runs on the traffic
//! port, the channels following this flag switch to large blocks, short
//! yields, no keep-alives and no evictions. The flag is owned and set by
//! the protocol layer elsewhere in the firmware; the bridge only reads it.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to the shared flag.
#[derive(Debug, Clone, Default)]
pub struct ModeFlag(Arc<AtomicBool>);

impl ModeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value. Observed fresh at every decision point.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Owner side: enter or leave binary-transfer mode.
    pub fn set(&self, binary: bool) {
        self.0.store(binary, Ordering::Release);
    }
}
