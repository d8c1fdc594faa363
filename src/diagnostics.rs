//! Runtime diagnostics for the bridge channels.
//!
//! Each channel task updates a [`ChannelStats`] block of relaxed atomics;
//! the supervisor side takes [`StatsSnapshot`]s and logs them as JSON.

use core::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;

/// Lock-free per-channel counters.
#[derive(Debug, Default)]
pub struct ChannelStats {
    accepted: AtomicU32,
    rejected: AtomicU32,
    evicted: AtomicU32,
    keepalives: AtomicU32,
    inbound_drops: AtomicU32,
    clients: AtomicU32,
    // Xtensa has no 64-bit atomics; byte counters wrap at 4 GiB.
    tx_bytes: AtomicU32,
    rx_bytes: AtomicU32,
}

impl ChannelStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accept(&self, clients: usize) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.clients.store(clients as u32, Ordering::Relaxed);
    }

    pub fn record_reject(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: usize, clients: usize) {
        self.evicted.fetch_add(count as u32, Ordering::Relaxed);
        self.clients.store(clients as u32, Ordering::Relaxed);
    }

    pub fn record_keepalive(&self) {
        self.keepalives.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inbound_drop(&self) {
        self.inbound_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tx(&self, bytes: usize) {
        self.tx_bytes.fetch_add(bytes as u32, Ordering::Relaxed);
    }

    pub fn record_rx(&self, bytes: usize) {
        self.rx_bytes.fetch_add(bytes as u32, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            keepalives: self.keepalives.load(Ordering::Relaxed),
            inbound_drops: self.inbound_drops.load(Ordering::Relaxed),
            clients: self.clients.load(Ordering::Relaxed),
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a channel's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub accepted: u32,
    pub rejected: u32,
    pub evicted: u32,
    pub keepalives: u32,
    pub inbound_drops: u32,
    pub clients: u32,
    pub tx_bytes: u32,
    pub rx_bytes: u32,
}

impl StatsSnapshot {
    /// Single-line JSON rendering for the serial log.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
