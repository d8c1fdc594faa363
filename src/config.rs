//! Bridge configuration parameters
//!
//! All tunable parameters for the TCP bridge, plus the fixed table of
//! bridged channels. Values normally come from [`BridgeConfig::default`];
//! a persisted settings store may hand over a `postcard` blob instead.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::queue::RECORD_CAPACITY;

/// Hard upper bound on simultaneous clients per channel.
pub const MAX_CLIENTS: usize = 10;

/// Size of the per-iteration block buffer (largest block a channel may use).
pub const MAX_BLOCK_SIZE: usize = 512;

/// Number of bridged channels.
pub const CHANNEL_COUNT: usize = 3;

/// One bridged protocol bound to a TCP port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Short name, used for task names and log lines.
    pub name: heapless::String<16>,
    /// TCP listen port.
    pub port: u16,
    /// Whether the channel observes the process-wide binary-transfer flag.
    pub follows_binary_mode: bool,
    /// Whether newly joined clients get the instrument state replayed.
    pub bootstrap: bool,
    /// Scheduler priority of the channel task.
    pub priority: u8,
    /// Task stack size in bytes.
    pub stack_bytes: usize,
}

impl ChannelConfig {
    fn new(name: &str, port: u16, priority: u8, stack_bytes: usize) -> Self {
        let mut n = heapless::String::new();
        let fits = n.push_str(name);
        debug_assert!(fits.is_ok());
        Self {
            name: n,
            port,
            follows_binary_mode: false,
            bootstrap: false,
            priority,
            stack_bytes,
        }
    }
}

/// Core bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    // --- Registry ---
    /// Maximum simultaneous clients per channel (<= MAX_CLIENTS)
    pub max_clients: usize,
    /// Consecutive failed sends tolerated before a client is evicted
    pub max_send_failures: u16,

    // --- Blocks ---
    /// Block size on text channels (bytes)
    pub text_block_size: usize,
    /// Block size while the binary-transfer flag is set (bytes)
    pub binary_block_size: usize,
    /// Idle iterations before a keep-alive newline is sent
    pub keepalive_idle_iterations: u32,

    // --- Timing ---
    /// End-of-iteration yield on text channels (milliseconds)
    pub text_yield_ms: u32,
    /// End-of-iteration yield during binary transfer (milliseconds)
    pub binary_yield_ms: u32,
    /// Interval between diagnostics dumps (seconds)
    pub stats_interval_secs: u32,

    // --- Sockets / tasks ---
    /// listen() backlog
    pub listen_backlog: u8,
    /// Remaining-stack threshold for the low-stack warning (bytes)
    pub stack_warn_bytes: u32,

    /// Bridged channels, in spawn order.
    pub channels: [ChannelConfig; CHANNEL_COUNT],
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let mut vario = ChannelConfig::new("vario", 8880, 11, 3200);
        vario.bootstrap = true;
        let mut flarm = ChannelConfig::new("flarm", 8881, 12, 4096);
        flarm.follows_binary_mode = true;
        let aux = ChannelConfig::new("aux", 8882, 10, 3200);

        Self {
            // Registry
            max_clients: MAX_CLIENTS,
            max_send_failures: 100,

            // Blocks
            text_block_size: 400,
            binary_block_size: MAX_BLOCK_SIZE,
            keepalive_idle_iterations: 10, // ~2 s at 200 ms

            // Timing
            text_yield_ms: 200,
            binary_yield_ms: 5,
            stats_interval_secs: 60,

            // Sockets / tasks
            listen_backlog: 5,
            stack_warn_bytes: 128,

            channels: [aux, vario, flarm],
        }
    }
}

impl BridgeConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.max_clients == 0 || self.max_clients > MAX_CLIENTS {
            return Err(Error::Config("max_clients must be 1..=10"));
        }
        if self.max_send_failures == 0 {
            return Err(Error::Config("max_send_failures must be non-zero"));
        }
        // Records are never split, so a block must hold the largest one.
        if !(RECORD_CAPACITY..=MAX_BLOCK_SIZE).contains(&self.text_block_size) {
            return Err(Error::Config("text_block_size out of range"));
        }
        if !(RECORD_CAPACITY..=MAX_BLOCK_SIZE).contains(&self.binary_block_size) {
            return Err(Error::Config("binary_block_size out of range"));
        }
        if self.text_yield_ms == 0 || self.binary_yield_ms == 0 {
            return Err(Error::Config("yield intervals must be non-zero"));
        }
        if self.listen_backlog == 0 {
            return Err(Error::Config("listen_backlog must be non-zero"));
        }
        for (i, a) in self.channels.iter().enumerate() {
            if a.port == 0 {
                return Err(Error::Config("channel port must be non-zero"));
            }
            if self.channels[i + 1..].iter().any(|b| b.port == a.port) {
                return Err(Error::Config("duplicate channel port"));
            }
        }
        if self.channels.iter().filter(|c| c.bootstrap).count() > 1 {
            return Err(Error::Config("at most one bootstrap channel"));
        }
        Ok(())
    }

    /// Look up a channel by name.
    pub fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Encode for a persisted settings store.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("encode failed"))
    }

    /// Decode and validate a persisted settings blob.
    pub fn from_blob(bytes: &[u8]) -> Result<Self> {
        let cfg: Self = postcard::from_bytes(bytes).map_err(|_| Error::Config("corrupted blob"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
