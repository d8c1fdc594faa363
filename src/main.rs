//! Skylink Firmware: Main Entry Point
//!
//! Starts one bridge task per channel and then reports diagnostics.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  TcpBridgeListener   LogEventSink   SharedInstrumentState    │
//! │  (Listener/Conn)     (EventSink)    (StateSource)            │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ───────────────────     │
//! │                                                              │
//! │   br-aux :8882     br-vario :8880      br-flarm :8881        │
//! │   BridgeChannel    BridgeChannel       BridgeChannel         │
//! │                    + SnapshotReplay    + binary ModeFlag     │
//! │                                                              │
//! │  QueuePair per channel ◀──▶ message router (external)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use skylink::adapters::snapshot::SharedInstrumentState;
use skylink::app::ports::NoBootstrap;
use skylink::app::state::InstrumentState;
use skylink::bridge::ModeFlag;
use skylink::bridge::bootstrap::SnapshotReplay;
use skylink::bridge::supervisor::spawn_channel;
use skylink::config::{BridgeConfig, CHANNEL_COUNT};
use skylink::diagnostics::ChannelStats;
use skylink::queue::{QueuePair, RecordQueue};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Skylink v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = BridgeConfig::default();
    config.validate()?;

    // ── 3. Shared state ───────────────────────────────────────
    // The router owns the other end of every queue pair and the
    // binary-transfer flag; it is wired in by the integrating firmware.
    let binary_mode = ModeFlag::new();
    let instrument = SharedInstrumentState::new(InstrumentState::default());
    let queues: [QueuePair<RecordQueue>; CHANNEL_COUNT] =
        core::array::from_fn(|_| QueuePair::bounded());
    let stats: [Arc<ChannelStats>; CHANNEL_COUNT] =
        core::array::from_fn(|_| Arc::new(ChannelStats::new()));

    // ── 4. Bridge tasks (aux, vario, flarm on core 0) ─────────
    let mut tasks = Vec::with_capacity(CHANNEL_COUNT);
    for (i, chan) in config.channels.iter().enumerate() {
        // Replay suppression follows the global flag on every channel.
        let handle = match SnapshotReplay::for_channel(chan, instrument.clone(), &binary_mode) {
            Some(hook) => spawn_channel(
                &config,
                chan,
                queues[i].clone(),
                &binary_mode,
                hook,
                || {},
                Arc::clone(&stats[i]),
            ),
            None => spawn_channel(
                &config,
                chan,
                queues[i].clone(),
                &binary_mode,
                NoBootstrap,
                || {},
                Arc::clone(&stats[i]),
            ),
        };
        match handle {
            Ok(h) => tasks.push(h),
            Err(e) => warn!("Channel '{}' not started: {}", chan.name, e),
        }
    }

    info!("System ready. {} bridge task(s) running.", tasks.len());

    // ── 5. Diagnostics loop ───────────────────────────────────
    let interval = Duration::from_secs(u64::from(config.stats_interval_secs.max(1)));
    loop {
        std::thread::sleep(interval);
        for (chan, s) in config.channels.iter().zip(stats.iter()) {
            info!("STATS | {} {}", chan.name, s.snapshot().to_json());
        }
    }
}
