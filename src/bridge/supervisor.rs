//! Per-channel task wiring.
//!
//! [`spawn_channel`] starts one pinned task per bridged port. The listener
//! is bound inside the task so a port that cannot be opened only takes
//! down its own channel.

use std::sync::Arc;
use std::thread::JoinHandle;

use log::error;

use crate::adapters::log_sink::LogEventSink;
use crate::adapters::tcp::TcpBridgeListener;
use crate::app::ports::{BootstrapHook, RouterTick};
use crate::config::{BridgeConfig, ChannelConfig};
use crate::diagnostics::ChannelStats;
use crate::drivers::task_pin::{self, Core};
use crate::error::Result;
use crate::queue::{QueuePair, RecordQueue};

use super::channel::BridgeChannel;
use super::mode::ModeFlag;

/// FreeRTOS keeps 16 bytes of task name, terminator included.
const TASK_NAME_MAX: usize = 15;

/// FreeRTOS task name for a channel, null-terminated.
///
/// Long names are cut on a char boundary to fit [`TASK_NAME_MAX`].
/// Called once per channel at boot; the leaked string lives as long as
/// the task does.
pub fn task_name(channel: &str) -> &'static str {
    let mut name = format!("br-{channel}");
    let mut end = name.len().min(TASK_NAME_MAX);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name.truncate(end);
    name.push('\0');
    Box::leak(name.into_boxed_str())
}

/// Spawn the bridge task for `chan` on the protocol core.
///
/// `binary_mode` is only handed to the loop when the channel follows it.
pub fn spawn_channel<H, R>(
    cfg: &BridgeConfig,
    chan: &ChannelConfig,
    queues: QueuePair<RecordQueue>,
    binary_mode: &ModeFlag,
    bootstrap: H,
    router: R,
    stats: Arc<ChannelStats>,
) -> Result<JoinHandle<()>>
where
    H: BootstrapHook + Send + 'static,
    R: RouterTick + Send + 'static,
{
    let cfg = cfg.clone();
    let port = chan.port;
    let mode = chan.follows_binary_mode.then(|| binary_mode.clone());

    task_pin::spawn_on_core(
        Core::Pro,
        chan.priority,
        chan.stack_bytes,
        task_name(&chan.name),
        move || match TcpBridgeListener::bind(port, cfg.listen_backlog) {
            Ok(listener) => {
                BridgeChannel::new(&cfg, listener, queues, mode, bootstrap, router, LogEventSink::new())
                    .with_stats(stats)
                    .run()
            }
            Err(e) => error!("BRIDGE[{}]: cannot listen: {}", port, e),
        },
    )
}
