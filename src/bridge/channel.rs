//! The per-port bridge loop.
//!
//! One [`BridgeChannel`] runs forever in its own task. Each call to
//! [`step`](BridgeChannel::step) is one iteration:
//!
//! ```text
//!  accept ─▶ drain outbound ─▶ keep-alive ─▶ per-client pass ─▶ router tick ─▶ yield
//!   (1 max)   (whole records)   (text only)   recv · bootstrap (own conn)
//!                                             · send · evict
//! ```
//!
//! Every socket operation is non-blocking; the only suspension point is the
//! sleep returned by `step`, which [`run`](BridgeChannel::run) honours.
//!
//! ## Failure accounting
//!
//! Before each send the client's failure counter is incremented; any send
//! the stack accepts (even partially) resets it to zero. A client whose
//! counter exceeds `max_send_failures` is evicted. Channels in
//! binary-transfer mode never evict.

use core::time::Duration;
use std::sync::Arc;

use log::{debug, info};

use crate::app::events::BridgeEvent;
use crate::app::ports::{BootstrapHook, ByteQueue, Connection, EventSink, Listener, RouterTick};
use crate::config::BridgeConfig;
use crate::diagnostics::ChannelStats;
use crate::drivers::task_pin;
use crate::error::LinkError;
use crate::queue::{QueuePair, RECORD_CAPACITY};

use super::block::MessageBlock;
use super::mode::ModeFlag;
use super::registry::ClientRegistry;

/// Receive scratch size: one byte short of a queue record.
const RX_SCRATCH: usize = RECORD_CAPACITY - 1;

/// Loop tuning copied out of [`BridgeConfig`] at construction.
#[derive(Debug, Clone, Copy)]
struct Tuning {
    max_send_failures: u16,
    text_block_size: usize,
    binary_block_size: usize,
    keepalive_idle_iterations: u32,
    text_yield: Duration,
    binary_yield: Duration,
    stack_warn_bytes: u32,
}

impl From<&BridgeConfig> for Tuning {
    fn from(cfg: &BridgeConfig) -> Self {
        Self {
            max_send_failures: cfg.max_send_failures,
            text_block_size: cfg.text_block_size,
            binary_block_size: cfg.binary_block_size,
            keepalive_idle_iterations: cfg.keepalive_idle_iterations,
            text_yield: Duration::from_millis(u64::from(cfg.text_yield_ms)),
            binary_yield: Duration::from_millis(u64::from(cfg.binary_yield_ms)),
            stack_warn_bytes: cfg.stack_warn_bytes,
        }
    }
}

fn is_binary(mode: Option<&ModeFlag>) -> bool {
    mode.is_some_and(ModeFlag::is_set)
}

/// Bridge between one TCP port and one queue pair.
pub struct BridgeChannel<L: Listener, Q, H, R, E> {
    listener: L,
    queues: QueuePair<Q>,
    registry: ClientRegistry<L::Conn>,
    block: MessageBlock,
    binary_mode: Option<ModeFlag>,
    /// Consecutive iterations without outbound data.
    stall: u32,
    bootstrap: H,
    router: R,
    events: E,
    stats: Arc<ChannelStats>,
    tuning: Tuning,
}

impl<L, Q, H, R, E> BridgeChannel<L, Q, H, R, E>
where
    L: Listener,
    Q: ByteQueue,
    H: BootstrapHook,
    R: RouterTick,
    E: EventSink,
{
    /// Build a channel around an already listening socket.
    ///
    /// `binary_mode` is `Some` only for channels that follow the
    /// process-wide binary-transfer flag.
    pub fn new(
        cfg: &BridgeConfig,
        listener: L,
        queues: QueuePair<Q>,
        binary_mode: Option<ModeFlag>,
        bootstrap: H,
        router: R,
        events: E,
    ) -> Self {
        Self {
            listener,
            queues,
            registry: ClientRegistry::new(cfg.max_clients),
            block: MessageBlock::new(),
            binary_mode,
            stall: 0,
            bootstrap,
            router,
            events,
            stats: Arc::new(ChannelStats::new()),
            tuning: Tuning::from(cfg),
        }
    }

    /// Share externally owned counters instead of private ones.
    pub fn with_stats(mut self, stats: Arc<ChannelStats>) -> Self {
        self.stats = stats;
        self
    }

    // ── Driving ───────────────────────────────────────────────

    /// Run forever, sleeping for the interval each iteration asks for.
    pub fn run(mut self) -> ! {
        info!(
            "BRIDGE[{}]: running ({} clients max)",
            self.listener.port(),
            self.registry.limit()
        );
        loop {
            let pause = self.step();
            std::thread::sleep(pause);
        }
    }

    /// One loop iteration. Returns how long the task should yield.
    pub fn step(&mut self) -> Duration {
        self.accept();
        if !self.registry.is_empty() {
            self.drain_outbound();
            self.service_clients();
        }
        self.router.tick();
        self.check_stack();
        self.yield_interval()
    }

    // ── Iteration phases ──────────────────────────────────────

    fn accept(&mut self) {
        let Some(conn) = self.listener.try_accept() else {
            return;
        };
        let port = self.listener.port();
        match self.registry.admit(conn) {
            Ok(client) => {
                self.stall = 0;
                let clients = self.registry.len();
                self.stats.record_accept(clients);
                self.events.emit(&BridgeEvent::ClientJoined {
                    port,
                    client,
                    clients,
                });
            }
            Err(conn) => {
                drop(conn);
                self.stats.record_reject();
                self.events.emit(&BridgeEvent::ClientRejected { port });
            }
        }
    }

    fn drain_outbound(&mut self) {
        let limit = if is_binary(self.binary_mode.as_ref()) {
            self.tuning.binary_block_size
        } else {
            self.tuning.text_block_size
        };
        if self.block.fill_from(&*self.queues.outbound, limit) > 0 {
            self.stall = 0;
            return;
        }

        self.stall = self.stall.saturating_add(1);
        if self.stall > self.tuning.keepalive_idle_iterations
            && !is_binary(self.binary_mode.as_ref())
        {
            self.block.set_keepalive();
            self.stall = 0;
            self.stats.record_keepalive();
            self.events.emit(&BridgeEvent::KeepAlive {
                port: self.listener.port(),
            });
        }
    }

    fn service_clients(&mut self) {
        let port = self.listener.port();
        let entries = self.bootstrap.entry_count();
        let mut scratch = [0u8; RX_SCRATCH];

        for client in self.registry.iter_mut() {
            // a. inbound
            match client.conn.try_recv(&mut scratch) {
                Ok(0) | Err(LinkError::WouldBlock) => {}
                Ok(n) => {
                    self.stats.record_rx(n);
                    if self.queues.inbound.push(&scratch[..n]).is_err() {
                        self.stats.record_inbound_drop();
                        self.events
                            .emit(&BridgeEvent::InboundDropped { port, len: n });
                    }
                }
                Err(e) => debug!("BRIDGE[{}]: client {} recv: {}", port, client.id, e),
            }

            // b. bootstrap, one entry per iteration
            if client.replay_cursor < entries {
                let index = client.replay_cursor;
                self.bootstrap.replay(port, client.id, index, &mut client.conn);
                client.replay_cursor += 1;
                self.events.emit(&BridgeEvent::StateReplayed {
                    port,
                    client: client.id,
                    index,
                });
            }

            // c. broadcast
            if !self.block.is_empty() {
                client.failures = client.failures.saturating_add(1);
                match client.conn.try_send(self.block.as_slice()) {
                    Ok(n) => {
                        client.failures = 0;
                        self.stats.record_tx(n);
                    }
                    Err(e) => debug!(
                        "BRIDGE[{}]: client {} send: {} (failures={})",
                        port, client.id, e, client.failures
                    ),
                }
            }

            // d. eviction
            if client.failures > self.tuning.max_send_failures
                && !is_binary(self.binary_mode.as_ref())
            {
                client.evict();
                self.events.emit(&BridgeEvent::ClientEvicted {
                    port,
                    client: client.id,
                    failures: client.failures,
                });
            }
        }

        let evicted = self.registry.sweep();
        if !evicted.is_empty() {
            self.stats.record_evictions(evicted.len(), self.registry.len());
        }
        // Dropping `evicted` closes the sockets.
    }

    fn check_stack(&mut self) {
        if let Some(free) = task_pin::stack_high_water_mark() {
            if free < self.tuning.stack_warn_bytes {
                self.events.emit(&BridgeEvent::StackLow {
                    port: self.listener.port(),
                    free_bytes: free,
                });
            }
        }
    }

    fn yield_interval(&self) -> Duration {
        if is_binary(self.binary_mode.as_ref()) {
            self.tuning.binary_yield
        } else {
            self.tuning.text_yield
        }
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn port(&self) -> u16 {
        self.listener.port()
    }

    pub fn clients(&self) -> &ClientRegistry<L::Conn> {
        &self.registry
    }

    /// Consecutive idle iterations since the last outbound data.
    pub fn stall_count(&self) -> u32 {
        self.stall
    }

    /// The block broadcast during the last iteration.
    pub fn last_block(&self) -> &[u8] {
        self.block.as_slice()
    }

    pub fn stats(&self) -> Arc<ChannelStats> {
        Arc::clone(&self.stats)
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn bootstrap(&self) -> &H {
        &self.bootstrap
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }
}
