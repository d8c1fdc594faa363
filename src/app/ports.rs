//! Port traits: the hexagonal boundary between the bridge core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeChannel (core)
//! ```
//!
//! Sockets, queues, the message router, the instrument-state source and
//! the event sink are all injected through these traits, so the bridge
//! loop can be driven step-by-step in tests with in-memory fakes.

use crate::error::{LinkError, QueueError};
use crate::queue::Record;

use super::events::BridgeEvent;
use super::state::{InstrumentState, StateEntry};

/// Stable identifier the registry assigns to each admitted client.
pub type ClientId = u32;

// ───────────────────────────────────────────────────────────────
// Sockets (driven adapters: lwIP / std::net)
// ───────────────────────────────────────────────────────────────

/// A listening socket in non-blocking mode.
pub trait Listener {
    type Conn: Connection;

    /// One non-blocking accept. `None` when no connection is pending.
    fn try_accept(&mut self) -> Option<Self::Conn>;

    /// Port the listener is bound to.
    fn port(&self) -> u16;
}

/// One accepted client connection. Dropping it closes the socket.
pub trait Connection {
    /// Non-blocking receive. `Ok(n)` with `n > 0` on data.
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;

    /// Non-blocking send of `data`. May accept fewer bytes than offered.
    fn try_send(&mut self, data: &[u8]) -> Result<usize, LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Queues (shared with the firmware's router)
// ───────────────────────────────────────────────────────────────

/// Bounded, record-oriented, non-blocking FIFO.
///
/// Implementations must be safe to share between the bridge task and
/// the producer/consumer tasks elsewhere in the firmware.
pub trait ByteQueue {
    /// Enqueue one record.
    fn push(&self, data: &[u8]) -> Result<(), QueueError>;

    /// Dequeue the head record if it is at most `max` bytes long.
    fn try_pop(&self, max: usize) -> Option<Record>;

    /// Records currently queued.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ───────────────────────────────────────────────────────────────
// Router tick
// ───────────────────────────────────────────────────────────────

/// Periodic callback into the message router, once per loop iteration.
///
/// Any `FnMut()` closure qualifies; pass `|| {}` when no router is attached.
pub trait RouterTick {
    fn tick(&mut self);
}

impl<F: FnMut()> RouterTick for F {
    fn tick(&mut self) {
        self();
    }
}

// ───────────────────────────────────────────────────────────────
// Bootstrap
// ───────────────────────────────────────────────────────────────

/// Replays current instrument state to a newly joined client, one entry
/// per call.
pub trait BootstrapHook {
    /// Total number of entries a full replay consists of.
    fn entry_count(&self) -> usize;

    /// Send entry `index` to `client` over its own connection. Other
    /// clients on the channel never see the frame.
    fn replay<C: Connection>(&mut self, port: u16, client: ClientId, index: usize, conn: &mut C);
}

/// Hook for channels without a bootstrap sequence.
pub struct NoBootstrap;

impl BootstrapHook for NoBootstrap {
    fn entry_count(&self) -> usize {
        0
    }

    fn replay<C: Connection>(&mut self, _port: u16, _client: ClientId, _index: usize, _conn: &mut C) {}
}

/// Read access to the instrument's current settings.
pub trait StateSource {
    fn snapshot(&self) -> InstrumentState;

    /// Record that `entry` has been pushed to a client session.
    fn mark_synced(&mut self, entry: StateEntry);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: core → logging / diagnostics)
// ───────────────────────────────────────────────────────────────

/// The bridge emits structured [`BridgeEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &BridgeEvent);
}

impl<E: EventSink + ?Sized> EventSink for &mut E {
    fn emit(&mut self, event: &BridgeEvent) {
        (**self).emit(event);
    }
}
