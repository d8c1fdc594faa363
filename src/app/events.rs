//! Outbound bridge events.
//!
//! The [`BridgeChannel`](crate::bridge::channel::BridgeChannel) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them (log to serial, count them).

use super::ports::ClientId;

/// Structured events emitted by a bridge channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// A client was admitted to the registry.
    ClientJoined { port: u16, client: ClientId, clients: usize },

    /// A connection arrived while the registry was full and was closed.
    ClientRejected { port: u16 },

    /// A client crossed the send-failure threshold and was closed.
    ClientEvicted {
        port: u16,
        client: ClientId,
        failures: u16,
    },

    /// The channel was idle long enough to send a keep-alive newline.
    KeepAlive { port: u16 },

    /// Bootstrap entry `index` was replayed to a client.
    StateReplayed {
        port: u16,
        client: ClientId,
        index: usize,
    },

    /// Received bytes could not be queued inbound.
    InboundDropped { port: u16, len: usize },

    /// The channel task is running low on stack.
    StackLow { port: u16, free_bytes: u32 },
}
