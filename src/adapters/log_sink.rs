//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured bridge events to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{debug, info, warn};

use crate::app::events::BridgeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BridgeEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BridgeEvent) {
        match event {
            BridgeEvent::ClientJoined {
                port,
                client,
                clients,
            } => {
                info!("JOIN  | port={} client={} clients={}", port, client, clients);
            }
            BridgeEvent::ClientRejected { port } => {
                warn!("REJECT| port={} registry full, connection closed", port);
            }
            BridgeEvent::ClientEvicted {
                port,
                client,
                failures,
            } => {
                warn!(
                    "EVICT | port={} client={} permanent send error after {} attempts",
                    port, client, failures
                );
            }
            BridgeEvent::KeepAlive { port } => {
                debug!("KEEPALIVE | port={}", port);
            }
            BridgeEvent::StateReplayed {
                port,
                client,
                index,
            } => {
                debug!("SYNC  | port={} client={} entry={}", port, client, index);
            }
            BridgeEvent::InboundDropped { port, len } => {
                warn!("DROP  | port={} inbound queue full, {} bytes lost", port, len);
            }
            BridgeEvent::StackLow { port, free_bytes } => {
                warn!("STACK | port={} task stack low: {} bytes", port, free_bytes);
            }
        }
    }
}
