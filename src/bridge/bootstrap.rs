//! Instrument-state replay for newly joined clients.
//!
//! The bridge loop calls [`BootstrapHook::replay`] for at most one entry
//! per client per iteration, so a client that joins mid-flight receives
//! the full snapshot over six iterations instead of one burst that would
//! crowd out live data.
//!
//! Each frame is written straight to the joining client's connection.
//! Clients already in session never see it again.

use log::{debug, warn};

use crate::app::ports::{BootstrapHook, ClientId, Connection, StateSource};
use crate::app::state::{StateEntry, encode_entry};
use crate::config::ChannelConfig;

use super::mode::ModeFlag;

/// [`BootstrapHook`] backed by a [`StateSource`].
pub struct SnapshotReplay<S> {
    source: S,
    binary_mode: Option<ModeFlag>,
}

impl<S: StateSource> SnapshotReplay<S> {
    /// `binary_mode`: while set, replays are suppressed so no text frame
    /// lands in the middle of a binary transfer.
    pub fn new(source: S, binary_mode: Option<ModeFlag>) -> Self {
        Self {
            source,
            binary_mode,
        }
    }

    /// Hook for `chan`, or `None` if the channel does not bootstrap.
    ///
    /// Suppression watches the process-wide flag even though the
    /// bootstrap channel itself never enters binary mode.
    pub fn for_channel(chan: &ChannelConfig, source: S, binary_mode: &ModeFlag) -> Option<Self> {
        chan.bootstrap
            .then(|| Self::new(source, Some(binary_mode.clone())))
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_suppressed(&self) -> bool {
        self.binary_mode.as_ref().is_some_and(ModeFlag::is_set)
    }
}

impl<S: StateSource> BootstrapHook for SnapshotReplay<S> {
    fn entry_count(&self) -> usize {
        StateEntry::ORDER.len()
    }

    fn replay<C: Connection>(&mut self, port: u16, client: ClientId, index: usize, conn: &mut C) {
        let Some(entry) = StateEntry::from_index(index) else {
            return;
        };
        if self.is_suppressed() {
            debug!("SYNC[{}]: {:?} skipped for client {} (binary transfer)", port, entry, client);
            return;
        }

        let frame = encode_entry(entry, &self.source.snapshot());
        match conn.try_send(frame.as_bytes()) {
            Ok(n) if n < frame.len() => {
                warn!("SYNC[{}]: {:?} to client {} truncated ({}/{})", port, entry, client, n, frame.len());
            }
            Ok(_) => {}
            Err(e) => warn!("SYNC[{}]: {:?} to client {} not sent: {}", port, entry, client, e),
        }
        // No retry: the entry counts as synced either way.
        self.source.mark_synced(entry);
    }
}
