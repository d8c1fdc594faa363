//! Client registry: the connected sockets of one channel.
//!
//! Clients are kept in admission order, which is also the order they are
//! serviced every iteration. Capacity is bounded by
//! [`MAX_CLIENTS`](crate::config::MAX_CLIENTS); a full registry sheds new
//! connections instead of queueing them.
//!
//! Removal during the per-client pass uses tombstones: the pass marks
//! clients for eviction, and [`ClientRegistry::sweep`] compacts the list
//! afterwards, preserving the order of survivors.

use heapless::Vec;

use crate::app::ports::ClientId;
use crate::config::MAX_CLIENTS;

/// One connected client.
pub struct Client<C> {
    pub id: ClientId,
    pub conn: C,
    /// Consecutive failed send attempts. Reset on any accepted send.
    pub failures: u16,
    /// Next bootstrap entry to replay.
    pub replay_cursor: usize,
    evicted: bool,
}

impl<C> Client<C> {
    fn new(id: ClientId, conn: C) -> Self {
        Self {
            id,
            conn,
            failures: 0,
            replay_cursor: 0,
            evicted: false,
        }
    }

    /// Mark for removal at the next sweep.
    pub fn evict(&mut self) {
        self.evicted = true;
    }

    pub fn is_evicted(&self) -> bool {
        self.evicted
    }
}

/// Ordered, capacity-bounded client list.
pub struct ClientRegistry<C> {
    clients: Vec<Client<C>, MAX_CLIENTS>,
    limit: usize,
    next_id: ClientId,
}

impl<C> ClientRegistry<C> {
    /// `limit` is clamped to `1..=MAX_CLIENTS`.
    pub fn new(limit: usize) -> Self {
        Self {
            clients: Vec::new(),
            limit: limit.clamp(1, MAX_CLIENTS),
            next_id: 1,
        }
    }

    /// Append a new client. Hands the connection back if the registry is full.
    pub fn admit(&mut self, conn: C) -> Result<ClientId, C> {
        if self.clients.len() >= self.limit {
            return Err(conn);
        }
        let id = self.next_id;
        self.clients
            .push(Client::new(id, conn))
            .map_err(|c| c.conn)?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    /// Clients in service order.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Client<C>> {
        self.clients.iter_mut()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Client<C>> {
        self.clients.iter()
    }

    /// Remove evicted clients, keeping survivors in order. Returns the
    /// removed clients; dropping them closes their sockets.
    pub fn sweep(&mut self) -> Vec<Client<C>, MAX_CLIENTS> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.clients.len() {
            if self.clients[i].evicted {
                // Never exceeds MAX_CLIENTS: it holds a subset of `clients`.
                let kept = removed.push(self.clients.remove(i));
                debug_assert!(kept.is_ok());
            } else {
                i += 1;
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.limit
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
