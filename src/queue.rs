//! Bounded record queues shared between the bridge and the rest of the firmware.
//!
//! Each channel owns a [`QueuePair`]: an outbound queue filled by the
//! message router and drained by the bridge, and an inbound queue filled by
//! the bridge and drained by the router.
//!
//! ```text
//!  router ──push──▶ outbound ──try_pop──▶ bridge ──▶ sockets
//!  router ◀─pop──── inbound  ◀──push───── bridge ◀── sockets
//! ```
//!
//! Records are length-tagged (`heapless::Vec` carries its own length) and
//! never split: a consumer either gets a whole record or nothing.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::{Deque, Vec};

use crate::app::ports::ByteQueue;
use crate::error::QueueError;

/// Maximum payload of one queued record.
pub const RECORD_CAPACITY: usize = 256;

/// Default queue depth (records).
pub const QUEUE_DEPTH: usize = 20;

/// One length-tagged record.
pub type Record = Vec<u8, RECORD_CAPACITY>;

/// Multi-producer bounded FIFO of records.
///
/// Access is serialised by a critical-section mutex, so the queue may be
/// shared between tasks on either core and with ISR-free callers.
pub struct RecordQueue<const N: usize = QUEUE_DEPTH> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Deque<Record, N>>>,
}

impl<const N: usize> RecordQueue<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Pop the oldest record regardless of size.
    pub fn pop(&self) -> Option<Record> {
        self.inner.lock(|q| q.borrow_mut().pop_front())
    }

    /// Drop every queued record.
    pub fn clear(&self) {
        self.inner.lock(|q| q.borrow_mut().clear());
    }
}

impl<const N: usize> Default for RecordQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteQueue for RecordQueue<N> {
    fn push(&self, data: &[u8]) -> Result<(), QueueError> {
        let record = Record::from_slice(data).map_err(|_| QueueError::RecordTooLarge)?;
        self.inner
            .lock(|q| q.borrow_mut().push_back(record))
            .map_err(|_| QueueError::Full)
    }

    fn try_pop(&self, max: usize) -> Option<Record> {
        self.inner.lock(|q| {
            let mut q = q.borrow_mut();
            match q.front() {
                Some(head) if head.len() <= max => q.pop_front(),
                _ => None,
            }
        })
    }

    fn len(&self) -> usize {
        self.inner.lock(|q| q.borrow().len())
    }
}

/// Outbound and inbound queue of one channel.
///
/// The queues belong to the wider firmware; the bridge only holds
/// references to them.
pub struct QueuePair<Q> {
    /// Firmware → TCP clients.
    pub outbound: Arc<Q>,
    /// TCP clients → firmware.
    pub inbound: Arc<Q>,
}

impl<Q> QueuePair<Q> {
    pub fn new(outbound: Arc<Q>, inbound: Arc<Q>) -> Self {
        Self { outbound, inbound }
    }
}

impl<Q> Clone for QueuePair<Q> {
    fn clone(&self) -> Self {
        Self {
            outbound: Arc::clone(&self.outbound),
            inbound: Arc::clone(&self.inbound),
        }
    }
}

impl<const N: usize> QueuePair<RecordQueue<N>> {
    /// Fresh, empty pair.
    pub fn bounded() -> Self {
        Self::new(Arc::new(RecordQueue::new()), Arc::new(RecordQueue::new()))
    }
}
