//! Per-iteration message block.
//!
//! Assembled once per loop iteration from the outbound queue and then
//! broadcast unchanged to every registered client.

use heapless::Vec;

use crate::app::ports::ByteQueue;
use crate::config::MAX_BLOCK_SIZE;

/// Transient broadcast buffer.
pub struct MessageBlock {
    buf: Vec<u8, MAX_BLOCK_SIZE>,
}

impl MessageBlock {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Refill from `queue` with whole records, up to `limit` bytes.
    ///
    /// Returns the number of bytes pulled. `limit` is clamped to the
    /// buffer capacity.
    pub fn fill_from<Q: ByteQueue + ?Sized>(&mut self, queue: &Q, limit: usize) -> usize {
        self.buf.clear();
        let limit = limit.min(MAX_BLOCK_SIZE);
        while let Some(record) = queue.try_pop(limit - self.buf.len()) {
            // try_pop bounds the record by the remaining space.
            let appended = self.buf.extend_from_slice(&record);
            debug_assert!(appended.is_ok());
            if self.buf.len() == limit {
                break;
            }
        }
        self.buf.len()
    }

    /// Replace the contents with a single keep-alive newline.
    pub fn set_keepalive(&mut self) {
        self.buf.clear();
        let pushed = self.buf.push(b'\n');
        debug_assert!(pushed.is_ok());
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for MessageBlock {
    fn default() -> Self {
        Self::new()
    }
}
