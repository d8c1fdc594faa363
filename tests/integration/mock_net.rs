//! In-memory sockets and recording adapters for integration tests.
//!
//! Every fake shares its state through `Rc<RefCell<_>>` so a test keeps a
//! handle to a client's wire after the channel has taken ownership of the
//! connection.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use skylink::app::events::BridgeEvent;
use skylink::app::ports::{BootstrapHook, ClientId, Connection, EventSink, Listener};
use skylink::error::LinkError;

// ── Client wire ───────────────────────────────────────────────

/// How the fake peer answers send attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendBehaviour {
    AcceptAll,
    /// Accept at most this many bytes per call.
    Partial(usize),
    WouldBlock,
    Broken,
}

#[derive(Debug)]
pub struct Wire {
    pub rx: VecDeque<Vec<u8>>,
    pub sent: Vec<u8>,
    pub send_calls: usize,
    pub behaviour: SendBehaviour,
    pub closed: bool,
}

impl Default for Wire {
    fn default() -> Self {
        Self {
            rx: VecDeque::new(),
            sent: Vec::new(),
            send_calls: 0,
            behaviour: SendBehaviour::AcceptAll,
            closed: false,
        }
    }
}

pub type WireHandle = Rc<RefCell<Wire>>;

pub struct MockConn(WireHandle);

impl Drop for MockConn {
    fn drop(&mut self) {
        self.0.borrow_mut().closed = true;
    }
}

impl Connection for MockConn {
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let mut w = self.0.borrow_mut();
        let Some(mut data) = w.rx.pop_front() else {
            return Err(LinkError::WouldBlock);
        };
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        if n < data.len() {
            w.rx.push_front(data.split_off(n));
        }
        Ok(n)
    }

    fn try_send(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        let mut w = self.0.borrow_mut();
        w.send_calls += 1;
        match w.behaviour {
            SendBehaviour::AcceptAll => {
                w.sent.extend_from_slice(data);
                Ok(data.len())
            }
            SendBehaviour::Partial(max) => {
                let n = data.len().min(max);
                w.sent.extend_from_slice(&data[..n]);
                Ok(n)
            }
            SendBehaviour::WouldBlock => Err(LinkError::WouldBlock),
            SendBehaviour::Broken => Err(LinkError::Io),
        }
    }
}

// ── Listener ──────────────────────────────────────────────────

pub struct MockListener {
    pub port: u16,
    pending: VecDeque<MockConn>,
}

#[allow(dead_code)]
impl MockListener {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            pending: VecDeque::new(),
        }
    }

    /// Queue an incoming connection; returns the test's end of the wire.
    pub fn connect(&mut self) -> WireHandle {
        let wire = WireHandle::default();
        self.pending.push_back(MockConn(Rc::clone(&wire)));
        wire
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Listener for MockListener {
    type Conn = MockConn;

    fn try_accept(&mut self) -> Option<MockConn> {
        self.pending.pop_front()
    }

    fn port(&self) -> u16 {
        self.port
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<BridgeEvent>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn count(&self, pred: impl Fn(&BridgeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &BridgeEvent) {
        self.events.push(event.clone());
    }
}

// ── Bootstrap hook ────────────────────────────────────────────

/// Records every replay call as `(client, index)`.
pub struct RecordingHook {
    pub entries: usize,
    pub calls: Vec<(ClientId, usize)>,
}

impl RecordingHook {
    pub fn new(entries: usize) -> Self {
        Self {
            entries,
            calls: Vec::new(),
        }
    }
}

impl BootstrapHook for RecordingHook {
    fn entry_count(&self) -> usize {
        self.entries
    }

    fn replay<C: Connection>(&mut self, _port: u16, client: ClientId, index: usize, _conn: &mut C) {
        self.calls.push((client, index));
    }
}
