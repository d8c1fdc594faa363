//! Fuzz target: `BridgeChannel::step`
//!
//! Interprets the input as a script of connects, peer behaviour changes,
//! outbound pushes, inbound writes, mode toggles and iterations. Asserts
//! the registry never exceeds its limit and no admitted client ever
//! carries more failures than the eviction threshold allows.
//!
//! cargo fuzz run fuzz_bridge_step

#![no_main]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use libfuzzer_sys::fuzz_target;
use skylink::app::events::BridgeEvent;
use skylink::app::ports::{ByteQueue, Connection, EventSink, Listener, NoBootstrap};
use skylink::bridge::{BridgeChannel, ModeFlag};
use skylink::config::{BridgeConfig, MAX_CLIENTS};
use skylink::error::LinkError;
use skylink::queue::{QueuePair, RecordQueue};

#[derive(Default)]
struct Peer {
    rx: VecDeque<Vec<u8>>,
    refuse: bool,
}

struct Conn(Rc<RefCell<Peer>>);

impl Connection for Conn {
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let data = self.0.borrow_mut().rx.pop_front().ok_or(LinkError::WouldBlock)?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn try_send(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        if self.0.borrow().refuse {
            Err(LinkError::WouldBlock)
        } else {
            Ok(data.len())
        }
    }
}

#[derive(Default)]
struct Accept(VecDeque<Conn>);

impl Listener for Accept {
    type Conn = Conn;

    fn try_accept(&mut self) -> Option<Conn> {
        self.0.pop_front()
    }

    fn port(&self) -> u16 {
        8881
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &BridgeEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let cfg = BridgeConfig::default();
    let queues: QueuePair<RecordQueue> = QueuePair::bounded();
    let mode = ModeFlag::new();
    let mut ch = BridgeChannel::new(
        &cfg,
        Accept::default(),
        queues.clone(),
        Some(mode.clone()),
        NoBootstrap,
        || {},
        Discard,
    );
    let mut peers: Vec<Rc<RefCell<Peer>>> = Vec::new();

    for chunk in data.chunks(2) {
        let (op, arg) = (chunk[0], chunk.get(1).copied().unwrap_or(0));
        match op % 6 {
            0 => {
                let peer = Rc::new(RefCell::new(Peer::default()));
                ch.listener_mut().0.push_back(Conn(Rc::clone(&peer)));
                peers.push(peer);
            }
            1 => {
                if let Some(p) = peers.get(usize::from(arg) % peers.len().max(1)) {
                    let mut p = p.borrow_mut();
                    p.refuse = !p.refuse;
                }
            }
            2 => {
                let _ = queues.outbound.push(&vec![arg; usize::from(arg)]);
            }
            3 => {
                if let Some(p) = peers.get(usize::from(arg) % peers.len().max(1)) {
                    p.borrow_mut().rx.push_back(vec![arg; usize::from(arg) + 1]);
                }
            }
            4 => mode.set(arg & 1 == 1),
            _ => {
                for _ in 0..=arg % 8 {
                    ch.step();
                    let _ = queues.inbound.try_pop(usize::MAX);
                    if !mode.is_set() {
                        assert!(
                            ch.clients()
                                .iter()
                                .all(|c| c.failures <= cfg.max_send_failures),
                            "client over the failure threshold survived a text-mode pass"
                        );
                    }
                }
            }
        }

        assert!(ch.clients().len() <= MAX_CLIENTS);
    }
});
