//! Integration tests for the accept → drain → per-client → router pipeline.
//!
//! Each test builds a channel over mock sockets and real record queues,
//! then drives it with `step()` and inspects what every client saw.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use skylink::app::events::BridgeEvent;
use skylink::app::ports::{ByteQueue, NoBootstrap};
use skylink::bridge::{BridgeChannel, ModeFlag};
use skylink::config::BridgeConfig;
use skylink::queue::{QueuePair, RecordQueue};

use crate::mock_net::{EventLog, MockListener, SendBehaviour, WireHandle};

type Channel = BridgeChannel<MockListener, RecordQueue, NoBootstrap, Box<dyn FnMut()>, EventLog>;

struct Rig {
    ch: Channel,
    queues: QueuePair<RecordQueue>,
    ticks: Rc<Cell<u32>>,
}

fn rig(mode: Option<ModeFlag>) -> Rig {
    let queues: QueuePair<RecordQueue> = QueuePair::bounded();
    let ticks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&ticks);
    let ch = BridgeChannel::new(
        &BridgeConfig::default(),
        MockListener::new(8880),
        queues.clone(),
        mode,
        NoBootstrap,
        Box::new(move || counter.set(counter.get() + 1)) as Box<dyn FnMut()>,
        EventLog::default(),
    );
    Rig { ch, queues, ticks }
}

impl Rig {
    /// Connect a client and run the iteration that admits it.
    fn join(&mut self) -> WireHandle {
        let wire = self.ch.listener_mut().connect();
        self.ch.step();
        wire
    }

    fn send_step(&mut self, data: &[u8]) {
        self.queues.outbound.push(data).unwrap();
        self.ch.step();
    }
}

// ── Admission ─────────────────────────────────────────────────

#[test]
fn eleventh_connection_is_rejected_and_closed() {
    let mut r = rig(None);
    let wires: Vec<_> = (0..11).map(|_| r.join()).collect();

    assert_eq!(r.ch.clients().len(), 10);
    assert!(wires[10].borrow().closed, "rejected socket must be closed");
    assert!(wires[..10].iter().all(|w| !w.borrow().closed));
    assert_eq!(
        r.ch.events().count(|e| matches!(e, BridgeEvent::ClientRejected { port: 8880 })),
        1
    );
    assert_eq!(r.ch.stats().snapshot().rejected, 1);
}

#[test]
fn router_ticks_every_iteration_even_without_clients() {
    let mut r = rig(None);
    for _ in 0..7 {
        r.ch.step();
    }
    assert_eq!(r.ticks.get(), 7);
    r.join();
    assert_eq!(r.ticks.get(), 8);
}

// ── Broadcast ─────────────────────────────────────────────────

#[test]
fn records_arrive_in_order_without_splitting() {
    let mut r = rig(None);
    let w = r.join();

    let mut expected = Vec::new();
    for i in 0..20u8 {
        let record = [b'A' + i; 30];
        r.queues.outbound.push(&record).unwrap();
        expected.extend_from_slice(&record);
    }

    r.ch.step();
    assert_eq!(r.ch.last_block().len(), 390, "13 whole records fit in 400");
    r.ch.step();
    assert_eq!(r.ch.last_block().len(), 210);
    assert_eq!(w.borrow().sent, expected);
    assert!(r.queues.outbound.is_empty());
}

#[test]
fn binary_transfer_uses_larger_blocks() {
    let mode = ModeFlag::new();
    let mut r = rig(Some(mode.clone()));
    r.join();
    mode.set(true);

    for _ in 0..20 {
        r.queues.outbound.push(&[0x5a; 30]).unwrap();
    }
    assert_eq!(r.ch.step(), Duration::from_millis(5));
    assert_eq!(r.ch.last_block().len(), 510, "17 whole records fit in 512");
}

#[test]
fn failing_client_does_not_starve_healthy_one() {
    let mut r = rig(None);
    let bad = r.join();
    let good = r.join();
    bad.borrow_mut().behaviour = SendBehaviour::Broken;

    for _ in 0..101 {
        r.send_step(b"$GPRMC\r\n");
    }
    assert_eq!(r.ch.clients().len(), 1);
    assert!(bad.borrow().closed);
    assert_eq!(good.borrow().sent.len(), 101 * 8);
}

// ── Failure accounting ────────────────────────────────────────

#[test]
fn evicted_on_the_101st_consecutive_failure() {
    let mut r = rig(None);
    let w = r.join();
    w.borrow_mut().behaviour = SendBehaviour::WouldBlock;

    for _ in 0..100 {
        r.send_step(b"x");
    }
    assert_eq!(r.ch.clients().len(), 1);
    assert!(!w.borrow().closed);

    r.send_step(b"x");
    assert!(r.ch.clients().is_empty());
    assert!(w.borrow().closed);
    assert_eq!(w.borrow().send_calls, 101);
    assert!(r.ch.events().events.iter().any(|e| matches!(
        e,
        BridgeEvent::ClientEvicted { failures: 101, .. }
    )));
}

#[test]
fn successful_send_resets_the_counter() {
    let mut r = rig(None);
    let w = r.join();
    w.borrow_mut().behaviour = SendBehaviour::WouldBlock;
    for _ in 0..80 {
        r.send_step(b"x");
    }

    w.borrow_mut().behaviour = SendBehaviour::AcceptAll;
    r.send_step(b"y");
    assert_eq!(r.ch.clients().iter().next().unwrap().failures, 0);

    w.borrow_mut().behaviour = SendBehaviour::WouldBlock;
    for _ in 0..100 {
        r.send_step(b"x");
    }
    assert_eq!(r.ch.clients().len(), 1, "only 100 failures since the reset");
}

#[test]
fn partial_send_counts_as_success() {
    let mut r = rig(None);
    let w = r.join();
    w.borrow_mut().behaviour = SendBehaviour::Partial(1);
    for _ in 0..150 {
        r.send_step(b"abc");
    }
    assert_eq!(r.ch.clients().len(), 1);
    assert_eq!(w.borrow().sent.len(), 150);
}

#[test]
fn binary_mode_never_evicts() {
    let mode = ModeFlag::new();
    let mut r = rig(Some(mode.clone()));
    let w = r.join();
    mode.set(true);
    w.borrow_mut().behaviour = SendBehaviour::Broken;

    for _ in 0..500 {
        r.send_step(b"\x7e\x01");
    }
    assert_eq!(r.ch.clients().len(), 1);

    // Leaving binary mode applies the threshold again.
    mode.set(false);
    r.send_step(b"\x7e\x01");
    assert!(r.ch.clients().is_empty());
}

// ── Keep-alive ────────────────────────────────────────────────

#[test]
fn keepalive_on_the_eleventh_idle_iteration() {
    let mut r = rig(None);
    let w = r.join();
    for _ in 0..9 {
        r.ch.step();
    }
    assert!(w.borrow().sent.is_empty());

    r.ch.step();
    assert_eq!(w.borrow().sent, b"\n");
    assert_eq!(r.ch.stall_count(), 0);

    // Live data resets the stall count.
    for _ in 0..5 {
        r.ch.step();
    }
    r.send_step(b"$PFLAU\r\n");
    assert_eq!(r.ch.stall_count(), 0);
    assert_eq!(r.ch.stats().snapshot().keepalives, 1);
}

#[test]
fn no_keepalive_during_binary_transfer() {
    let mode = ModeFlag::new();
    let mut r = rig(Some(mode.clone()));
    let w = r.join();
    mode.set(true);
    for _ in 0..50 {
        r.ch.step();
    }
    assert!(w.borrow().sent.is_empty());
    assert_eq!(r.ch.stall_count(), 51);
}

// ── Inbound ───────────────────────────────────────────────────

#[test]
fn inbound_bytes_are_queued_in_client_order() {
    let mut r = rig(None);
    let a = r.join();
    let b = r.join();
    b.borrow_mut().rx.push_back(b"from-b".to_vec());
    a.borrow_mut().rx.push_back(b"from-a".to_vec());
    r.ch.step();

    assert_eq!(r.queues.inbound.pop().unwrap().as_slice(), b"from-a");
    assert_eq!(r.queues.inbound.pop().unwrap().as_slice(), b"from-b");
}

#[test]
fn full_inbound_queue_drops_and_reports() {
    let mut r = rig(None);
    let w = r.join();
    for _ in 0..20 {
        r.queues.inbound.push(b"old").unwrap();
    }
    w.borrow_mut().rx.push_back(b"lost".to_vec());
    r.ch.step();

    assert_eq!(r.queues.inbound.len(), 20);
    assert!(r.ch.events().events.contains(&BridgeEvent::InboundDropped { port: 8880, len: 4 }));
    assert_eq!(r.ch.stats().snapshot().inbound_drops, 1);
}

#[test]
fn yield_is_two_hundred_ms_in_text_mode() {
    let mut r = rig(None);
    assert_eq!(r.ch.step(), Duration::from_millis(200));
}
