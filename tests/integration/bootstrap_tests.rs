//! Integration tests for state replay to newly joined clients.

use skylink::adapters::snapshot::SharedInstrumentState;
use skylink::app::events::BridgeEvent;
use skylink::app::ports::{BootstrapHook, ByteQueue};
use skylink::app::state::{InstrumentState, StateEntry, encode_entry};
use skylink::bridge::bootstrap::SnapshotReplay;
use skylink::bridge::{BridgeChannel, ModeFlag};
use skylink::config::BridgeConfig;
use skylink::queue::{QueuePair, RecordQueue};

use crate::mock_net::{EventLog, MockListener, RecordingHook, WireHandle};

fn channel_with<H: BootstrapHook>(
    hook: H,
    queues: &QueuePair<RecordQueue>,
) -> BridgeChannel<MockListener, RecordQueue, H, fn(), EventLog> {
    BridgeChannel::new(
        &BridgeConfig::default(),
        MockListener::new(8880),
        queues.clone(),
        None,
        hook,
        (|| {}) as fn(),
        EventLog::default(),
    )
}

#[test]
fn each_client_gets_one_entry_per_iteration() {
    let queues = QueuePair::bounded();
    let mut ch = channel_with(RecordingHook::new(6), &queues);

    ch.listener_mut().connect();
    ch.step();
    ch.listener_mut().connect();
    for _ in 0..7 {
        ch.step();
    }

    let calls = &ch.bootstrap().calls;
    assert_eq!(calls.len(), 12);
    for client in [1, 2] {
        let indices: Vec<usize> = calls
            .iter()
            .filter(|(c, _)| *c == client)
            .map(|(_, i)| *i)
            .collect();
        assert_eq!(indices, [0, 1, 2, 3, 4, 5]);
    }
    // Second client trails the first by one iteration.
    assert_eq!(calls[..3], [(1u32, 0usize), (1, 1), (2, 0)]);
    assert_eq!(
        ch.events()
            .count(|e| matches!(e, BridgeEvent::StateReplayed { .. })),
        12
    );
}

fn sync_frames(wire: &WireHandle) -> Vec<String> {
    String::from_utf8(wire.borrow().sent.clone())
        .unwrap()
        .split_inclusive("\r\n")
        .filter(|l| l.starts_with("$SYNC,"))
        .map(str::to_owned)
        .collect()
}

#[test]
fn snapshot_replay_marks_every_entry_synced() {
    let queues: QueuePair<RecordQueue> = QueuePair::bounded();
    let state = SharedInstrumentState::new(InstrumentState::default());
    state.update(|s| s.maccready_ms = 1.5);
    let hook = SnapshotReplay::new(state.clone(), None);
    let mut ch = channel_with(hook, &queues);

    let wire = ch.listener_mut().connect();
    for _ in 0..6 {
        ch.step();
    }

    // Accepted and replayed in the same iteration: six steps, six entries.
    assert_eq!(state.synced_mask(), 0b0011_1111);
    for entry in StateEntry::ORDER {
        assert!(state.is_synced(entry));
    }
    let frames = sync_frames(&wire);
    assert_eq!(frames.len(), 6);
    assert_eq!(frames[0], "$SYNC,QNH,1013.25\r\n");
    assert_eq!(frames[3], "$SYNC,MC,1.5\r\n");
    // Nothing was routed through the shared outbound queue.
    assert!(queues.outbound.pop().is_none());
}

#[test]
fn two_joining_clients_each_get_the_snapshot_once() {
    let queues: QueuePair<RecordQueue> = QueuePair::bounded();
    let state = SharedInstrumentState::default();
    let hook = SnapshotReplay::new(state.clone(), None);
    let mut ch = channel_with(hook, &queues);

    let a = ch.listener_mut().connect();
    let b = ch.listener_mut().connect();
    for _ in 0..6 {
        ch.step();
    }
    assert_eq!(sync_frames(&a).len(), 6);
    // B was accepted one iteration later.
    assert_eq!(sync_frames(&b).len(), 5);

    ch.step();
    let expected: Vec<String> = StateEntry::ORDER
        .iter()
        .map(|e| encode_entry(*e, &InstrumentState::default()).as_str().to_owned())
        .collect();
    assert_eq!(sync_frames(&a), expected);
    assert_eq!(sync_frames(&b), expected);
    assert_eq!(state.synced_mask(), 0b0011_1111);

    // Live traffic still reaches both; the snapshot is not repeated.
    queues.outbound.push(b"$GPRMC\r\n").unwrap();
    for _ in 0..4 {
        ch.step();
    }
    assert_eq!(sync_frames(&a).len(), 6);
    assert_eq!(sync_frames(&b).len(), 6);
    assert!(String::from_utf8_lossy(&a.borrow().sent).ends_with("$GPRMC\r\n"));
    assert!(String::from_utf8_lossy(&b.borrow().sent).ends_with("$GPRMC\r\n"));
}

#[test]
fn existing_client_does_not_see_late_joiner_replay() {
    let queues: QueuePair<RecordQueue> = QueuePair::bounded();
    let hook = SnapshotReplay::new(SharedInstrumentState::default(), None);
    let mut ch = channel_with(hook, &queues);

    let first = ch.listener_mut().connect();
    for _ in 0..8 {
        ch.step();
    }
    let before = first.borrow().sent.len();

    let second = ch.listener_mut().connect();
    for _ in 0..8 {
        ch.step();
    }
    assert_eq!(first.borrow().sent.len(), before);
    assert_eq!(sync_frames(&second).len(), 6);
}

#[test]
fn binary_transfer_suppresses_replay_frames() {
    let queues: QueuePair<RecordQueue> = QueuePair::bounded();
    let state = SharedInstrumentState::default();
    let mode = ModeFlag::new();
    mode.set(true);
    let hook = SnapshotReplay::new(state.clone(), Some(mode));
    let mut ch = channel_with(hook, &queues);

    let wire = ch.listener_mut().connect();
    for _ in 0..8 {
        ch.step();
    }
    assert_eq!(state.synced_mask(), 0);
    assert!(sync_frames(&wire).is_empty());
    // Cursor still advanced: no replay after the flag clears.
    assert!(ch.clients().iter().all(|c| c.replay_cursor == 6));
}

#[test]
fn default_bootstrap_channel_is_silenced_by_the_global_flag() {
    let cfg = BridgeConfig::default();
    let vario = cfg.channel("vario").unwrap();
    let queues: QueuePair<RecordQueue> = QueuePair::bounded();
    let state = SharedInstrumentState::default();
    let mode = ModeFlag::new();
    let hook = SnapshotReplay::for_channel(vario, state.clone(), &mode).unwrap();
    let mut ch = channel_with(hook, &queues);

    // FLARM binary transfer in progress on another port.
    mode.set(true);
    let wire = ch.listener_mut().connect();
    for _ in 0..6 {
        ch.step();
    }
    assert!(sync_frames(&wire).is_empty());
    assert_eq!(state.synced_mask(), 0);
}
