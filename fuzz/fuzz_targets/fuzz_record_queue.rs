//! Fuzz target: `RecordQueue` + `MessageBlock::fill_from`
//!
//! Splits the input into records (first byte of each chunk is its length),
//! pushes them and drains with a fuzzed block limit. Asserts that blocks
//! never exceed the limit and that the drained stream equals the accepted
//! records, in order.
//!
//! cargo fuzz run fuzz_record_queue

#![no_main]

use libfuzzer_sys::fuzz_target;
use skylink::app::ports::ByteQueue;
use skylink::bridge::block::MessageBlock;
use skylink::queue::RecordQueue;

fuzz_target!(|data: &[u8]| {
    let Some((&limit, mut rest)) = data.split_first() else {
        return;
    };
    let limit = usize::from(limit) * 2 + 1;

    let q: RecordQueue<20> = RecordQueue::new();
    let mut accepted = Vec::new();
    while let Some((&len, tail)) = rest.split_first() {
        let len = usize::from(len).min(tail.len());
        let (record, tail) = tail.split_at(len);
        if q.push(record).is_ok() {
            accepted.extend_from_slice(record);
        }
        rest = tail;
    }

    let mut block = MessageBlock::new();
    let mut drained = Vec::new();
    loop {
        let n = block.fill_from(&q, limit);
        assert!(n <= limit, "block exceeds limit");
        if n == 0 {
            break;
        }
        drained.extend_from_slice(block.as_slice());
    }

    // Whatever is left is an oversized head (or empty records behind it).
    let mut tail = Vec::new();
    while let Some(r) = q.pop() {
        tail.extend_from_slice(&r);
    }
    drained.extend_from_slice(&tail);
    assert_eq!(drained, accepted);
});
