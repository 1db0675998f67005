//! Integration test: one cached buffer shared by several pinned slices.
//!
//! Models a block-cache entry handed out to two readers. Each reader pins
//! the same bytes and holds one reference to a shared cleanup chain; the
//! entry is released exactly once, after the last reader lets go, whatever
//! order they finish in.

use std::sync::Arc;

use badger::prelude::*;
use badger_test_utils::CleanupLog;

/// A cache entry whose bytes outlive every reader.
struct Entry {
    bytes: Vec<u8>,
    handle: SharedCleanablePtr,
}

fn entry(log: &CleanupLog, bytes: &[u8]) -> Entry {
    let mut handle = SharedCleanablePtr::allocated();
    assert!(handle.register_cleanup(log.recorder("entry released")));
    Entry {
        bytes: bytes.to_vec(),
        handle,
    }
}

#[test]
fn shared_entry_released_once_in_either_drop_order() {
    for reverse in [false, true] {
        let log = CleanupLog::new();
        let mut e = entry(&log, b"value");
        {
            let mut first = PinnableSlice::new();
            let mut second = PinnableSlice::new();
            first.pin_slice(Slice::from(&e.bytes), log.recorder("first done"));
            e.handle.register_copy_with(&mut first);
            second.pin_slice(Slice::from(&e.bytes), log.recorder("second done"));
            e.handle.register_copy_with(&mut second);

            // The cache drops its own reference; readers keep the entry alive.
            e.handle.reset();
            assert!(log.is_empty());
            assert_eq!(first.as_slice(), "value");
            assert_eq!(second.as_slice(), "value");

            if reverse {
                drop(second);
                assert_eq!(log.count("entry released"), 0);
                drop(first);
            } else {
                drop(first);
                assert_eq!(log.count("entry released"), 0);
                drop(second);
            }
        }
        assert_eq!(log.count("entry released"), 1, "reverse = {reverse}");
        assert_eq!(log.entries().last().map(String::as_str), Some("entry released"));
    }
}

#[test]
fn moved_reference_is_released_by_the_last_reader() {
    let log = CleanupLog::new();
    let mut e = entry(&log, b"abc");
    let mut reader = PinnableSlice::new();
    e.handle.move_as_cleanup_to(&mut reader);
    assert!(e.handle.is_empty());
    reader.pin_slice(Slice::from(&e.bytes), log.recorder("reader done"));

    reader.reset();
    assert_eq!(log.entries(), ["entry released", "reader done"]);
}

#[test]
fn iterator_cleanups_delegate_into_pinned_value() {
    let log = CleanupLog::new();
    let block = Arc::new(b"key1value1".to_vec());

    // An iterator holds the block and releases it on its own cleanup.
    let mut iter_chain = Cleanable::new();
    let held = Arc::clone(&block);
    iter_chain.register_cleanup(move || drop(held));
    log.register(&mut iter_chain, "block unpinned");

    let mut value = PinnableSlice::new();
    let mut view = Slice::from(block.as_slice());
    view.remove_prefix(4);
    value.pin_slice_from(view, &mut iter_chain);

    drop(iter_chain);
    assert!(log.is_empty());
    assert_eq!(Arc::strong_count(&block), 2);
    assert_eq!(value.as_slice(), "value1");

    drop(value);
    assert_eq!(log.entries(), ["block unpinned"]);
    assert_eq!(Arc::strong_count(&block), 1);
}

#[test]
fn handles_released_across_pool_threads_fire_once() {
    let log = CleanupLog::new();
    let mut handle = SharedCleanablePtr::allocated();
    handle.register_cleanup(log.recorder("released"));

    let mut pool = ThreadPool::new(4).unwrap();
    for _ in 0..64 {
        let copy = handle.clone();
        pool.execute(move || drop(copy)).unwrap();
    }
    handle.reset();
    pool.shutdown();

    assert_eq!(log.count("released"), 1);
}

#[test]
fn self_pinned_value_survives_source_drop() {
    let mut value = PinnableSlice::with_capacity(16);
    {
        let source = String::from("scratch-value");
        value.pin_self(Slice::from(&source));
    }
    value.remove_suffix(6);
    assert!(!value.is_pinned());
    assert_eq!(value.to_vec(), b"scratch");
}
