//! Store Tests
//!
//! Tests verify:
//! - Read/write semantics
//! - Test-and-set success, mismatch and missing-key outcomes
//! - Test-and-set atomicity under concurrent writers

use std::sync::Arc;
use std::thread;

use singleop::store::{Store, SwapOutcome};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = Store::new();
    assert!(store.is_empty());
    assert_eq!(store.entry_count(), 0);
    assert_eq!(store.size(), 0);
}

#[test]
fn test_write_and_read() {
    let store = Store::new();
    store.write(b"key1".to_vec(), b"value1".to_vec());

    assert_eq!(store.read(b"key1"), Some(b"value1".to_vec()));
    assert_eq!(store.read(b"key2"), None);
    assert_eq!(store.size(), 10);
}

#[test]
fn test_write_overwrites() {
    let store = Store::new();
    store.write(b"k".to_vec(), b"v1".to_vec());
    store.write(b"k".to_vec(), b"v2".to_vec());

    assert_eq!(store.read(b"k"), Some(b"v2".to_vec()));
    assert_eq!(store.entry_count(), 1);
}

// =============================================================================
// Test-and-Set Tests
// =============================================================================

#[test]
fn test_swap_replaces_matching_value() {
    let store = Store::new();
    store.write(b"k".to_vec(), b"old".to_vec());

    assert_eq!(store.test_and_set(b"k", b"old", b"new".to_vec()), SwapOutcome::Replaced);
    assert_eq!(store.read(b"k"), Some(b"new".to_vec()));
}

#[test]
fn test_swap_mismatch_leaves_value() {
    let store = Store::new();
    store.write(b"k".to_vec(), b"current".to_vec());

    assert_eq!(
        store.test_and_set(b"k", b"stale", b"new".to_vec()),
        SwapOutcome::Mismatch(b"current".to_vec())
    );
    assert_eq!(store.read(b"k"), Some(b"current".to_vec()));
}

#[test]
fn test_swap_missing_key() {
    let store = Store::new();
    assert_eq!(store.test_and_set(b"k", b"", b"new".to_vec()), SwapOutcome::Missing);
    assert_eq!(store.read(b"k"), None);
}

#[test]
fn test_concurrent_swaps_lose_no_increment() {
    let store = Arc::new(Store::new());
    store.write(b"counter".to_vec(), 0u64.to_be_bytes().to_vec());

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    loop {
                        let current = store.read(b"counter").unwrap();
                        let n = u64::from_be_bytes(current.as_slice().try_into().unwrap());
                        let next = (n + 1).to_be_bytes().to_vec();
                        if store.test_and_set(b"counter", &current, next) == SwapOutcome::Replaced {
                            break;
                        }
                    }
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }

    let total = store.read(b"counter").unwrap();
    assert_eq!(u64::from_be_bytes(total.as_slice().try_into().unwrap()), 1600);
}
