//! Tests for TransactionSingleOp
//!
//! These tests verify:
//! - Construction and closing
//! - Read/write round trips and last-write-wins
//! - Test-and-set success, mismatch and missing-key outcomes
//! - The closed-instance guard
//! - Independent instances running in parallel

use std::collections::HashSet;
use std::thread;

#[path = "../common/mod.rs"]
mod common;

use common::{dead_addr, policy_for, start_node, ScriptedNode, TEST_DATA};
use singleop::{
    create_connection, ClientError, ConnectionManager, ConnectionPolicy, ErrorKind,
    TransactionSingleOp, Value,
};

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_connect_and_close() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    assert!(!tx.is_closed());
    assert_eq!(tx.node(), node.addr().to_string());
    tx.close_connection();
    assert!(tx.is_closed());
}

#[test]
fn test_with_connection() {
    let node = start_node();
    let conn = create_connection(&policy_for(node.addr())).unwrap();
    let mut tx = TransactionSingleOp::with_connection(conn);
    tx.write("with_connection", TEST_DATA[0]).unwrap();
    tx.close_connection();
}

#[test]
fn test_with_manager() {
    let node = start_node();
    let manager = ConnectionManager::new(policy_for(node.addr()));
    let mut a = TransactionSingleOp::with_manager(&manager).unwrap();
    let mut b = TransactionSingleOp::with_manager(&manager).unwrap();

    let key = "with_manager".to_string();
    a.write(key.as_str(), "shared").unwrap();
    assert_eq!(b.read(key.as_str()).unwrap(), Value::from("shared"));
}

#[test]
fn test_connect_spreads_over_nodes_by_default() {
    let first = start_node();
    let second = start_node();
    let policy = ConnectionPolicy::builder()
        .nodes(vec![first.addr().to_string(), second.addr().to_string()])
        .max_retries(0)
        .build();

    let mut used = HashSet::new();
    for _ in 0..8 {
        let tx = TransactionSingleOp::connect(&policy).unwrap();
        used.insert(tx.node().to_string());
    }
    assert_eq!(used.len(), 2, "connections all went to {:?}", used);
}

#[test]
fn test_connect_without_node() {
    let err = TransactionSingleOp::connect(&policy_for(dead_addr())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[test]
fn test_oversized_write_keeps_connection() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();

    let big = Value::Bytes(vec![7; 17 * 1024 * 1024]);
    let err = tx.write("big", big.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert!(!tx.is_closed());

    let err = tx.test_and_set("big", "small", big).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);

    tx.write("small", "v").unwrap();
    assert_eq!(tx.read("small").unwrap(), Value::from("v"));
    assert!(node.store().read(b"big").is_none());
}

#[test]
fn test_close_twice_is_harmless() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    tx.close_connection();
    tx.close_connection();
    assert!(tx.is_closed());
}

// =============================================================================
// Read/Write Tests
// =============================================================================

#[test]
fn test_read_not_found() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    assert_eq!(tx.read("read_not_found"), Err(ClientError::NotFound));
}

#[test]
fn test_write_distinct_keys_then_read() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    let key = "write1".to_string();

    for (i, data) in TEST_DATA.iter().enumerate() {
        tx.write(format!("{}{}", key, i), *data).unwrap();
    }
    for (i, data) in TEST_DATA.iter().enumerate() {
        let actual = tx.read(format!("{}{}", key, i)).unwrap();
        assert_eq!(actual.as_str(), Some(*data));
    }
}

#[test]
fn test_write_same_key_last_wins() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    let key = "write2".to_string();

    for data in TEST_DATA.iter() {
        tx.write(key.as_str(), *data).unwrap();
    }
    assert_eq!(tx.read(key.as_str()).unwrap(), Value::from(TEST_DATA[TEST_DATA.len() - 1]));
}

#[test]
fn test_write_tuple_values() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    let key = "write_tuple".to_string();

    let mut last = None;
    for pair in TEST_DATA.chunks(2) {
        let value = Value::Tuple(vec![Value::from(pair[0]), Value::from(pair[1])]);
        tx.write(key.as_str(), value.clone()).unwrap();
        last = Some(value);
    }
    assert_eq!(Some(tx.read(key.as_str()).unwrap()), last);
}

#[test]
fn test_round_trip_preserves_every_value_shape() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();

    let values = vec![
        Value::Bytes(vec![0, 1, 2, 255]),
        Value::Bytes(vec![]),
        Value::from(""),
        Value::Int(i64::MIN),
        Value::Bool(false),
        Value::Atom("ok".into()),
        Value::List(vec![]),
        Value::Tuple(vec![Value::Int(1), Value::List(vec![Value::from("nested")])]),
    ];
    for (i, value) in values.iter().enumerate() {
        let key = format!("shape_{}", i);
        tx.write(key.as_str(), value).unwrap();
        assert_eq!(&tx.read(key.as_str()).unwrap(), value);
    }
}

#[test]
fn test_binary_keys_are_distinct() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();

    tx.write(vec![0u8, 1], "first").unwrap();
    tx.write(vec![0u8, 1, 0], "second").unwrap();
    assert_eq!(tx.read(vec![0u8, 1]).unwrap(), Value::from("first"));
    assert_eq!(tx.read(vec![0u8, 1, 0]).unwrap(), Value::from("second"));
}

// =============================================================================
// Test-and-Set Tests
// =============================================================================

#[test]
fn test_test_and_set_not_found() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    let key = "tas_not_found".to_string();

    assert_eq!(tx.test_and_set(key.as_str(), "anything", "else"), Err(ClientError::NotFound));
    // And it did not create the key
    assert_eq!(tx.read(key.as_str()), Err(ClientError::NotFound));
}

#[test]
fn test_test_and_set_success() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    let key = "tas_1".to_string();

    tx.write(key.as_str(), TEST_DATA[0]).unwrap();
    tx.test_and_set(key.as_str(), TEST_DATA[0], TEST_DATA[1]).unwrap();
    assert_eq!(tx.read(key.as_str()).unwrap(), Value::from(TEST_DATA[1]));
}

#[test]
fn test_test_and_set_mismatch_preserves_state() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    let key = "tas_2".to_string();

    tx.write(key.as_str(), TEST_DATA[0]).unwrap();
    let err = tx.test_and_set(key.as_str(), TEST_DATA[2], TEST_DATA[1]).unwrap_err();

    assert_eq!(err, ClientError::KeyChanged { old_value: Value::from(TEST_DATA[0]) });
    assert_eq!(tx.read(key.as_str()).unwrap(), Value::from(TEST_DATA[0]));
}

#[test]
fn test_test_and_set_compares_encodings() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    let key = "tas_atom".to_string();

    tx.write(key.as_str(), Value::Atom("ok".into())).unwrap();

    // Same text, different encoding: not equal
    let err = tx.test_and_set(key.as_str(), "ok", "replaced").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyChanged);

    let tuple = Value::Tuple(vec![Value::from(TEST_DATA[0]), Value::from(TEST_DATA[1])]);
    tx.test_and_set(key.as_str(), Value::Atom("ok".into()), tuple.clone()).unwrap();
    assert_eq!(tx.read(key.as_str()).unwrap(), tuple);
}

#[test]
fn test_key_changed_scenario() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();

    tx.write("K1", "ahz2ieSh").unwrap();
    tx.test_and_set("K1", "ahz2ieSh", "wooPhu8u").unwrap();
    assert_eq!(tx.read("K1").unwrap(), Value::from("wooPhu8u"));

    match tx.test_and_set("K1", "ahz2ieSh", "fail") {
        Err(ClientError::KeyChanged { old_value }) => assert_eq!(old_value, Value::from("wooPhu8u")),
        other => panic!("expected KeyChanged, got {:?}", other),
    }
    assert_eq!(tx.read("K1").unwrap(), Value::from("wooPhu8u"));
}

#[test]
fn test_retry_with_returned_old_value() {
    let node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    let key = "tas_retry".to_string();

    tx.write(key.as_str(), "actual").unwrap();
    let old_value = match tx.test_and_set(key.as_str(), "guess", "next") {
        Err(ClientError::KeyChanged { old_value }) => old_value,
        other => panic!("expected KeyChanged, got {:?}", other),
    };
    tx.test_and_set(key.as_str(), old_value, "next").unwrap();
    assert_eq!(tx.read(key.as_str()).unwrap(), Value::from("next"));
}

// =============================================================================
// Closed Instance Tests
// =============================================================================

#[test]
fn test_closed_instance_rejects_every_operation() {
    let scripted = ScriptedNode::start(vec![]);
    let mut tx = TransactionSingleOp::connect(&policy_for(scripted.addr)).unwrap();
    tx.close_connection();

    assert_eq!(tx.read("_Read_NotConnected").unwrap_err().kind(), ErrorKind::Connection);
    assert_eq!(tx.write("_Write_NotConnected", "v").unwrap_err().kind(), ErrorKind::Connection);
    assert_eq!(
        tx.test_and_set("_TestAndSet_NotConnected", Value::Atom("ok".into()), "v")
            .unwrap_err()
            .kind(),
        ErrorKind::Connection
    );

    drop(tx);
    assert_eq!(scripted.join(), 0);
}

#[test]
fn test_node_shutdown_surfaces_connection_error() {
    let mut node = start_node();
    let mut tx = TransactionSingleOp::connect(&policy_for(node.addr())).unwrap();
    tx.write("k", "v").unwrap();

    node.shutdown().unwrap();

    assert_eq!(tx.read("k").unwrap_err().kind(), ErrorKind::Connection);
    assert!(tx.is_closed());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_independent_instances_in_parallel() {
    let node = start_node();
    let addr = node.addr();

    let threads: Vec<_> = (0..4)
        .map(|t| {
            thread::spawn(move || {
                let mut tx = TransactionSingleOp::connect(&policy_for(addr)).unwrap();
                let key = format!("parallel_{}", t);
                for data in TEST_DATA.iter() {
                    tx.write(key.as_str(), *data).unwrap();
                    assert_eq!(tx.read(key.as_str()).unwrap(), Value::from(*data));
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }
}

#[test]
fn test_parallel_increments_via_test_and_set() {
    let node = start_node();
    let addr = node.addr();
    let key = "counter".to_string();

    let mut setup = TransactionSingleOp::connect(&policy_for(addr)).unwrap();
    setup.write(key.as_str(), 0i64).unwrap();

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let key = key.clone();
            thread::spawn(move || {
                let mut tx = TransactionSingleOp::connect(&policy_for(addr)).unwrap();
                for _ in 0..25 {
                    let mut current = tx.read(key.as_str()).unwrap();
                    loop {
                        let next = current.as_int().unwrap() + 1;
                        match tx.test_and_set(key.as_str(), current, next) {
                            Ok(()) => break,
                            Err(ClientError::KeyChanged { old_value }) => current = old_value,
                            Err(e) => panic!("unexpected error: {}", e),
                        }
                    }
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(setup.read(key.as_str()).unwrap(), Value::Int(100));
}
