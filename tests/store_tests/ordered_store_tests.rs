//! OrderedStore Tests
//!
//! Tests verify:
//! - Basic add/get/delete operations
//! - First-insertion order preserved across overwrites and deletes
//! - Idempotent re-adds
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use queuekv::store::{AddResult, OrderedStore};

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = OrderedStore::new();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert!(store.snapshot().is_empty());
}

#[test]
fn test_add_and_get() {
    let store = OrderedStore::new();

    let result = store.add("key1", "value1");

    assert_eq!(
        result,
        AddResult {
            inserted: true,
            previous: None
        }
    );
    assert_eq!(store.get("key1"), Some("value1".to_string()));
    assert!(store.contains_key("key1"));
}

#[test]
fn test_get_nonexistent_key() {
    let store = OrderedStore::new();
    assert_eq!(store.get("nonexistent"), None);
}

#[test]
fn test_add_overwrites_existing() {
    let store = OrderedStore::new();

    store.add("key1", "value1");
    let result = store.add("key1", "value2");

    assert!(!result.inserted);
    assert_eq!(result.previous, Some("value1".to_string()));
    assert_eq!(store.get("key1"), Some("value2".to_string()));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_delete_existing_key() {
    let store = OrderedStore::new();

    store.add("key1", "value1");

    assert!(store.delete("key1"));
    assert_eq!(store.get("key1"), None);
    assert!(store.is_empty());
}

#[test]
fn test_delete_twice() {
    let store = OrderedStore::new();
    store.add("key1", "value1");
    store.add("key2", "value2");

    assert!(store.delete("key1"));
    assert!(!store.delete("key1"));

    assert_eq!(store.snapshot(), pairs(&[("key2", "value2")]));
}

#[test]
fn test_delete_nonexistent_key() {
    let store = OrderedStore::new();
    assert!(!store.delete("nothing"));
    assert!(store.is_empty());
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_snapshot_in_insertion_order() {
    let store = OrderedStore::new();

    store.add("zebra", "1");
    store.add("apple", "2");
    store.add("mango", "3");

    assert_eq!(
        store.snapshot(),
        pairs(&[("zebra", "1"), ("apple", "2"), ("mango", "3")])
    );
}

#[test]
fn test_overwrite_keeps_position() {
    let store = OrderedStore::new();

    store.add("a", "1");
    store.add("b", "2");
    store.add("a", "3");

    assert_eq!(store.snapshot(), pairs(&[("a", "3"), ("b", "2")]));
}

#[test]
fn test_readd_after_delete_moves_to_end() {
    let store = OrderedStore::new();

    store.add("a", "1");
    store.add("b", "2");
    store.delete("a");
    store.add("a", "9");

    assert_eq!(store.snapshot(), pairs(&[("b", "2"), ("a", "9")]));
}

#[test]
fn test_add_is_idempotent() {
    let once = OrderedStore::new();
    once.add("k", "v");
    once.add("other", "x");

    let twice = OrderedStore::new();
    twice.add("k", "v");
    twice.add("k", "v");
    twice.add("other", "x");

    assert_eq!(once.snapshot(), twice.snapshot());
}

#[test]
fn test_sequential_mixed_operations_match_model() {
    let store = OrderedStore::new();
    let mut model: Vec<(String, String)> = Vec::new();

    // Deterministic pseudo-random sequence over a small key space
    let mut seed: u32 = 7;
    for step in 0..500 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let key = format!("k{}", (seed >> 16) % 12);

        if (seed >> 8) % 3 == 0 {
            store.delete(&key);
            model.retain(|(k, _)| *k != key);
        } else {
            let value = format!("v{}", step);
            store.add(&key, &value);
            match model.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => model.push((key, value)),
            }
        }

        assert_eq!(store.snapshot(), model);
    }
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_adds_distinct_keys() {
    let store = Arc::new(OrderedStore::new());
    let mut handles = vec![];

    for t in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                store.add(&format!("t{}k{}", t, i), &format!("v{}", i));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 200);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 200);

    // Each thread's keys keep their relative order
    for t in 0..4 {
        let prefix = format!("t{}k", t);
        let indices: Vec<usize> = snapshot
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k[prefix.len()..].parse().unwrap())
            .collect();
        assert_eq!(indices, (0..50).collect::<Vec<_>>());
    }
}

#[test]
fn test_concurrent_adds_same_key() {
    let store = Arc::new(OrderedStore::new());

    let handles: Vec<_> = ["first", "second"]
        .into_iter()
        .map(|value| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store.add("shared", value);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].0, "shared");
    assert!(snapshot[0].1 == "first" || snapshot[0].1 == "second");
}

#[test]
fn test_snapshot_never_torn() {
    let store = Arc::new(OrderedStore::new());
    store.add("a", "0");
    store.add("b", "0");

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 1..=1000 {
                store.delete("a");
                store.add("a", &i.to_string());
            }
        })
    };

    for _ in 0..1000 {
        let snapshot = store.snapshot();
        let keys: Vec<&str> = snapshot.iter().map(|(k, _)| k.as_str()).collect();
        // Either "a" is momentarily absent, or present exactly once
        assert!(keys == ["b"] || keys == ["a", "b"] || keys == ["b", "a"]);
    }

    writer.join().unwrap();
    assert_eq!(store.snapshot(), pairs(&[("b", "0"), ("a", "1000")]));
}
