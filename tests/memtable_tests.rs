//! Tests for the MemTable
//!
//! These tests verify:
//! - Insert, overwrite, and lookup
//! - Entry counting for the flush trigger
//! - Sorted snapshots
//! - Clearing after a flush

use slatekv::memtable::MemTable;

#[test]
fn test_put_and_get() {
    let table = MemTable::new();

    table.put("user1".to_string(), "Alice".to_string());
    table.put("user2".to_string(), "Bob".to_string());

    assert_eq!(table.get("user1"), Some("Alice".to_string()));
    assert_eq!(table.get("user2"), Some("Bob".to_string()));
    assert_eq!(table.get("user3"), None);
}

#[test]
fn test_put_returns_entry_count() {
    let table = MemTable::new();

    assert_eq!(table.put("a".to_string(), "1".to_string()), 1);
    assert_eq!(table.put("b".to_string(), "2".to_string()), 2);

    // Overwriting does not grow the table
    assert_eq!(table.put("a".to_string(), "3".to_string()), 2);
    assert_eq!(table.get("a"), Some("3".to_string()));
}

#[test]
fn test_last_write_wins() {
    let table = MemTable::new();

    for i in 0..10 {
        table.put("key".to_string(), format!("v{i}"));
    }

    assert_eq!(table.len(), 1);
    assert_eq!(table.get("key"), Some("v9".to_string()));
}

#[test]
fn test_snapshot_is_sorted() {
    let table = MemTable::new();

    // Inserted out of order on purpose
    for key in ["pear", "apple", "mango", "banana", "cherry"] {
        table.put(key.to_string(), format!("{key}-v"));
    }

    let snapshot = table.snapshot_sorted();
    let keys: Vec<&str> = snapshot.iter().map(|(k, _)| k.as_str()).collect();

    assert_eq!(keys, vec!["apple", "banana", "cherry", "mango", "pear"]);
    for window in keys.windows(2) {
        assert!(window[0] < window[1]);
    }
}

#[test]
fn test_clear_empties_table() {
    let table = MemTable::new();

    table.put("k".to_string(), "v".to_string());
    assert!(!table.is_empty());

    table.clear();

    assert!(table.is_empty());
    assert_eq!(table.len(), 0);
    assert_eq!(table.get("k"), None);
    assert!(table.snapshot_sorted().is_empty());
}
