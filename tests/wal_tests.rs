//! Tests for the write-ahead log
//!
//! These tests verify:
//! - Append and ordered replay
//! - Lazy file creation and truncate-as-delete semantics
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Corrupt-line skip-and-continue during recovery
//! - Replay never re-appends to the log

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use slatekv::config::WalSyncStrategy;
use slatekv::wal::{WalRecord, WalRecovery, WalWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

/// Surface `warn!` output from recovery when running with RUST_LOG set.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn append_all(path: &PathBuf, records: &[(&str, &str)]) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    for (key, value) in records {
        writer.append(&WalRecord::new(*key, *value)).unwrap();
    }
}

// =============================================================================
// Append + Replay Tests
// =============================================================================

#[test]
fn test_append_then_replay_in_order() {
    let (_temp, wal_path) = setup_temp_wal();

    append_all(
        &wal_path,
        &[("user1", "Alice"), ("user2", "Bob"), ("user1", "Carol")],
    );

    let (records, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(result.records_recovered, 3);
    assert_eq!(result.records_corrupted, 0);
    assert_eq!(records[0], WalRecord::new("user1", "Alice"));
    assert_eq!(records[1], WalRecord::new("user2", "Bob"));
    assert_eq!(records[2], WalRecord::new("user1", "Carol"));
}

#[test]
fn test_replay_does_not_reappend() {
    let (_temp, wal_path) = setup_temp_wal();

    append_all(&wal_path, &[("k1", "v1"), ("k2", "v2")]);
    let len_before = std::fs::metadata(&wal_path).unwrap().len();

    let (records, _) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(records.len(), 2);

    // Recovery is read-only: the log must be byte-for-byte unchanged.
    let len_after = std::fs::metadata(&wal_path).unwrap().len();
    assert_eq!(len_before, len_after);
}

#[test]
fn test_value_with_commas_survives_roundtrip() {
    let (_temp, wal_path) = setup_temp_wal();

    append_all(&wal_path, &[("csv", "a,b,c"), ("trailing", "x,")]);

    let (records, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(result.records_corrupted, 0);
    assert_eq!(records[0].value, "a,b,c");
    assert_eq!(records[1].value, "x,");
}

// =============================================================================
// File Lifecycle Tests
// =============================================================================

#[test]
fn test_file_created_lazily_on_first_append() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert!(!wal_path.exists());

    writer.append(&WalRecord::new("k", "v")).unwrap();
    assert!(wal_path.exists());
}

#[test]
fn test_truncate_deletes_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(&WalRecord::new("k1", "v1")).unwrap();
    writer.append(&WalRecord::new("k2", "v2")).unwrap();
    assert!(wal_path.exists());

    writer.truncate().unwrap();
    assert!(!wal_path.exists());
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_truncate_then_append_starts_fresh() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(&WalRecord::new("old", "data")).unwrap();
    writer.truncate().unwrap();
    writer.append(&WalRecord::new("new", "data")).unwrap();

    let (records, _) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(records, vec![WalRecord::new("new", "data")]);
}

#[test]
fn test_open_appends_to_existing_log() {
    let (_temp, wal_path) = setup_temp_wal();

    append_all(&wal_path, &[("k1", "v1")]);
    append_all(&wal_path, &[("k2", "v2")]);

    let (records, _) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key, "k1");
    assert_eq!(records[1].key, "k2");
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_sync_every_write() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    writer.append(&WalRecord::new("k1", "v1")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    writer.append(&WalRecord::new("k2", "v2")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 5 }).unwrap();

    for i in 0..4 {
        writer
            .append(&WalRecord::new(format!("k{i}"), "v"))
            .unwrap();
    }
    assert_eq!(writer.uncommitted_count(), 4);

    // 5th append crosses the threshold and syncs
    writer.append(&WalRecord::new("k5", "v")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    writer.append(&WalRecord::new("k6", "v")).unwrap();
    assert_eq!(writer.uncommitted_count(), 1);
}

#[test]
fn test_manual_sync_resets_counter() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 100 }).unwrap();

    for i in 0..10 {
        writer
            .append(&WalRecord::new(format!("k{i}"), "v"))
            .unwrap();
    }
    assert_eq!(writer.uncommitted_count(), 10);

    writer.sync().unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

// =============================================================================
// Corruption Handling Tests
// =============================================================================

#[test]
fn test_corrupt_lines_skipped_and_counted() {
    init_tracing();
    let (_temp, wal_path) = setup_temp_wal();

    append_all(&wal_path, &[("k1", "v1")]);

    // Damage the log by hand: a bad verb, a truncated record, an empty key.
    {
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(b"BOGUS,k,v\n").unwrap();
        file.write_all(b"SET-only-one-field\n").unwrap();
        file.write_all(b"SET,,novalue-key-empty\n").unwrap();
    }

    append_all(&wal_path, &[("k2", "v2")]);

    let (records, result) = WalRecovery::recover(&wal_path).unwrap();

    // The damage never takes healthy neighbours down with it.
    assert_eq!(result.records_recovered, 2);
    assert_eq!(result.records_corrupted, 3);
    assert_eq!(records[0], WalRecord::new("k1", "v1"));
    assert_eq!(records[1], WalRecord::new("k2", "v2"));
}

#[test]
fn test_record_decode_rejects_malformed_lines() {
    assert!(WalRecord::decode("SET,k,v").is_ok());
    assert!(WalRecord::decode("SET,k,").is_ok()); // empty value is a value
    assert!(WalRecord::decode("SET,k,a,b,c").is_ok()); // commas in value

    assert!(WalRecord::decode("GET,k,v").is_err());
    assert!(WalRecord::decode("SET").is_err());
    assert!(WalRecord::decode("SET,k").is_err());
    assert!(WalRecord::decode("SET,,v").is_err());
}
