//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, table, filter, and block cache
//! - Run the short-circuiting read path
//! - Trigger flushes when the MemTable reaches its entry limit
//! - Manage crash recovery on startup

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SlateError};
use crate::memtable::MemTable;
use crate::storage::{BlockCache, TableBuilder, TableReader};
use crate::wal::{WalRecord, WalRecovery, WalWriter};

/// Startup state, derived from which data files exist.
///
/// A pure function of two booleans so recovery branching is testable without
/// touching a filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    /// No table, no WAL: a fresh store
    Empty,
    /// Unflushed writes only: replay the WAL into the MemTable
    WalOnly,
    /// A clean shutdown after a flush: rebuild the table's index and filter
    TableOnly,
    /// A flush happened and newer writes followed: rebuild the table, then
    /// replay the WAL on top (the WAL is strictly newer than the table)
    TableAndWal,
}

impl RecoveryState {
    pub fn derive(table_exists: bool, wal_exists: bool) -> Self {
        match (table_exists, wal_exists) {
            (false, false) => RecoveryState::Empty,
            (false, true) => RecoveryState::WalOnly,
            (true, false) => RecoveryState::TableOnly,
            (true, true) => RecoveryState::TableAndWal,
        }
    }

    pub fn has_table(self) -> bool {
        matches!(self, RecoveryState::TableOnly | RecoveryState::TableAndWal)
    }

    pub fn has_wal(self) -> bool {
        matches!(self, RecoveryState::WalOnly | RecoveryState::TableAndWal)
    }
}

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/flush): serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Must acquire: write_lock → WAL → memtable → flush check
///
/// - **Reads** (get): concurrent
///   - MemTable uses an internal RwLock (many concurrent readers)
///   - The table reader sits behind an RwLock taken for read; a flush takes
///     it for write to swap in the new table
///   - Block reads serialize only on the file handle and the cache lock
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Path of the write-ahead log
    wal_path: PathBuf,

    /// Path of the single on-disk table
    table_path: PathBuf,

    /// Write-ahead log for durability (exclusive access)
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Reader over the current on-disk table, `None` until the first flush
    table: RwLock<Option<TableReader>>,

    /// Raw-block cache for the read path
    cache: Mutex<BlockCache>,

    /// Serializes write operations (put/flush)
    write_lock: Mutex<()>,

    /// Count of filter-maybe lookups the sparse index could not place.
    /// Always absent-key territory, but worth watching: it means the filter
    /// and index disagree about what the table covers.
    missing_index_anomalies: AtomicU64,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const TABLE_FILENAME: &'static str = "table.sst";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if needed
    /// 2. Derive the recovery state from which files exist
    /// 3. If a table exists, rebuild its sparse index and bloom filter
    /// 4. If a WAL exists, replay it into the MemTable
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let wal_path = config.data_dir.join(Self::WAL_FILENAME);
        let table_path = config.data_dir.join(Self::TABLE_FILENAME);

        let state = RecoveryState::derive(table_path.exists(), wal_path.exists());
        debug!(?state, "derived startup state");

        // Table first: its contents are strictly older than anything in the WAL.
        let table = if state.has_table() {
            let reader =
                TableReader::open(&table_path, config.block_size_target, config.filter_fp_rate)?;
            info!(
                entries = reader.entry_count(),
                blocks = reader.index().len(),
                "rebuilt table index and filter"
            );
            Some(reader)
        } else {
            None
        };

        // WAL replay goes to memory only — no re-appending, and no eager
        // flush: flushing just the replayed entries would overwrite the table
        // with only the WAL's keys. They stay in the MemTable, WAL intact,
        // until a normal flush.
        let memtable = MemTable::new();
        if state.has_wal() {
            let (records, result) = WalRecovery::recover(&wal_path)?;
            if result.records_recovered > 0 || result.records_corrupted > 0 {
                info!(
                    recovered = result.records_recovered,
                    corrupted = result.records_corrupted,
                    "WAL replay complete"
                );
            }
            for record in records {
                memtable.put(record.key, record.value);
            }
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;

        Ok(Self {
            config,
            wal_path,
            table_path,
            wal: Mutex::new(wal),
            memtable,
            table: RwLock::new(table),
            cache: Mutex::new(BlockCache::new()),
            write_lock: Mutex::new(()),
            missing_index_anomalies: AtomicU64::new(0),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses the default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Validate the entry against the line format
    /// 2. Acquire the write lock
    /// 3. Append to the WAL (durability — a failure here aborts the put
    ///    before the MemTable is touched)
    /// 4. Insert into the MemTable
    /// 5. Flush if the entry limit is reached
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        validate_entry(key, value)?;

        let _write_guard = self.write_lock.lock();

        self.wal.lock().append(&WalRecord::new(key, value))?;

        let len = self.memtable.put(key.to_string(), value.to_string());

        if len >= self.config.memtable_limit {
            self.flush_internal()?;
        }

        Ok(())
    }

    /// Get a value by key
    ///
    /// Strict short-circuit order, stopping at the first conclusive answer:
    /// 1. MemTable — freshest data always wins
    /// 2. No table on disk → absent
    /// 3. Bloom filter says "definitely not" → absent, zero disk I/O
    /// 4. Sparse index has no candidate block → absent (anomaly-counted)
    /// 5. Block cache hit → scan the cached block
    /// 6. Disk read of exactly one block, cache fill, scan
    ///
    /// An absent result after a filter "maybe" is a normal false positive.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.memtable.get(key) {
            return Ok(Some(value));
        }

        let table = self.table.read();
        let Some(reader) = table.as_ref() else {
            return Ok(None);
        };

        if !reader.might_contain(key) {
            return Ok(None);
        }

        let Some(handle) = reader.locate(key) else {
            self.missing_index_anomalies.fetch_add(1, Ordering::Relaxed);
            warn!(key, "filter reported maybe but no block covers the key");
            return Ok(None);
        };

        let block = {
            let mut cache = self.cache.lock();
            match cache.get(handle.offset) {
                Some(block) => block,
                None => {
                    let block = reader.read_block(handle)?;
                    cache.insert(handle.offset, block.clone());
                    block
                }
            }
        };

        Ok(TableReader::find_in_block(&block, key))
    }

    /// Flush the MemTable to disk (public API)
    ///
    /// Forces a flush regardless of MemTable size. Flushing an empty
    /// MemTable is a no-op.
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.flush_internal()
    }

    /// Internal flush implementation (called with the write lock held)
    ///
    /// Ordering is mandatory: the new table must be durably on disk before
    /// the MemTable is cleared, and the WAL is truncated only after both.
    fn flush_internal(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        let entries = self.memtable.snapshot_sorted();
        debug!(entries = entries.len(), "flushing memtable to table");

        let mut builder = TableBuilder::new(
            &self.table_path,
            entries.len(),
            self.config.filter_fp_rate,
            self.config.block_size_target,
        )?;
        for (key, value) in &entries {
            builder.add(key, value)?;
        }
        let parts = builder.finish()?;

        let reader = TableReader::from_parts(&self.table_path, parts)?;
        *self.table.write() = Some(reader);

        // Every cached offset points into the replaced file.
        self.cache.lock().clear();

        self.memtable.clear();

        // Safe only now: the table holds everything the log recorded.
        self.wal.lock().truncate()?;

        Ok(())
    }

    /// Close the engine gracefully, flushing any pending writes
    pub fn close(self) -> Result<()> {
        if !self.memtable.is_empty() {
            self.flush()?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Path of the WAL file
    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// Path of the table file
    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    /// Current MemTable entry count
    pub fn memtable_len(&self) -> usize {
        self.memtable.len()
    }

    /// Entry count of the on-disk table, if one exists
    pub fn table_entry_count(&self) -> Option<u64> {
        self.table.read().as_ref().map(|t| t.entry_count())
    }

    /// Lifetime block cache (hits, misses)
    pub fn cache_stats(&self) -> (u64, u64) {
        self.cache.lock().stats()
    }

    /// Filter-maybe lookups the sparse index could not place
    pub fn missing_index_anomalies(&self) -> u64 {
        self.missing_index_anomalies.load(Ordering::Relaxed)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Reject entries the line format cannot represent.
///
/// Keys: non-empty, no delimiter, no line breaks. Values: no line breaks
/// (commas are fine — the value is always a line's final field).
fn validate_entry(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SlateError::InvalidEntry("key must not be empty".to_string()));
    }
    if key.contains(',') {
        return Err(SlateError::InvalidEntry(format!(
            "key may not contain the ',' delimiter: {key:?}"
        )));
    }
    if key.contains('\n') || key.contains('\r') {
        return Err(SlateError::InvalidEntry(format!(
            "key may not contain line breaks: {key:?}"
        )));
    }
    if value.contains('\n') || value.contains('\r') {
        return Err(SlateError::InvalidEntry(
            "value may not contain line breaks".to_string(),
        ));
    }
    Ok(())
}
