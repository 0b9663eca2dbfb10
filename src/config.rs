//! Configuration for SlateKV
//!
//! Centralized configuration with sensible defaults. One `Config` per engine
//! instance; nothing is read from globals, so independent engines can coexist
//! in one process (and in tests).

use std::path::PathBuf;

/// Main configuration for a SlateKV engine instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── table.sst        (the single sorted table)
    pub data_dir: PathBuf,

    /// Target size of one table block, in bytes. A block closes once the next
    /// entry would push it past this target; a single entry larger than the
    /// target gets a block of its own.
    pub block_size_target: usize,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Entry count at which the MemTable is flushed to disk
    pub memtable_limit: usize,

    // -------------------------------------------------------------------------
    // Filter Configuration
    // -------------------------------------------------------------------------
    /// Target false-positive rate for the per-table bloom filter
    pub filter_fp_rate: f64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest). With this strategy an
    /// acknowledged `put` is recoverable after a crash.
    EveryWrite,

    /// fsync after N unsynced appends (faster, weakens durability to the
    /// chosen window)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./slatekv_data"),
            block_size_target: 4096,
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            memtable_limit: 1024,
            filter_fp_rate: 0.01,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the table block size target (in bytes)
    pub fn block_size_target(mut self, bytes: usize) -> Self {
        self.config.block_size_target = bytes;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the MemTable flush threshold (in entries)
    pub fn memtable_limit(mut self, entries: usize) -> Self {
        self.config.memtable_limit = entries;
        self
    }

    /// Set the bloom filter false-positive rate
    pub fn filter_fp_rate(mut self, rate: f64) -> Self {
        self.config.filter_fp_rate = rate;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
