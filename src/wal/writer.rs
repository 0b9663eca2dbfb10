//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;

use super::WalRecord;

/// Appends records to the WAL file.
///
/// The file is created lazily on the first append, so a store that has never
/// accepted a write leaves no log behind. `truncate` deletes the file
/// outright; the absence of a WAL is how startup knows there is nothing to
/// replay.
pub struct WalWriter {
    path: PathBuf,
    file: Option<File>,
    sync_strategy: WalSyncStrategy,
    uncommitted: usize,
}

impl WalWriter {
    /// Open a WAL writer for the given path.
    ///
    /// An existing log is appended to, never rewritten.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            file: None,
            sync_strategy,
            uncommitted: 0,
        })
    }

    /// Append a record and make it durable per the sync strategy.
    ///
    /// The record is written as one line and the file flushed; on
    /// `EveryWrite` the append does not return until the bytes are fsynced.
    /// Any error here surfaces to the caller BEFORE the MemTable is touched,
    /// which is what keeps the durability ordering intact.
    pub fn append(&mut self, record: &WalRecord) -> Result<()> {
        let file = match &mut self.file {
            Some(file) => file,
            slot @ None => slot.insert(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?,
            ),
        };

        let mut line = record.encode();
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()?;

        match self.sync_strategy {
            WalSyncStrategy::EveryWrite => {
                file.sync_all()?;
                self.uncommitted = 0;
            }
            WalSyncStrategy::EveryNEntries { count } => {
                self.uncommitted += 1;
                if self.uncommitted >= count {
                    file.sync_all()?;
                    self.uncommitted = 0;
                }
            }
        }

        Ok(())
    }

    /// Force an fsync of any unsynced appends.
    pub fn sync(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.sync_all()?;
        }
        self.uncommitted = 0;
        Ok(())
    }

    /// Delete the log.
    ///
    /// Only safe immediately after the MemTable's full content has been
    /// durably captured in a flushed table; at any other time this loses
    /// unflushed writes.
    pub fn truncate(&mut self) -> Result<()> {
        self.file = None;
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        self.uncommitted = 0;
        Ok(())
    }

    /// Number of appends not yet covered by an fsync.
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
