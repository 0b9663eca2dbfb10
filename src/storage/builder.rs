//! Table Builder
//!
//! Writes a sorted snapshot to a new table file, building the sparse index
//! and bloom filter along the way.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SlateError};
use crate::filter::BloomFilter;

use super::index::SparseIndex;
use super::encode_line;

/// In-memory artifacts of a finished flush: everything the read path needs
/// besides the file itself.
pub struct TableParts {
    pub index: SparseIndex,
    pub filter: BloomFilter,
    pub entry_count: u64,
}

/// Builder for creating a new table from sorted entries.
///
/// The write is crash-safe: entries go to a temporary file which is fsynced
/// and then atomically renamed over the live table, so a crash mid-flush
/// leaves the previous table intact.
pub struct TableBuilder {
    path: PathBuf,
    tmp_path: PathBuf,
    writer: BufWriter<File>,
    index: SparseIndex,
    filter: BloomFilter,
    /// Byte offset of the next line in the file
    offset: u64,
    /// Bytes accumulated in the current block
    block_bytes: u64,
    entry_count: u64,
    block_size_target: u64,
    last_key: Option<String>,
}

impl TableBuilder {
    /// Create a builder targeting `path`.
    ///
    /// `entry_hint` sizes the bloom filter; at flush time the exact entry
    /// count is known, so the hint is exact in practice.
    pub fn new(
        path: &Path,
        entry_hint: usize,
        fp_rate: f64,
        block_size_target: usize,
    ) -> Result<Self> {
        let tmp_path = path.with_extension("sst.tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        Ok(Self {
            path: path.to_path_buf(),
            tmp_path,
            writer: BufWriter::new(file),
            index: SparseIndex::new(),
            filter: BloomFilter::new(entry_hint, fp_rate),
            offset: 0,
            block_bytes: 0,
            entry_count: 0,
            block_size_target: block_size_target as u64,
            last_key: None,
        })
    }

    /// Add an entry (must be called in ascending key order).
    ///
    /// Block-boundary rule: if this entry would push the current non-empty
    /// block past the size target, the block is closed first — this entry's
    /// key and file offset open a new index entry — and the entry is then
    /// written, counted against the new block. The very first entry always
    /// opens the index at offset 0.
    pub fn add(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(last) = &self.last_key {
            if key <= last.as_str() {
                return Err(SlateError::Storage(format!(
                    "entries must be added in ascending key order ({key:?} after {last:?})"
                )));
            }
        }

        let line = encode_line(key, value);
        let line_len = line.len() as u64;

        if self.entry_count == 0 {
            self.index.push(key.to_string(), 0);
        } else if self.block_bytes > 0 && self.block_bytes + line_len > self.block_size_target {
            self.index.push(key.to_string(), self.offset);
            self.block_bytes = 0;
        }

        self.writer.write_all(line.as_bytes())?;
        self.filter.insert(key);

        self.offset += line_len;
        self.block_bytes += line_len;
        self.entry_count += 1;
        self.last_key = Some(key.to_string());

        Ok(())
    }

    /// Finish the table: flush, fsync, atomically rename into place, and
    /// hand back the index and filter built during the scan.
    pub fn finish(self) -> Result<TableParts> {
        let file = self
            .writer
            .into_inner()
            .map_err(|e| SlateError::Storage(format!("failed to flush table: {e}")))?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.tmp_path, &self.path)?;

        Ok(TableParts {
            index: self.index,
            filter: self.filter,
            entry_count: self.entry_count,
        })
    }

    /// Entries added so far
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }
}
