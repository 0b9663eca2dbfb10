//! Table Reader
//!
//! Serves bounded block reads from the table file and owns the table's
//! sparse index and bloom filter.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::Result;
use crate::filter::BloomFilter;

use super::builder::TableParts;
use super::index::{BlockHandle, SparseIndex};
use super::parse_line;

/// Reader for the single on-disk table.
///
/// The file handle lives behind a `Mutex` so `get`s can run concurrently at
/// the engine level; only the seek+read of one block is serialized.
pub struct TableReader {
    path: PathBuf,
    file: Mutex<File>,
    file_len: u64,
    index: SparseIndex,
    filter: BloomFilter,
    entry_count: u64,
}

impl TableReader {
    /// Open an existing table, rebuilding the sparse index and bloom filter
    /// with a full scan of the raw file.
    ///
    /// Neither structure is persisted, so this scan is what makes them
    /// survive a restart. Boundaries are re-derived with the same
    /// byte-counting rule the builder uses; corrupt lines are skipped (their
    /// bytes still count toward block offsets, which must match the physical
    /// file).
    pub fn open(path: &Path, block_size_target: usize, fp_rate: f64) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let block_size_target = block_size_target as u64;

        // First pass sizes the filter from the actual entry count.
        let valid_entries = text
            .split_inclusive('\n')
            .filter(|line| parse_line(line.trim_end_matches('\n')).is_ok())
            .count();

        let mut index = SparseIndex::new();
        let mut filter = BloomFilter::new(valid_entries, fp_rate);
        let mut offset = 0u64;
        let mut block_bytes = 0u64;
        let mut entry_count = 0u64;

        for raw in text.split_inclusive('\n') {
            let line_len = raw.len() as u64;
            match parse_line(raw.trim_end_matches('\n')) {
                Ok((key, _value)) => {
                    if index.is_empty() {
                        index.push(key.to_string(), offset);
                    } else if block_bytes > 0 && block_bytes + line_len > block_size_target {
                        index.push(key.to_string(), offset);
                        block_bytes = 0;
                    }
                    filter.insert(key);
                    entry_count += 1;
                }
                Err(e) => {
                    warn!(error = %e, offset, "skipping corrupt table line during index rebuild");
                }
            }
            offset += line_len;
            block_bytes += line_len;
        }

        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            file_len,
            index,
            filter,
            entry_count,
        })
    }

    /// Wrap a table that was just flushed, reusing the index and filter the
    /// builder produced instead of rescanning the file.
    pub fn from_parts(path: &Path, parts: TableParts) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            file_len,
            index: parts.index,
            filter: parts.filter,
            entry_count: parts.entry_count,
        })
    }

    /// Bloom filter check: `false` means the key is definitely not on disk.
    pub fn might_contain(&self, key: &str) -> bool {
        self.filter.might_contain(key)
    }

    /// Find the block that could contain `key`, if any.
    pub fn locate(&self, key: &str) -> Option<BlockHandle> {
        self.index.locate(key)
    }

    /// Read exactly one block's bytes from disk.
    pub fn read_block(&self, handle: BlockHandle) -> Result<Bytes> {
        let len = handle
            .len
            .unwrap_or_else(|| self.file_len.saturating_sub(handle.offset));

        let mut buf = vec![0u8; len as usize];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(handle.offset))?;
            file.read_exact(&mut buf)?;
        }
        Ok(Bytes::from(buf))
    }

    /// Linear-scan a raw block for an exact key match.
    ///
    /// `None` here after a filter "maybe" is a normal false positive, not an
    /// error. Corrupt lines are skipped.
    pub fn find_in_block(block: &[u8], key: &str) -> Option<String> {
        let text = String::from_utf8_lossy(block);
        for line in text.lines() {
            match parse_line(line) {
                Ok((k, v)) if k == key => return Some(v.to_string()),
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "skipping corrupt line in block scan");
                }
            }
        }
        None
    }

    /// Number of entries in the table
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// The table's sparse index
    pub fn index(&self) -> &SparseIndex {
        &self.index
    }

    /// Path of the table file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
