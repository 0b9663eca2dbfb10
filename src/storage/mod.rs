//! Storage Module
//!
//! The persistent layer: a single immutable sorted table on disk, rewritten
//! wholesale on every flush.
//!
//! ## Responsibilities
//! - Persist the MemTable's sorted snapshot in blocked form
//! - Build the sparse block index and bloom filter during the flush scan
//! - Rebuild both from the raw file on startup
//! - Serve bounded block reads for the read path
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ <key>,<value>\n                              │
//! │ <key>,<value>\n     ─┐                       │
//! │ ...                  │ block ≈ target bytes  │
//! │ <key>,<value>\n     ─┘                       │
//! │ ...                                          │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Keys ascend across the whole file. Blocks have no in-file markers: a block
//! boundary exists only as a `(start_key, offset)` pair in the in-memory
//! sparse index, which is rebuilt by scanning the file on open.

mod index;
mod builder;
mod reader;
mod cache;

pub use index::{BlockHandle, IndexEntry, SparseIndex};
pub use builder::{TableBuilder, TableParts};
pub use reader::TableReader;
pub use cache::BlockCache;

use crate::error::{Result, SlateError};

/// Encode one table entry as a line, trailing newline included.
pub(crate) fn encode_line(key: &str, value: &str) -> String {
    format!("{key},{value}\n")
}

/// Parse one table line into `(key, value)`.
///
/// The value is the final field and may contain commas.
pub(crate) fn parse_line(line: &str) -> Result<(&str, &str)> {
    let (key, value) = line
        .split_once(',')
        .ok_or_else(|| SlateError::Corrupt(format!("table line without delimiter: {line:?}")))?;
    if key.is_empty() {
        return Err(SlateError::Corrupt("table line with empty key".to_string()));
    }
    Ok((key, value))
}
