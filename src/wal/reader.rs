//! WAL Reader
//!
//! Reads records back from the WAL file, line by line.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::error::{Result, SlateError};

use super::WalRecord;

/// Reads records from a WAL file in append order.
pub struct WalReader {
    reader: BufReader<File>,
}

impl WalReader {
    /// Open a WAL file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
        })
    }

    /// Iterate over the log's records.
    ///
    /// Each malformed line yields `Err(SlateError::Corrupt)` and iteration
    /// continues with the next line, so the caller decides the skip policy.
    pub fn records(self) -> WalRecords {
        WalRecords {
            lines: self.reader.lines(),
        }
    }
}

/// Iterator over WAL records, one item per log line.
pub struct WalRecords {
    lines: Lines<BufReader<File>>,
}

impl Iterator for WalRecords {
    type Item = Result<WalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    // Blank lines carry no record; don't report them as
                    // corruption.
                    if line.is_empty() {
                        continue;
                    }
                    return Some(WalRecord::decode(&line));
                }
                Err(e) => return Some(Err(SlateError::Io(e))),
            }
        }
    }
}
