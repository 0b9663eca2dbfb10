//! WAL Recovery
//!
//! Replays the log after a crash: every valid record in order, corrupt lines
//! skipped and counted, I/O failures surfaced.

use std::path::Path;

use tracing::warn;

use crate::error::{Result, SlateError};

use super::{WalReader, WalRecord};

/// Handles WAL replay at startup.
pub struct WalRecovery;

/// Result of a recovery pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoveryResult {
    /// Number of records successfully recovered
    pub records_recovered: u64,

    /// Number of corrupt lines skipped
    pub records_corrupted: u64,
}

impl WalRecovery {
    /// Read all valid records from a WAL file, in append order.
    ///
    /// Corrupt lines are skipped and counted — a damaged record must not take
    /// the rest of the log down with it. Only real I/O errors abort.
    pub fn recover(path: &Path) -> Result<(Vec<WalRecord>, RecoveryResult)> {
        let reader = WalReader::open(path)?;

        let mut records = Vec::new();
        let mut result = RecoveryResult::default();

        for item in reader.records() {
            match item {
                Ok(record) => {
                    records.push(record);
                    result.records_recovered += 1;
                }
                Err(SlateError::Corrupt(reason)) => {
                    result.records_corrupted += 1;
                    warn!(%reason, "skipping corrupt WAL record");
                }
                Err(e) => return Err(e),
            }
        }

        Ok((records, result))
    }
}
