//! Error types for SlateKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SlateError
pub type Result<T> = std::result::Result<T, SlateError>;

/// Unified error type for SlateKV operations
#[derive(Debug, Error)]
pub enum SlateError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Data Format Errors
    // -------------------------------------------------------------------------
    /// A malformed WAL or table line. Recovery and table scans skip these and
    /// keep going; they never abort the whole pass.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// A key or value that the line format cannot represent, rejected at `put`.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("storage error: {0}")]
    Storage(String),
}
