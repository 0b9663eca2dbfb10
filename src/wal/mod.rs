//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append a record before the corresponding MemTable mutation
//! - Replay records in append order on startup
//! - Skip (and count) corrupt lines during recovery
//! - Delete the log after a successful flush
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────┐
//! │ SET,<key>,<value>\n         │
//! │ SET,<key>,<value>\n         │
//! │ ...                         │
//! └─────────────────────────────┘
//! ```
//!
//! One line per accepted write, fields comma-separated. Keys may not contain
//! the delimiter; values may (the value is always the final field, so parsing
//! splits at most twice). The engine enforces this at `put`.

mod record;
mod writer;
mod reader;
mod recovery;

pub use record::WalRecord;
pub use writer::WalWriter;
pub use reader::{WalReader, WalRecords};
pub use recovery::{RecoveryResult, WalRecovery};
