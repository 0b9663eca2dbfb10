//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track entry count for flush triggers
//! - Ordered snapshot for table creation
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock:
//! - Ordered keys (required for the sorted-table flush)
//! - Many concurrent readers, one writer at a time
//! - Simple and correct first, optimize later

mod table;

pub use table::MemTable;
