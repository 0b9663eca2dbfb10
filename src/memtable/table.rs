//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;

use parking_lot::RwLock;

/// In-memory table for recent writes.
///
/// Keys are unique; the last write for a key wins. All methods take `&self` —
/// the lock lives inside so readers never block each other.
pub struct MemTable {
    data: RwLock<BTreeMap<String, String>>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    /// Insert or overwrite a key (write lock).
    ///
    /// Returns the entry count after the insert so the caller can apply its
    /// flush threshold without a second lock round-trip.
    pub fn put(&self, key: String, value: String) -> usize {
        let mut data = self.data.write();
        data.insert(key, value);
        data.len()
    }

    /// Materialize all entries in ascending key order (used during flush).
    ///
    /// The read lock is held for the whole copy, so the snapshot reflects a
    /// single point in time.
    pub fn snapshot_sorted(&self) -> Vec<(String, String)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Remove all entries (after a successful flush)
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// Current entry count
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
