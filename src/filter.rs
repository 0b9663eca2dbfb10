//! Bloom filter for negative-lookup elimination.
//!
//! The table carries a bloom filter of every key it contains. A point lookup
//! checks the filter before touching the sparse index or the disk — if the key
//! is definitely not in the table, the read resolves with zero I/O.
//!
//! The filter has no removal operation, so it is rebuilt from scratch on every
//! flush over exactly the keys being persisted.

/// A bloom filter using double hashing over two seeded FNV-1a passes.
///
/// `might_contain` can return false positives but never false negatives:
/// `false` means the key was definitely never inserted.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: usize,
    num_hashes: u32,
}

// FNV-1a 32-bit constants. The hash must be stable across processes (a
// restart rebuilds the filter and must probe the same bits), which rules out
// the randomized std hasher.
const FNV_PRIME: u32 = 16_777_619;
const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_ALT_BASIS: u32 = 123_456_789;

impl BloomFilter {
    /// Create a filter sized for `expected_keys` at the given false-positive
    /// rate (e.g. 0.01 = 1%).
    ///
    /// Optimal sizing: `m = -n·ln(p) / (ln 2)²` bits and `k = (m/n)·ln 2`
    /// probes.
    pub fn new(expected_keys: usize, fp_rate: f64) -> Self {
        let expected_keys = expected_keys.max(1);
        let fp_rate = fp_rate.clamp(1e-10, 0.999);

        let num_bits = (-(expected_keys as f64) * fp_rate.ln() / (2.0_f64.ln().powi(2)))
            .ceil() as usize;
        let num_bits = num_bits.max(64);

        let num_hashes = ((num_bits as f64 / expected_keys as f64) * 2.0_f64.ln())
            .ceil() as u32;
        let num_hashes = num_hashes.clamp(1, 30);

        Self::with_bits(num_bits, num_hashes)
    }

    /// Create a filter with an explicitly chosen bit-array length and probe
    /// count, for callers that size the filter themselves.
    pub fn with_bits(num_bits: usize, num_hashes: u32) -> Self {
        let num_bits = num_bits.max(1);
        let num_hashes = num_hashes.max(1);
        let words = num_bits.div_ceil(64);
        Self {
            bits: vec![0u64; words],
            num_bits,
            num_hashes,
        }
    }

    /// Insert a key into the filter.
    pub fn insert(&mut self, key: &str) {
        let (h1, h2) = hash_pair(key);
        for i in 0..self.num_hashes {
            let idx = self.bit_index(h1, h2, i);
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }
    }

    /// Check whether a key might be in the set.
    ///
    /// Returns `false` the instant any probed bit is unset (definite absence);
    /// `true` only if every probe hits a set bit (possible presence).
    pub fn might_contain(&self, key: &str) -> bool {
        let (h1, h2) = hash_pair(key);
        for i in 0..self.num_hashes {
            let idx = self.bit_index(h1, h2, i);
            if self.bits[idx / 64] & (1u64 << (idx % 64)) == 0 {
                return false;
            }
        }
        true
    }

    /// Number of bits in the filter.
    pub fn size_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of probe positions per key.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    // Double hashing: position_i = (h1 + i·h2) mod m
    fn bit_index(&self, h1: u32, h2: u32, i: u32) -> usize {
        let combined = (h1 as u64).wrapping_add((i as u64).wrapping_mul(h2 as u64));
        (combined % self.num_bits as u64) as usize
    }
}

/// Two independent 32-bit hashes of the key's UTF-8 bytes: the same FNV-1a
/// walk from two different offset bases.
fn hash_pair(key: &str) -> (u32, u32) {
    (
        fnv1a(key.as_bytes(), FNV_OFFSET_BASIS),
        fnv1a(key.as_bytes(), FNV_ALT_BASIS),
    )
}

fn fnv1a(bytes: &[u8], basis: u32) -> u32 {
    let mut hash = basis;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
