//! WAL record definitions
//!
//! A record owns its line-format encoding and decoding.

use crate::error::{Result, SlateError};

/// Operation tag for accepted writes. The log has exactly one verb.
const SET_TAG: &str = "SET";

/// A single record in the WAL: one accepted write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    pub key: String,
    pub value: String,
}

impl WalRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encode as a log line (without the trailing newline).
    pub fn encode(&self) -> String {
        format!("{SET_TAG},{},{}", self.key, self.value)
    }

    /// Decode one log line.
    ///
    /// The value is the final field, so it is split off with `splitn` and may
    /// itself contain commas.
    pub fn decode(line: &str) -> Result<Self> {
        let mut parts = line.splitn(3, ',');

        match parts.next() {
            Some(SET_TAG) => {}
            Some(other) => {
                return Err(SlateError::Corrupt(format!(
                    "unknown WAL operation {other:?}"
                )))
            }
            None => return Err(SlateError::Corrupt("empty WAL line".to_string())),
        }

        let key = parts
            .next()
            .ok_or_else(|| SlateError::Corrupt("WAL line missing key".to_string()))?;
        if key.is_empty() {
            return Err(SlateError::Corrupt("WAL line with empty key".to_string()));
        }

        let value = parts
            .next()
            .ok_or_else(|| SlateError::Corrupt("WAL line missing value".to_string()))?;

        Ok(Self::new(key, value))
    }
}
