// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Record identity and version types
//!
//! Defines how a record is addressed (table plus key) and the immutable
//! versions that make up its version chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical time issued by the timestamp authority
pub type Timestamp = u64;

/// Opaque record payload
pub type Payload = Vec<u8>;

/// Comparable key value identifying a record within a table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyValue {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(i) => write!(f, "{}", i),
            KeyValue::Text(s) => write!(f, "{}", s),
            KeyValue::Bytes(b) => {
                write!(f, "0x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Int(value.into())
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Text(value)
    }
}

impl From<Vec<u8>> for KeyValue {
    fn from(value: Vec<u8>) -> Self {
        KeyValue::Bytes(value)
    }
}

/// Identifies a record: a table identifier plus a key value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub table_id: String,
    pub key: KeyValue,
}

impl RecordKey {
    pub fn new(table_id: impl Into<String>, key: impl Into<KeyValue>) -> Self {
        Self {
            table_id: table_id.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.key)
    }
}

/// One immutable version of a record
///
/// A version is visible over the half-open interval `[begin_ts, end_ts)`.
/// `end_ts == None` marks the open (current) version; a key has at most one.
/// `payload == None` is a tombstone left by a committed delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub key: RecordKey,
    pub version_key: u64,
    pub payload: Option<Payload>,
    pub begin_ts: Timestamp,
    pub end_ts: Option<Timestamp>,
}

impl VersionEntry {
    /// Create an open version beginning at `begin_ts`
    pub fn open(
        key: RecordKey,
        version_key: u64,
        payload: Option<Payload>,
        begin_ts: Timestamp,
    ) -> Self {
        Self {
            key,
            version_key,
            payload,
            begin_ts,
            end_ts: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_ts.is_none()
    }

    pub fn is_tombstone(&self) -> bool {
        self.payload.is_none()
    }

    /// Whether a snapshot taken at `ts` sees this version
    pub fn is_visible_at(&self, ts: Timestamp) -> bool {
        self.begin_ts <= ts && self.end_ts.map_or(true, |end| ts < end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_equality_covers_table_and_key() {
        assert_eq!(RecordKey::new("person", 1), RecordKey::new("person", 1));
        assert_ne!(RecordKey::new("person", 1), RecordKey::new("edge", 1));
        assert_ne!(RecordKey::new("person", 1), RecordKey::new("person", "1"));
        assert_eq!(RecordKey::new("person", "alice").to_string(), "person:alice");
    }

    #[test]
    fn test_version_visibility_interval_is_half_open() {
        let mut version = VersionEntry::open(RecordKey::new("t", 1), 0, Some(vec![1]), 10);
        assert!(!version.is_visible_at(9));
        assert!(version.is_visible_at(10));
        assert!(version.is_visible_at(1_000));

        version.end_ts = Some(15);
        assert!(version.is_visible_at(14));
        assert!(!version.is_visible_at(15));
        assert!(!version.is_open());
    }

    #[test]
    fn test_bytes_key_display() {
        assert_eq!(KeyValue::Bytes(vec![0xde, 0xad]).to_string(), "0xdead");
    }
}
