// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-transaction scan and write sets
//!
//! The scan set remembers what a transaction observed so commit can check it
//! is still true. The write set buffers pending payloads; nothing in it is
//! visible to other transactions until it is installed at commit.

use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap};

use crate::storage::{Payload, RecordKey, Timestamp};

/// One observed read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanSetEntry {
    pub key: RecordKey,
    /// Snapshot the read was served from; the owning transaction's begin timestamp
    pub read_timestamp: Timestamp,
    /// Whether a live (non-tombstone) version was visible
    pub observed_visible: bool,
}

/// Reads recorded by one transaction, one entry per key
#[derive(Debug, Clone, Default)]
pub struct ScanSet {
    entries: HashMap<RecordKey, ScanSetEntry>,
}

impl ScanSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read; the first observation of a key is kept
    ///
    /// Every read in one transaction is served from the same snapshot, so a
    /// repeated read of the key cannot observe anything different.
    pub fn record(&mut self, key: RecordKey, read_timestamp: Timestamp, observed_visible: bool) {
        self.entries
            .entry(key.clone())
            .or_insert(ScanSetEntry {
                key,
                read_timestamp,
                observed_visible,
            });
    }

    pub fn get(&self, key: &RecordKey) -> Option<&ScanSetEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanSetEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One buffered write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSetEntry {
    pub key: RecordKey,
    /// New payload, or `None` for a delete
    pub payload: Option<Payload>,
    /// Version assigned when the commit installs this write; `None` before that
    pub version_key: Option<u64>,
}

impl WriteSetEntry {
    pub fn is_delete(&self) -> bool {
        self.payload.is_none()
    }
}

/// Writes buffered by one transaction, keyed and ordered by record key
///
/// A later write to a key replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct WriteSet {
    entries: BTreeMap<RecordKey, WriteSetEntry>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: RecordKey, payload: Option<Payload>) {
        self.entries.insert(
            key.clone(),
            WriteSetEntry {
                key,
                payload,
                version_key: None,
            },
        );
    }

    pub fn get(&self, key: &RecordKey) -> Option<&WriteSetEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WriteSetEntry> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, RecordKey, WriteSetEntry> {
        self.entries.values_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_set_keeps_first_observation() {
        let mut scan = ScanSet::new();
        let key = RecordKey::new("person", 1);
        scan.record(key.clone(), 4, false);
        scan.record(key.clone(), 4, true);

        assert_eq!(scan.len(), 1);
        assert!(!scan.get(&key).unwrap().observed_visible);
    }

    #[test]
    fn test_write_set_last_write_wins() {
        let mut writes = WriteSet::new();
        let key = RecordKey::new("person", 1);
        writes.put(key.clone(), Some(b"first".to_vec()));
        writes.put(key.clone(), Some(b"second".to_vec()));

        assert_eq!(writes.len(), 1);
        let entry = writes.get(&key).unwrap();
        assert_eq!(entry.payload.as_deref(), Some(&b"second"[..]));
        assert_eq!(entry.version_key, None);
    }

    #[test]
    fn test_write_set_iterates_in_key_order() {
        let mut writes = WriteSet::new();
        writes.put(RecordKey::new("b", 1), None);
        writes.put(RecordKey::new("a", 2), Some(vec![]));
        writes.put(RecordKey::new("a", 1), Some(vec![]));

        let order: Vec<String> = writes.keys().map(|k| k.to_string()).collect();
        assert_eq!(order, vec!["a:1", "a:2", "b:1"]);
        assert!(writes.get(&RecordKey::new("b", 1)).unwrap().is_delete());
    }
}
