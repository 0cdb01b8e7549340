// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Version store: per-key version chains over an ordered key-value tree
//!
//! The transaction layer only ever talks to the [`VersionStore`] trait.
//! [`ChainedVersionStore`] implements it on top of any [`StorageTree`],
//! laying each record's versions out contiguously so one prefix scan
//! yields the whole chain in version order.
//!
//! # Physical layout
//!
//! - Key: `bincode(RecordKey)` followed by `version_key` as big-endian `u64`.
//!   bincode's length-prefixed encoding is self-delimiting, so no record's
//!   prefix is a prefix of another record's.
//! - Value: `bincode(VersionEntry)` followed by a CRC32 of those bytes (LE).

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use super::persistent::{
    BoxedStorageDriver, MemoryTree, StorageDriverError, StorageResult, StorageTree, WriteBatch,
};
use super::record::{RecordKey, Timestamp, VersionEntry};

/// Contract the transaction engine requires from the version store
///
/// Reads may run concurrently with each other and with installs. Mutating
/// calls are only issued from inside the commit critical section, one at a
/// time.
pub trait VersionStore: Send + Sync {
    /// The version whose `[begin_ts, end_ts)` interval contains `as_of`
    fn visible_version(
        &self,
        key: &RecordKey,
        as_of: Timestamp,
    ) -> StorageResult<Option<VersionEntry>>;

    /// The currently open version of `key`
    fn latest_version(&self, key: &RecordKey) -> StorageResult<Option<VersionEntry>>;

    /// Append a new open version; the key must have no open version
    fn append(&self, entry: VersionEntry) -> StorageResult<()>;

    /// Close the open version of `key` at `end_ts`
    fn close_current(&self, key: &RecordKey, end_ts: Timestamp) -> StorageResult<()>;

    /// Install a set of new open versions atomically
    ///
    /// For every entry, the key's open version (if any) is closed at the
    /// entry's `begin_ts` and the entry is appended. Concurrent readers
    /// observe either none or all of the installed versions.
    fn install(&self, entries: &[VersionEntry]) -> StorageResult<()>;

    /// Largest timestamp recorded anywhere in the store (0 when empty)
    fn max_timestamp(&self) -> StorageResult<Timestamp>;

    /// Every stored version of `key`, ordered by `version_key`
    fn version_chain(&self, key: &RecordKey) -> StorageResult<Vec<VersionEntry>>;

    /// Remove closed versions with `end_ts <= watermark`; returns how many
    fn prune(&self, watermark: Timestamp) -> StorageResult<usize>;

    /// Persist buffered writes, where the backend buffers any
    fn flush(&self) -> StorageResult<()>;
}

/// [`VersionStore`] backed by a single ordered [`StorageTree`]
pub struct ChainedVersionStore {
    tree: Box<dyn StorageTree>,
    /// Keeps the owning driver (and its file handles) alive
    driver: Option<BoxedStorageDriver>,
    max_ts: AtomicU64,
}

impl ChainedVersionStore {
    /// Wrap an already opened tree, recovering the highest stored timestamp
    pub fn new(tree: Box<dyn StorageTree>) -> StorageResult<Self> {
        let store = Self {
            tree,
            driver: None,
            max_ts: AtomicU64::new(0),
        };
        let recovered = store.scan_max_timestamp()?;
        store.max_ts.store(recovered, Ordering::SeqCst);
        log::debug!(
            "Version tree holds {} version(s), latest timestamp {}",
            store.tree.len()?,
            recovered
        );
        Ok(store)
    }

    /// Fresh store over a private in-memory tree
    pub fn in_memory() -> Self {
        Self {
            tree: Box::new(MemoryTree::new()),
            driver: None,
            max_ts: AtomicU64::new(0),
        }
    }

    /// Open the named tree of `driver` and take ownership of the driver
    pub fn open(driver: BoxedStorageDriver, tree_name: &str) -> StorageResult<Self> {
        let tree = driver.open_tree(tree_name)?;
        let mut store = Self::new(tree)?;
        store.driver = Some(driver);
        Ok(store)
    }

    fn record_prefix(key: &RecordKey) -> StorageResult<Vec<u8>> {
        Ok(bincode::serialize(key)?)
    }

    fn physical_key(key: &RecordKey, version_key: u64) -> StorageResult<Vec<u8>> {
        let mut bytes = Self::record_prefix(key)?;
        bytes.extend_from_slice(&version_key.to_be_bytes());
        Ok(bytes)
    }

    fn encode(entry: &VersionEntry) -> StorageResult<Vec<u8>> {
        let mut bytes = bincode::serialize(entry)?;
        let checksum = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());
        Ok(bytes)
    }

    fn decode(bytes: &[u8]) -> StorageResult<VersionEntry> {
        if bytes.len() < 4 {
            return Err(StorageDriverError::Corrupted(
                "Version record too small".to_string(),
            ));
        }
        let (body, tail) = bytes.split_at(bytes.len() - 4);
        let expected = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        if crc32fast::hash(body) != expected {
            return Err(StorageDriverError::Corrupted(
                "Checksum mismatch".to_string(),
            ));
        }
        Ok(bincode::deserialize(body)?)
    }

    fn scan_max_timestamp(&self) -> StorageResult<Timestamp> {
        let mut max_ts = 0;
        for item in self.tree.iter()? {
            let (_, value) = item?;
            let entry = Self::decode(&value)?;
            max_ts = max_ts.max(entry.end_ts.unwrap_or(entry.begin_ts));
        }
        Ok(max_ts)
    }

    fn observe_timestamp(&self, ts: Timestamp) {
        self.max_ts.fetch_max(ts, Ordering::SeqCst);
    }

    fn last_version(&self, key: &RecordKey) -> StorageResult<Option<VersionEntry>> {
        Ok(self.version_chain(key)?.pop())
    }
}

impl VersionStore for ChainedVersionStore {
    fn visible_version(
        &self,
        key: &RecordKey,
        as_of: Timestamp,
    ) -> StorageResult<Option<VersionEntry>> {
        let prefix = Self::record_prefix(key)?;
        for item in self.tree.scan_prefix(&prefix)? {
            let (_, value) = item?;
            let entry = Self::decode(&value)?;
            if entry.is_visible_at(as_of) {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    fn latest_version(&self, key: &RecordKey) -> StorageResult<Option<VersionEntry>> {
        Ok(self.last_version(key)?.filter(VersionEntry::is_open))
    }

    fn append(&self, entry: VersionEntry) -> StorageResult<()> {
        if !entry.is_open() {
            return Err(StorageDriverError::BackendSpecific(format!(
                "Appended version of {} must be open",
                entry.key
            )));
        }
        if let Some(last) = self.last_version(&entry.key)? {
            if last.is_open() {
                return Err(StorageDriverError::BackendSpecific(format!(
                    "Key {} already has an open version {}",
                    entry.key, last.version_key
                )));
            }
            if entry.version_key <= last.version_key {
                return Err(StorageDriverError::BackendSpecific(format!(
                    "Version key {} of {} does not follow {}",
                    entry.version_key, entry.key, last.version_key
                )));
            }
        }

        let physical = Self::physical_key(&entry.key, entry.version_key)?;
        self.tree.insert(&physical, &Self::encode(&entry)?)?;
        self.observe_timestamp(entry.begin_ts);
        Ok(())
    }

    fn close_current(&self, key: &RecordKey, end_ts: Timestamp) -> StorageResult<()> {
        let mut current = match self.latest_version(key)? {
            Some(current) => current,
            None => {
                return Err(StorageDriverError::BackendSpecific(format!(
                    "Key {} has no open version to close",
                    key
                )))
            }
        };
        if end_ts <= current.begin_ts {
            return Err(StorageDriverError::BackendSpecific(format!(
                "End timestamp {} must follow begin timestamp {} of {}",
                end_ts, current.begin_ts, key
            )));
        }

        current.end_ts = Some(end_ts);
        let physical = Self::physical_key(key, current.version_key)?;
        self.tree.insert(&physical, &Self::encode(&current)?)?;
        self.observe_timestamp(end_ts);
        Ok(())
    }

    fn install(&self, entries: &[VersionEntry]) -> StorageResult<()> {
        let mut batch = WriteBatch::new();
        let mut seen = HashSet::with_capacity(entries.len());
        let mut max_ts = 0;

        for entry in entries {
            if !seen.insert(&entry.key) {
                return Err(StorageDriverError::BackendSpecific(format!(
                    "Key {} appears twice in one install",
                    entry.key
                )));
            }
            if !entry.is_open() {
                return Err(StorageDriverError::BackendSpecific(format!(
                    "Installed version of {} must be open",
                    entry.key
                )));
            }

            if let Some(mut last) = self.last_version(&entry.key)? {
                if entry.version_key <= last.version_key {
                    return Err(StorageDriverError::BackendSpecific(format!(
                        "Version key {} of {} does not follow {}",
                        entry.version_key, entry.key, last.version_key
                    )));
                }
                if last.is_open() {
                    if entry.begin_ts <= last.begin_ts {
                        return Err(StorageDriverError::BackendSpecific(format!(
                            "Begin timestamp {} of {} does not follow {}",
                            entry.begin_ts, entry.key, last.begin_ts
                        )));
                    }
                    last.end_ts = Some(entry.begin_ts);
                    batch.insert(
                        Self::physical_key(&last.key, last.version_key)?,
                        Self::encode(&last)?,
                    );
                }
            }

            batch.insert(
                Self::physical_key(&entry.key, entry.version_key)?,
                Self::encode(entry)?,
            );
            max_ts = max_ts.max(entry.begin_ts);
        }

        if batch.is_empty() {
            return Ok(());
        }
        self.tree.apply_batch(&batch)?;
        self.observe_timestamp(max_ts);
        Ok(())
    }

    fn max_timestamp(&self) -> StorageResult<Timestamp> {
        Ok(self.max_ts.load(Ordering::SeqCst))
    }

    fn version_chain(&self, key: &RecordKey) -> StorageResult<Vec<VersionEntry>> {
        let prefix = Self::record_prefix(key)?;
        let mut chain = Vec::new();
        for item in self.tree.scan_prefix(&prefix)? {
            let (_, value) = item?;
            chain.push(Self::decode(&value)?);
        }
        Ok(chain)
    }

    fn prune(&self, watermark: Timestamp) -> StorageResult<usize> {
        let mut batch = WriteBatch::new();
        for item in self.tree.iter()? {
            let (physical, value) = item?;
            let entry = Self::decode(&value)?;
            if matches!(entry.end_ts, Some(end) if end <= watermark) {
                batch.remove(physical);
            }
        }

        let removed = batch.len();
        if removed > 0 {
            self.tree.apply_batch(&batch)?;
        }
        Ok(removed)
    }

    fn flush(&self) -> StorageResult<()> {
        self.tree.flush()?;
        if let Some(driver) = &self.driver {
            driver.flush()?;
        }
        Ok(())
    }
}
