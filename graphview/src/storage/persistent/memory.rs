// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory storage driver implementation

use super::traits::{BatchOp, KvIter, StorageDriver, StorageTree, WriteBatch};
use super::types::{StorageResult, StorageType};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

type TreeData = Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>;

/// In-memory storage driver
pub struct MemoryStorageDriver {
    trees: Arc<RwLock<HashMap<String, TreeData>>>,
}

/// In-memory tree implementation, ordered by key bytes
pub struct MemoryTree {
    data: TreeData,
}

impl MemoryStorageDriver {
    /// Create a new memory storage driver
    pub fn new() -> Self {
        Self {
            trees: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStorageDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// Create a standalone tree not registered with any driver
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageTree for MemoryTree {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn iter(&self) -> StorageResult<KvIter<'_>> {
        // Snapshot under the read lock so the iterator never holds it
        let data = self.data.read();
        let items: Vec<_> = data
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.clone())))
            .collect();
        Ok(Box::new(items.into_iter()))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<KvIter<'_>> {
        let data = self.data.read();
        let items: Vec<_> = data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| Ok((k.clone(), v.clone())))
            .collect();
        Ok(Box::new(items.into_iter()))
    }

    fn apply_batch(&self, batch: &WriteBatch) -> StorageResult<()> {
        let mut data = self.data.write();
        for op in batch.ops() {
            match op {
                BatchOp::Insert { key, value } => {
                    data.insert(key.clone(), value.clone());
                }
                BatchOp::Remove { key } => {
                    data.remove(key);
                }
            }
        }
        Ok(())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.data.read().len())
    }

    fn flush(&self) -> StorageResult<()> {
        // No-op for memory storage
        Ok(())
    }
}

impl StorageDriver for MemoryStorageDriver {
    type Tree = Box<dyn StorageTree>;

    fn open<P: AsRef<Path>>(_path: P) -> StorageResult<Self> {
        Ok(Self::new())
    }

    fn open_tree(&self, name: &str) -> StorageResult<Self::Tree> {
        let mut trees = self.trees.write();
        let data = trees
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(BTreeMap::new())))
            .clone();

        Ok(Box::new(MemoryTree { data }) as Box<dyn StorageTree>)
    }

    fn list_trees(&self) -> StorageResult<Vec<String>> {
        Ok(self.trees.read().keys().cloned().collect())
    }

    fn flush(&self) -> StorageResult<()> {
        // No-op for memory storage
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_prefix_is_ordered_and_bounded() {
        let tree = MemoryTree::new();
        tree.insert(b"b/2", b"two").unwrap();
        tree.insert(b"a/1", b"x").unwrap();
        tree.insert(b"b/1", b"one").unwrap();
        tree.insert(b"c/1", b"y").unwrap();

        let keys: Vec<Vec<u8>> = tree
            .scan_prefix(b"b/")
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(keys, vec![b"b/1".to_vec(), b"b/2".to_vec()]);
    }

    #[test]
    fn test_apply_batch_inserts_and_removes() {
        let tree = MemoryTree::new();
        tree.insert(b"gone", b"1").unwrap();

        let mut batch = WriteBatch::new();
        batch.insert(b"k1".to_vec(), b"v1".to_vec());
        batch.remove(b"gone".to_vec());
        batch.insert(b"k2".to_vec(), b"v2".to_vec());
        tree.apply_batch(&batch).unwrap();

        let entries: Vec<_> = tree.iter().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(
            entries,
            vec![
                (b"k1".to_vec(), b"v1".to_vec()),
                (b"k2".to_vec(), b"v2".to_vec())
            ]
        );
        assert_eq!(tree.len().unwrap(), 2);
    }

    #[test]
    fn test_driver_shares_named_trees() {
        let driver = MemoryStorageDriver::new();
        let first = driver.open_tree("versions").unwrap();
        first.insert(b"k", b"v").unwrap();

        let second = driver.open_tree("versions").unwrap();
        let entries: Vec<_> = second.iter().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(entries, vec![(b"k".to_vec(), b"v".to_vec())]);
        assert_eq!(driver.list_trees().unwrap(), vec!["versions".to_string()]);
    }
}
