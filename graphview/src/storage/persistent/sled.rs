// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled storage driver implementation

use super::traits::{BatchOp, KvIter, StorageDriver, StorageTree, WriteBatch};
use super::types::{StorageDriverError, StorageResult, StorageType};
use std::path::Path;

/// Sled driver implementation
pub struct SledDriver {
    db: sled::Db,
}

/// Sled tree wrapper that implements StorageTree trait
pub struct SledTree {
    tree: sled::Tree,
}

impl StorageTree for SledTree {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.tree.insert(key, value)?;
        Ok(())
    }

    fn iter(&self) -> StorageResult<KvIter<'_>> {
        let iter = self.tree.iter().map(|result| {
            result
                .map(|(k, v)| (k.to_vec(), v.to_vec()))
                .map_err(StorageDriverError::from)
        });
        Ok(Box::new(iter))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<KvIter<'_>> {
        let iter = self.tree.scan_prefix(prefix).map(|result| {
            result
                .map(|(k, v)| (k.to_vec(), v.to_vec()))
                .map_err(StorageDriverError::from)
        });
        Ok(Box::new(iter))
    }

    fn apply_batch(&self, batch: &WriteBatch) -> StorageResult<()> {
        let mut sled_batch = sled::Batch::default();
        for op in batch.ops() {
            match op {
                BatchOp::Insert { key, value } => {
                    sled_batch.insert(key.as_slice(), value.as_slice())
                }
                BatchOp::Remove { key } => sled_batch.remove(key.as_slice()),
            }
        }
        self.tree.apply_batch(sled_batch)?;
        Ok(())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.tree.len())
    }

    fn flush(&self) -> StorageResult<()> {
        self.tree.flush()?;
        Ok(())
    }
}

impl StorageDriver for SledDriver {
    type Tree = Box<dyn StorageTree>;

    fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = sled::open(path)?;
        Ok(SledDriver { db })
    }

    fn open_tree(&self, name: &str) -> StorageResult<Self::Tree> {
        let tree = self.db.open_tree(name)?;
        Ok(Box::new(SledTree { tree }) as Box<dyn StorageTree>)
    }

    fn list_trees(&self) -> StorageResult<Vec<String>> {
        let tree_names = self
            .db
            .tree_names()
            .into_iter()
            .map(|name| String::from_utf8_lossy(&name).to_string())
            .collect();
        Ok(tree_names)
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Sled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sled_batch_and_prefix_scan() {
        let temp_dir = TempDir::new().unwrap();
        let driver = SledDriver::open(temp_dir.path()).unwrap();
        let tree = driver.open_tree("versions").unwrap();

        let mut batch = WriteBatch::new();
        batch.insert(b"p/2".to_vec(), b"b".to_vec());
        batch.insert(b"p/1".to_vec(), b"a".to_vec());
        batch.insert(b"q/1".to_vec(), b"c".to_vec());
        tree.apply_batch(&batch).unwrap();

        let values: Vec<Vec<u8>> = tree
            .scan_prefix(b"p/")
            .unwrap()
            .map(|r| r.unwrap().1)
            .collect();
        assert_eq!(values, vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(tree.len().unwrap(), 3);
    }

    #[test]
    fn test_sled_data_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let driver = SledDriver::open(temp_dir.path()).unwrap();
            let tree = driver.open_tree("versions").unwrap();
            tree.insert(b"k", b"v").unwrap();
            driver.flush().unwrap();
        }

        let driver = SledDriver::open(temp_dir.path()).unwrap();
        let tree = driver.open_tree("versions").unwrap();
        let values: Vec<Vec<u8>> = tree
            .scan_prefix(b"k")
            .unwrap()
            .map(|r| r.unwrap().1)
            .collect();
        assert_eq!(values, vec![b"v".to_vec()]);
    }
}
