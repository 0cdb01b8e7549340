// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage driver traits
//!
//! This module defines the core traits for storage drivers and trees.
//! All storage drivers must implement these traits to provide a consistent interface.

use super::types::{StorageResult, StorageType};
use std::path::Path;

/// Iterator over raw key-value pairs yielded by a tree
pub type KvIter<'a> = Box<dyn Iterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>> + 'a>;

/// A single mutation inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Insert { key: Vec<u8>, value: Vec<u8> },
    Remove { key: Vec<u8> },
}

/// Ordered group of mutations applied atomically by [`StorageTree::apply_batch`]
///
/// Readers of the tree observe either none or all of the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Insert { key, value });
    }

    pub fn remove(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOp::Remove { key });
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Trait for a tree/column family in the storage driver
///
/// Represents a named, key-ordered collection of key-value pairs within a
/// storage driver. Iteration and prefix scans yield keys in ascending
/// byte order.
pub trait StorageTree: Send + Sync {
    /// Insert a key-value pair
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Iterate over all key-value pairs in key order
    fn iter(&self) -> StorageResult<KvIter<'_>>;

    /// Scan with a key prefix, in key order
    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<KvIter<'_>>;

    /// Apply every mutation of the batch atomically
    fn apply_batch(&self, batch: &WriteBatch) -> StorageResult<()>;

    /// Number of entries in the tree
    fn len(&self) -> StorageResult<usize>;

    /// Flush any pending writes to disk
    fn flush(&self) -> StorageResult<()>;
}

/// Main storage driver trait
///
/// Defines the interface that all storage drivers must implement.
/// Provides methods for opening databases and managing trees.
pub trait StorageDriver: Send + Sync {
    /// Type of tree/column family used by this driver
    type Tree: StorageTree;

    /// Open or create a storage driver at the given path
    fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self>
    where
        Self: Sized;

    /// Open or create a named tree/column family
    fn open_tree(&self, name: &str) -> StorageResult<Self::Tree>;

    /// List all available trees/column families
    fn list_trees(&self) -> StorageResult<Vec<String>>;

    /// Flush all pending writes to disk
    fn flush(&self) -> StorageResult<()>;

    /// Get storage type
    fn storage_type(&self) -> StorageType;
}

// Helper implementation for Box<dyn StorageTree>
// This allows us to use boxed trait objects seamlessly
impl StorageTree for Box<dyn StorageTree> {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        (**self).insert(key, value)
    }

    fn iter(&self) -> StorageResult<KvIter<'_>> {
        (**self).iter()
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<KvIter<'_>> {
        (**self).scan_prefix(prefix)
    }

    fn apply_batch(&self, batch: &WriteBatch) -> StorageResult<()> {
        (**self).apply_batch(batch)
    }

    fn len(&self) -> StorageResult<usize> {
        (**self).len()
    }

    fn flush(&self) -> StorageResult<()> {
        (**self).flush()
    }
}
