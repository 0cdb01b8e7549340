// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Versioned record storage
//!
//! This module provides:
//! - Record identity and version types
//! - Per-key version chains over an ordered key-value tree
//! - Pluggable storage backend trait for different KV stores

mod persistent;
pub mod record;
pub mod version_store;

pub use persistent::{
    create_storage_driver, BatchOp, BoxedStorageDriver, KvIter, MemoryStorageDriver, MemoryTree,
    StorageDriver, StorageDriverError, StorageResult, StorageTree, StorageType, WriteBatch,
};
pub use record::{KeyValue, Payload, RecordKey, Timestamp, VersionEntry};
pub use version_store::{ChainedVersionStore, VersionStore};
