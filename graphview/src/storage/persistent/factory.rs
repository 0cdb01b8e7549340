// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage driver factory
//!
//! This module provides factory functions for creating storage drivers based on configuration.

use super::traits::{StorageDriver, StorageTree};
use super::types::{StorageDriverError, StorageResult, StorageType};
use std::path::Path;

/// Boxed driver whose trees are boxed trait objects
pub type BoxedStorageDriver = Box<dyn StorageDriver<Tree = Box<dyn StorageTree>>>;

/// Factory function to create a storage driver based on configuration
///
/// # Arguments
/// * `storage_type` - The type of storage driver to create
/// * `path` - The filesystem path where the database should be stored (ignored by `Memory`)
pub fn create_storage_driver<P: AsRef<Path>>(
    storage_type: StorageType,
    path: P,
) -> StorageResult<BoxedStorageDriver> {
    match storage_type {
        #[cfg(feature = "sled-backend")]
        StorageType::Sled => {
            use crate::storage::persistent::sled::SledDriver;
            let driver = SledDriver::open(path)?;
            Ok(Box::new(driver) as BoxedStorageDriver)
        }
        #[cfg(not(feature = "sled-backend"))]
        StorageType::Sled => Err(StorageDriverError::BackendSpecific(
            "Sled storage backend not compiled in (enable the `sled-backend` feature)".to_string(),
        )),
        StorageType::RocksDB => Err(StorageDriverError::BackendSpecific(
            "RocksDB storage backend not yet implemented".to_string(),
        )),
        StorageType::Memory => {
            use crate::storage::persistent::memory::MemoryStorageDriver;
            let driver = MemoryStorageDriver::open(path)?;
            Ok(Box::new(driver) as BoxedStorageDriver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "sled-backend")]
    fn test_create_sled_driver() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let driver = create_storage_driver(StorageType::Sled, temp_dir.path()).unwrap();
        assert_eq!(driver.storage_type(), StorageType::Sled);
    }

    #[test]
    fn test_create_memory_driver() {
        let driver = create_storage_driver(StorageType::Memory, "").unwrap();
        assert_eq!(driver.storage_type(), StorageType::Memory);
    }

    #[test]
    fn test_rocksdb_is_rejected() {
        let result = create_storage_driver(StorageType::RocksDB, "");
        assert!(matches!(result, Err(StorageDriverError::BackendSpecific(_))));
    }
}
