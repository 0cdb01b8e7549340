// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage driver types and error handling
//!
//! This module defines the types, enums, and error handling used throughout
//! the storage driver system.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage driver type configuration
///
/// Specifies which underlying key-value technology holds the version chains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// RocksDB - recognized in configuration, no driver shipped yet
    RocksDB,

    /// Sled - Pure Rust embedded database
    /// Best for: persistent single-process deployments
    Sled,

    /// Memory - ordered in-memory trees
    /// Best for: Unit testing, ephemeral engines
    #[default]
    Memory,
}

impl StorageType {
    /// Whether this backend keeps data across process restarts
    pub fn is_persistent(&self) -> bool {
        !matches!(self, StorageType::Memory)
    }
}

impl std::str::FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rocksdb" => Ok(StorageType::RocksDB),
            "sled" => Ok(StorageType::Sled),
            "memory" => Ok(StorageType::Memory),
            _ => Err(format!(
                "Unknown storage type: {}. Valid options: rocksdb, sled, memory",
                s
            )),
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageType::RocksDB => "rocksdb",
            StorageType::Sled => "sled",
            StorageType::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// Error type for storage driver operations
///
/// Covers every failure mode a driver or the version store layered on top of
/// it can report. Any of these reaching the transaction layer means the store
/// could not answer, which is fatal to the transaction that asked.
#[derive(Error, Debug)]
pub enum StorageDriverError {
    /// I/O related errors (file system, etc.)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Data (de)serialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Stored bytes failed an integrity or structural check
    #[error("Corrupted record: {0}")]
    Corrupted(String),

    /// Driver-specific error (Sled, etc.)
    #[error("Storage driver error: {0}")]
    BackendSpecific(String),
}

impl From<bincode::Error> for StorageDriverError {
    fn from(e: bincode::Error) -> Self {
        StorageDriverError::SerializationError(e.to_string())
    }
}

impl From<serde_json::Error> for StorageDriverError {
    fn from(e: serde_json::Error) -> Self {
        StorageDriverError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "sled-backend")]
impl From<sled::Error> for StorageDriverError {
    fn from(e: sled::Error) -> Self {
        StorageDriverError::BackendSpecific(e.to_string())
    }
}

/// Result type for storage driver operations
pub type StorageResult<T> = Result<T, StorageDriverError>;
