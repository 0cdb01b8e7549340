// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine configuration
//!
//! Describes which storage backend holds the version chains and how the
//! transaction manager should behave on top of it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::storage::StorageType;
use crate::txn::{TransactionError, TransactionResult};

fn default_version_tree() -> String {
    "versions".to_string()
}

/// Configuration for [`TransactionManager::open`](crate::TransactionManager::open)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Storage backend for version chains
    #[serde(default)]
    pub storage_type: StorageType,

    /// Database directory; required by persistent backends
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Name of the tree holding version chains
    #[serde(default = "default_version_tree")]
    pub version_tree: String,

    /// Timestamps are never issued at or below this value
    #[serde(default)]
    pub initial_timestamp: u64,

    /// Run version garbage collection after this many write commits
    #[serde(default)]
    pub gc_interval_commits: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Memory,
            data_path: None,
            version_tree: default_version_tree(),
            initial_timestamp: 0,
            gc_interval_commits: None,
        }
    }
}

impl EngineConfig {
    /// In-memory configuration with default settings
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Sled-backed configuration rooted at `path`
    pub fn sled<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            storage_type: StorageType::Sled,
            data_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_gc_interval(mut self, commits: u64) -> Self {
        self.gc_interval_commits = Some(commits);
        self
    }

    pub fn with_initial_timestamp(mut self, ts: u64) -> Self {
        self.initial_timestamp = ts;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.storage_type.is_persistent() && self.data_path.is_none() {
            return Err(format!(
                "Storage type '{}' requires a data_path",
                self.storage_type
            ));
        }

        if self.version_tree.is_empty() {
            return Err("version_tree must not be empty".to_string());
        }

        if self.initial_timestamp == u64::MAX {
            return Err("initial_timestamp leaves no timestamps to issue".to_string());
        }

        if self.gc_interval_commits == Some(0) {
            return Err("gc_interval_commits must be > 0 when set".to_string());
        }

        Ok(())
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> TransactionResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TransactionError::Configuration(format!("Invalid JSON: {}", e)))?;
        config.validate().map_err(TransactionError::Configuration)?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> TransactionResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TransactionError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}
