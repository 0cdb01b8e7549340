// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GraphView - multi-version optimistic transactions for graph storage
//!
//! GraphView is the transaction core underneath a graph store. Records are
//! kept as chains of immutable versions; transactions read a consistent
//! snapshot and commit optimistically, with conflicts detected at commit time.
//!
//! # Features
//!
//! - **Serializable Commits**: Backward validation of reads and writes at
//!   commit time gives a serializable commit order
//! - **First Committer Wins**: Concurrent writers of a key cannot both commit
//! - **Atomic Installs**: A commit's versions become visible all at once
//! - **Embedded Storage**: In-memory or Sled-backed version chains
//!
//! # Usage
//!
//! ```ignore
//! use graphview::{RecordKey, TransactionManager};
//!
//! let manager = TransactionManager::in_memory();
//! let mut txn = manager.begin()?;
//! let key = RecordKey::new("person", 1);
//! txn.write(key.clone(), b"Alice".to_vec())?;
//! txn.commit()?;
//! ```

pub mod config;
pub mod storage;
pub mod txn;

pub use config::EngineConfig;
pub use storage::{
    ChainedVersionStore, KeyValue, Payload, RecordKey, StorageDriverError, StorageType, Timestamp,
    VersionEntry, VersionStore,
};
pub use txn::{
    ConflictInfo, ConflictKind, Transaction, TransactionError, TransactionId,
    TransactionManager, TransactionResult, TransactionStatistics, TransactionStatus,
};

/// GraphView version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GraphView crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
