// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction management module
//!
//! Multi-version optimistic concurrency control over a [`VersionStore`].
//! Transactions read from the snapshot fixed by their begin timestamp, buffer
//! writes privately, and are validated at commit against everything committed
//! since they began. Commits that pass install their writes atomically as new
//! versions; the first committer of a contended key wins and later ones abort.
//!
//! # Features
//! - Snapshot reads with read-your-writes
//! - Backward validation of scan and write sets
//! - Atomic multi-key install under a single commit critical section
//! - Tombstone deletes and low-watermark version garbage collection
//!
//! [`VersionStore`]: crate::storage::VersionStore

pub mod error;
pub mod manager;
pub mod sets;
pub mod state;
pub mod timestamp;
pub mod transaction;
pub mod validator;

pub use error::{ConflictInfo, ConflictKind, TransactionError, TransactionResult};
pub use manager::{TransactionManager, TransactionStatistics};
pub use sets::{ScanSet, ScanSetEntry, WriteSet, WriteSetEntry};
pub use state::{TransactionId, TransactionInfo, TransactionStatus};
pub use timestamp::TimestampAuthority;
pub use transaction::Transaction;
pub use validator::{Validation, Validator};
