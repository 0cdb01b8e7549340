// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction error types

use std::fmt;

use thiserror::Error;

use super::state::{TransactionId, TransactionStatus};
use crate::storage::{RecordKey, StorageDriverError, Timestamp};

/// Which validation rule a conflicting key violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// A key in the scan set was overwritten after the snapshot was taken
    Read,
    /// A key in the write set was committed by someone else after the snapshot
    Write,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Read => write!(f, "read"),
            ConflictKind::Write => write!(f, "write"),
        }
    }
}

/// Details of the first conflict found while validating a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictInfo {
    pub key: RecordKey,
    pub kind: ConflictKind,
    /// Begin timestamp of the committed version that caused the conflict
    pub committed_at: Timestamp,
}

impl fmt::Display for ConflictInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} conflict on {} (committed at {})",
            self.kind, self.key, self.committed_at
        )
    }
}

/// Errors surfaced by the transaction engine
///
/// A read that finds nothing is not an error: it returns `Ok(None)`.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// Operation invoked on a transaction whose status does not permit it
    #[error("Transaction {id} is {status}; cannot {operation}")]
    InvalidState {
        id: TransactionId,
        status: TransactionStatus,
        operation: &'static str,
    },

    /// Commit validation failed; the caller may retry with a new transaction
    #[error("Transaction conflict: {0}")]
    Conflict(ConflictInfo),

    /// The version store could not answer; the transaction was aborted
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The timestamp authority has issued its largest value
    #[error("Timestamp space exhausted after {last}")]
    TimestampExhausted { last: Timestamp },

    /// Engine could not be built from the supplied configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TransactionError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, TransactionError::Conflict(_))
    }

    /// Only conflicts are worth re-running with a fresh snapshot
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}

impl From<StorageDriverError> for TransactionError {
    fn from(e: StorageDriverError) -> Self {
        TransactionError::StorageUnavailable(e.to_string())
    }
}

/// Result type for transaction operations
pub type TransactionResult<T> = Result<T, TransactionError>;
