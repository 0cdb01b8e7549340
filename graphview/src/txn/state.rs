// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction state management
//!
//! This module defines transaction identity, the lifecycle status machine,
//! and the registry view of an in-flight transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Timestamp;

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Get the underlying ID value
    pub fn id(&self) -> u64 {
        self.0
    }

    /// Create TransactionId from u64
    pub fn from_u64(id: u64) -> Self {
        TransactionId(id)
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// Transaction lifecycle states
///
/// Transitions only move forward:
/// `Active -> Validating -> {Committed, Aborted}` and `Active -> Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Transaction is active and can read and write
    Active,
    /// Transaction is inside commit validation
    Validating,
    /// Transaction has been committed successfully
    Committed,
    /// Transaction has been aborted; its writes were discarded
    Aborted,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Active => "ACTIVE",
            TransactionStatus::Validating => "VALIDATING",
            TransactionStatus::Committed => "COMMITTED",
            TransactionStatus::Aborted => "ABORTED",
        }
    }

    /// Committed and Aborted are final
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Committed | TransactionStatus::Aborted
        )
    }

    /// Whether the lifecycle permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Active, Validating) | (Active, Aborted) | (Validating, Committed) | (Validating, Aborted)
        )
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registry view of an in-flight transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub id: TransactionId,
    pub begin_ts: Timestamp,
    pub status: TransactionStatus,
    /// Wall-clock time the transaction began
    pub started_at: DateTime<Utc>,
}

impl TransactionInfo {
    pub fn new(id: TransactionId, begin_ts: Timestamp) -> Self {
        Self {
            id,
            begin_ts,
            status: TransactionStatus::Active,
            started_at: Utc::now(),
        }
    }

    /// Time elapsed since the transaction began
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_are_one_directional() {
        use TransactionStatus::*;
        assert!(Active.can_transition_to(Validating));
        assert!(Active.can_transition_to(Aborted));
        assert!(Validating.can_transition_to(Committed));
        assert!(Validating.can_transition_to(Aborted));

        assert!(!Active.can_transition_to(Committed));
        assert!(!Validating.can_transition_to(Active));
        assert!(!Committed.can_transition_to(Aborted));
        assert!(!Aborted.can_transition_to(Active));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransactionStatus::Committed.is_terminal());
        assert!(TransactionStatus::Aborted.is_terminal());
        assert!(!TransactionStatus::Validating.is_terminal());
    }

    #[test]
    fn test_transaction_id_display() {
        assert_eq!(TransactionId::from_u64(42).to_string(), "txn_42");
    }
}
