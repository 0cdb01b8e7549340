// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Timestamp authority
//!
//! Single source of transaction ordering. Begin and commit timestamps are
//! both drawn from here, so "before" and "after" in validation always refer
//! to one total order.

use std::sync::atomic::{AtomicU64, Ordering};

use super::error::{TransactionError, TransactionResult};
use crate::storage::Timestamp;

/// Issues strictly increasing timestamps, safe under concurrent callers
#[derive(Debug, Default)]
pub struct TimestampAuthority {
    last_issued: AtomicU64,
}

impl TimestampAuthority {
    /// Authority whose first timestamp is 1
    pub fn new() -> Self {
        Self::resume_from(0)
    }

    /// Authority continuing after `last_issued`, e.g. a value recovered from storage
    pub fn resume_from(last_issued: Timestamp) -> Self {
        Self {
            last_issued: AtomicU64::new(last_issued),
        }
    }

    /// Issue the next timestamp
    ///
    /// No two calls return the same value, and a call that starts after
    /// another returns gets a larger value. Once `u64::MAX` has been issued
    /// every further call fails with [`TransactionError::TimestampExhausted`].
    pub fn next(&self) -> TransactionResult<Timestamp> {
        self.last_issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                last.checked_add(1)
            })
            .map(|last| last + 1)
            .map_err(|last| TransactionError::TimestampExhausted { last })
    }

    /// The most recently issued timestamp (0 if none)
    pub fn current(&self) -> Timestamp {
        self.last_issued.load(Ordering::SeqCst)
    }
}
