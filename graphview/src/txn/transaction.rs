// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction handle
//!
//! A [`Transaction`] reads from the snapshot fixed by its begin timestamp and
//! buffers writes locally until commit. The handle is owned by exactly one
//! caller; because `commit` takes `&mut self`, nobody can abort a transaction
//! while it is validating.
//!
//! Dropping an active transaction aborts it, mirroring the rollback-on-drop
//! behaviour of the SDK's transaction wrapper.

use std::sync::Arc;

use super::error::{TransactionError, TransactionResult};
use super::manager::EngineCore;
use super::sets::{ScanSet, WriteSet};
use super::state::{TransactionId, TransactionStatus};
use crate::storage::{Payload, RecordKey, Timestamp};

/// A unit of work against the version store
pub struct Transaction {
    id: TransactionId,
    begin_ts: Timestamp,
    commit_ts: Option<Timestamp>,
    status: TransactionStatus,
    scan_set: ScanSet,
    write_set: WriteSet,
    core: Arc<EngineCore>,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId, begin_ts: Timestamp, core: Arc<EngineCore>) -> Self {
        Self {
            id,
            begin_ts,
            commit_ts: None,
            status: TransactionStatus::Active,
            scan_set: ScanSet::new(),
            write_set: WriteSet::new(),
            core,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn begin_ts(&self) -> Timestamp {
        self.begin_ts
    }

    /// Commit timestamp, set once the transaction has committed
    pub fn commit_ts(&self) -> Option<Timestamp> {
        self.commit_ts
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn scan_set(&self) -> &ScanSet {
        &self.scan_set
    }

    pub fn write_set(&self) -> &WriteSet {
        &self.write_set
    }

    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty()
    }

    /// Read `key` as of this transaction's snapshot
    ///
    /// Returns this transaction's own pending write if there is one.
    /// Otherwise the read is served from the version visible at the begin
    /// timestamp and recorded in the scan set. `Ok(None)` means the record
    /// does not exist (or was deleted) in the snapshot.
    pub fn read(&mut self, key: &RecordKey) -> TransactionResult<Option<Payload>> {
        self.ensure_active("read")?;

        if let Some(pending) = self.write_set.get(key) {
            return Ok(pending.payload.clone());
        }

        match self.core.store().visible_version(key, self.begin_ts) {
            Ok(version) => {
                let payload = version.and_then(|v| v.payload);
                self.scan_set
                    .record(key.clone(), self.begin_ts, payload.is_some());
                Ok(payload)
            }
            Err(e) => {
                log::warn!("{} failed to read {}: {}", self.id, key, e);
                self.core.record_storage_failure();
                self.finish(TransactionStatus::Aborted);
                Err(e.into())
            }
        }
    }

    /// Buffer a write of `payload` to `key`
    pub fn write(&mut self, key: RecordKey, payload: Payload) -> TransactionResult<()> {
        self.ensure_active("write")?;
        self.write_set.put(key, Some(payload));
        Ok(())
    }

    /// Buffer a delete of `key`; committed as a tombstone version
    pub fn delete(&mut self, key: RecordKey) -> TransactionResult<()> {
        self.ensure_active("delete")?;
        self.write_set.put(key, None);
        Ok(())
    }

    /// Validate and, if valid, install this transaction's writes
    ///
    /// Returns the commit timestamp. A read-only transaction returns its
    /// begin timestamp, since it installs nothing. On a conflict or storage
    /// failure the transaction is aborted and none of its writes are visible.
    pub fn commit(&mut self) -> TransactionResult<Timestamp> {
        self.ensure_active("commit")?;
        self.transition(TransactionStatus::Validating);

        let outcome =
            self.core
                .commit(self.id, self.begin_ts, &self.scan_set, &mut self.write_set);

        match outcome {
            Ok(commit_ts) => {
                self.commit_ts = Some(commit_ts);
                self.finish(TransactionStatus::Committed);
                Ok(commit_ts)
            }
            Err(e) => {
                self.finish(TransactionStatus::Aborted);
                Err(e)
            }
        }
    }

    /// Abort the transaction, discarding its writes
    ///
    /// Aborting an already aborted transaction is a no-op.
    pub fn abort(&mut self) -> TransactionResult<()> {
        match self.status {
            TransactionStatus::Aborted => Ok(()),
            TransactionStatus::Active => {
                self.finish(TransactionStatus::Aborted);
                log::debug!("{} aborted", self.id);
                Ok(())
            }
            status => Err(TransactionError::InvalidState {
                id: self.id,
                status,
                operation: "abort",
            }),
        }
    }

    fn ensure_active(&self, operation: &'static str) -> TransactionResult<()> {
        if self.status != TransactionStatus::Active {
            return Err(TransactionError::InvalidState {
                id: self.id,
                status: self.status,
                operation,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: TransactionStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "{} cannot move from {} to {}",
            self.id,
            self.status,
            next
        );
        self.status = next;
        self.core.update_status(self.id, next);
    }

    fn finish(&mut self, terminal: TransactionStatus) {
        self.transition(terminal);
        if terminal == TransactionStatus::Aborted {
            self.write_set.clear();
        }
        self.core.unregister(self.id, terminal);
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.status == TransactionStatus::Active {
            log::debug!("{} dropped while active; aborting", self.id);
            self.finish(TransactionStatus::Aborted);
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("begin_ts", &self.begin_ts)
            .field("commit_ts", &self.commit_ts)
            .field("status", &self.status)
            .field("reads", &self.scan_set.len())
            .field("writes", &self.write_set.len())
            .finish()
    }
}
