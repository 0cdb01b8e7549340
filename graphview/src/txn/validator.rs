// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Commit-time validation (backward validation against committed versions)
//!
//! For a transaction with begin timestamp `b` validating at `upper`:
//!
//! - **Read rule**: a scanned key conflicts if its open version began in
//!   `(b, upper]`, i.e. someone committed over what this transaction saw.
//! - **Write rule**: a written key conflicts if its open version began after
//!   `b`, i.e. another writer of the key committed first.
//!
//! Only the open version needs checking: a version chain's begin timestamps
//! increase, so if any version began after `b` the open one did too.

use super::error::{ConflictInfo, ConflictKind};
use super::sets::{ScanSet, WriteSet};
use crate::storage::{RecordKey, StorageResult, Timestamp, VersionStore};

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Conflict(ConflictInfo),
}

/// Checks scan and write sets against the latest committed state
pub struct Validator<'a> {
    store: &'a dyn VersionStore,
}

impl<'a> Validator<'a> {
    pub fn new(store: &'a dyn VersionStore) -> Self {
        Self { store }
    }

    /// Run the read rule and then the write rule
    pub fn validate(
        &self,
        scan_set: &ScanSet,
        write_set: &WriteSet,
        begin_ts: Timestamp,
        upper_ts: Timestamp,
    ) -> StorageResult<Validation> {
        match self.validate_reads(scan_set, upper_ts)? {
            Validation::Valid => self.validate_writes(write_set, begin_ts),
            conflict => Ok(conflict),
        }
    }

    pub fn validate_reads(
        &self,
        scan_set: &ScanSet,
        upper_ts: Timestamp,
    ) -> StorageResult<Validation> {
        for entry in scan_set.iter() {
            if let Some(committed_at) = self.committed_after(&entry.key, entry.read_timestamp)? {
                if committed_at <= upper_ts {
                    return Ok(Validation::Conflict(ConflictInfo {
                        key: entry.key.clone(),
                        kind: ConflictKind::Read,
                        committed_at,
                    }));
                }
            }
        }
        Ok(Validation::Valid)
    }

    pub fn validate_writes(
        &self,
        write_set: &WriteSet,
        begin_ts: Timestamp,
    ) -> StorageResult<Validation> {
        for key in write_set.keys() {
            if let Some(committed_at) = self.committed_after(key, begin_ts)? {
                return Ok(Validation::Conflict(ConflictInfo {
                    key: key.clone(),
                    kind: ConflictKind::Write,
                    committed_at,
                }));
            }
        }
        Ok(Validation::Valid)
    }

    /// Begin timestamp of the key's open version, if it began after `since`
    fn committed_after(
        &self,
        key: &RecordKey,
        since: Timestamp,
    ) -> StorageResult<Option<Timestamp>> {
        Ok(self
            .store
            .latest_version(key)?
            .map(|latest| latest.begin_ts)
            .filter(|&begin| begin > since))
    }
}
