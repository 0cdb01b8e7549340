// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction manager implementation
//!
//! The manager hands out transactions, tracks the ones in flight, and owns the
//! commit critical section. A commit runs in two phases:
//!
//! 1. Pre-validation without any lock. Most conflicts are found here and the
//!    loser aborts without ever queueing on the commit guard.
//! 2. Under the commit guard: validate again against the now-frozen committed
//!    state, then issue the commit timestamp and install every write as one
//!    atomic batch.
//!
//! The commit timestamp is issued while holding the *install gate*
//! exclusively, and `begin` draws its timestamp holding the gate shared. A new
//! snapshot therefore either precedes the commit timestamp or sees the whole
//! install; it never lands in between.
//!
//! Garbage collection only takes the install gate, long enough to read the
//! low watermark, and prunes outside the commit guard. Pruning removes closed
//! versions and installs never rewrite a closed version, so the two overlap
//! safely.
//!
//! Lock order is commit guard, then install gate, then registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::error::{TransactionError, TransactionResult};
use super::sets::{ScanSet, WriteSet};
use super::state::{TransactionId, TransactionInfo, TransactionStatus};
use super::timestamp::TimestampAuthority;
use super::transaction::Transaction;
use super::validator::{Validation, Validator};
use crate::config::EngineConfig;
use crate::storage::{
    create_storage_driver, ChainedVersionStore, Timestamp, VersionEntry, VersionStore,
};

/// Transaction statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionStatistics {
    pub begun: u64,
    /// Commits that installed at least one version
    pub committed: u64,
    pub read_only_committed: u64,
    pub aborted: u64,
    pub conflicts: u64,
    pub storage_failures: u64,
    pub active: usize,
}

#[derive(Debug, Default)]
struct Counters {
    begun: AtomicU64,
    committed: AtomicU64,
    read_only_committed: AtomicU64,
    aborted: AtomicU64,
    conflicts: AtomicU64,
    storage_failures: AtomicU64,
}

/// What a successful pass through the critical section produced
struct CommitOutcome {
    commit_ts: Timestamp,
    /// The automatic collection interval elapsed with this commit
    gc_due: bool,
}

/// State only touched while the commit guard is held
#[derive(Debug, Default)]
struct CommitLedger {
    commits_since_gc: u64,
}

/// State shared by the manager and every transaction it created
pub(crate) struct EngineCore {
    store: Arc<dyn VersionStore>,
    authority: Arc<TimestampAuthority>,
    commit_guard: Mutex<CommitLedger>,
    install_gate: RwLock<()>,
    registry: RwLock<HashMap<TransactionId, TransactionInfo>>,
    next_txn_id: AtomicU64,
    counters: Counters,
    gc_interval_commits: Option<u64>,
}

impl EngineCore {
    pub(crate) fn store(&self) -> &dyn VersionStore {
        self.store.as_ref()
    }

    pub(crate) fn update_status(&self, id: TransactionId, status: TransactionStatus) {
        if let Some(info) = self.registry.write().get_mut(&id) {
            info.status = status;
        }
    }

    /// Drop a finished transaction from the registry
    pub(crate) fn unregister(&self, id: TransactionId, terminal: TransactionStatus) {
        self.registry.write().remove(&id);
        if terminal == TransactionStatus::Aborted {
            self.counters.aborted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_storage_failure(&self) {
        self.counters
            .storage_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Validate and install a transaction's writes
    ///
    /// On success the write set entries carry their assigned version keys.
    /// On failure nothing was installed.
    pub(crate) fn commit(
        &self,
        id: TransactionId,
        begin_ts: Timestamp,
        scan_set: &ScanSet,
        write_set: &mut WriteSet,
    ) -> TransactionResult<Timestamp> {
        let result = self.try_commit(begin_ts, scan_set, write_set);

        match &result {
            Ok(outcome) if write_set.is_empty() => {
                self.counters
                    .read_only_committed
                    .fetch_add(1, Ordering::Relaxed);
                log::debug!("{} committed read-only at {}", id, outcome.commit_ts);
            }
            Ok(outcome) => {
                self.counters.committed.fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "{} committed {} write(s) at {}",
                    id,
                    write_set.len(),
                    outcome.commit_ts
                );
            }
            Err(TransactionError::Conflict(info)) => {
                self.counters.conflicts.fetch_add(1, Ordering::Relaxed);
                log::debug!("{} aborted: {}", id, info);
            }
            Err(TransactionError::StorageUnavailable(reason)) => {
                self.record_storage_failure();
                log::warn!("{} aborted during commit: {}", id, reason);
            }
            Err(e) => log::warn!("{} failed to commit: {}", id, e),
        }

        let outcome = result?;
        if outcome.gc_due {
            match self.collect_garbage() {
                Ok(removed) => log::info!("Automatic GC removed {} version(s)", removed),
                Err(e) => log::warn!("Automatic GC failed: {}", e),
            }
        }
        Ok(outcome.commit_ts)
    }

    fn try_commit(
        &self,
        begin_ts: Timestamp,
        scan_set: &ScanSet,
        write_set: &mut WriteSet,
    ) -> TransactionResult<CommitOutcome> {
        let validator = Validator::new(self.store.as_ref());

        // Phase 1: optimistic pre-check, no locks
        let upper_ts = self.authority.current();
        if let Validation::Conflict(info) =
            validator.validate(scan_set, write_set, begin_ts, upper_ts)?
        {
            return Err(TransactionError::Conflict(info));
        }

        // Phase 2: nothing else can install until the guard drops
        let mut ledger = self.commit_guard.lock();

        let upper_ts = self.authority.current();
        if let Validation::Conflict(info) =
            validator.validate(scan_set, write_set, begin_ts, upper_ts)?
        {
            return Err(TransactionError::Conflict(info));
        }

        if write_set.is_empty() {
            return Ok(CommitOutcome {
                commit_ts: begin_ts,
                gc_due: false,
            });
        }

        // Version keys only depend on chains the guard has frozen
        let mut entries = Vec::with_capacity(write_set.len());
        for write in write_set.iter() {
            let version_key = self
                .store
                .latest_version(&write.key)?
                .map_or(0, |latest| latest.version_key + 1);
            entries.push(VersionEntry::open(
                write.key.clone(),
                version_key,
                write.payload.clone(),
                0,
            ));
        }

        let commit_ts = {
            let _gate = self.install_gate.write();
            let commit_ts = self.authority.next()?;
            for entry in &mut entries {
                entry.begin_ts = commit_ts;
            }
            self.store.install(&entries)?;
            commit_ts
        };

        for (write, entry) in write_set.iter_mut().zip(&entries) {
            write.version_key = Some(entry.version_key);
        }

        ledger.commits_since_gc += 1;
        let gc_due = self
            .gc_interval_commits
            .map_or(false, |interval| ledger.commits_since_gc >= interval);
        if gc_due {
            ledger.commits_since_gc = 0;
        }

        Ok(CommitOutcome { commit_ts, gc_due })
    }

    /// Smallest begin timestamp any present or future snapshot can have
    fn low_watermark(&self) -> Timestamp {
        self.registry
            .read()
            .values()
            .map(|info| info.begin_ts)
            .min()
            .unwrap_or_else(|| self.authority.current())
    }

    /// Prune versions ending at or below the low watermark
    ///
    /// Never holds the commit guard, so commits proceed during the scan.
    fn collect_garbage(&self) -> TransactionResult<usize> {
        // Holding the gate keeps a begin from drawing a timestamp it has not
        // registered yet
        let watermark = {
            let _gate = self.install_gate.write();
            self.low_watermark()
        };
        Ok(self.store.prune(watermark)?)
    }
}

/// Transaction manager handles the lifecycle of all transactions
///
/// Cloning is cheap; clones share the same store, timestamp authority and
/// commit critical section.
#[derive(Clone)]
pub struct TransactionManager {
    core: Arc<EngineCore>,
}

impl TransactionManager {
    /// Create a manager over `store`, resuming timestamps after the newest stored one
    pub fn new(store: Arc<dyn VersionStore>) -> TransactionResult<Self> {
        let authority = TimestampAuthority::resume_from(store.max_timestamp()?);
        Ok(Self::with_authority(store, Arc::new(authority)))
    }

    /// Create a manager with an explicitly supplied timestamp authority
    pub fn with_authority(
        store: Arc<dyn VersionStore>,
        authority: Arc<TimestampAuthority>,
    ) -> Self {
        Self::build(store, authority, None)
    }

    /// Manager over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::with_authority(
            Arc::new(ChainedVersionStore::in_memory()),
            Arc::new(TimestampAuthority::new()),
        )
    }

    /// Build the store described by `config` and a manager over it
    pub fn open(config: &EngineConfig) -> TransactionResult<Self> {
        config.validate().map_err(TransactionError::Configuration)?;

        let path = config.data_path.clone().unwrap_or_default();
        let driver = create_storage_driver(config.storage_type, path)?;
        let storage_type = driver.storage_type();
        log::debug!(
            "{} driver holds trees {:?}",
            storage_type,
            driver.list_trees()?
        );
        let store = ChainedVersionStore::open(driver, &config.version_tree)?;

        let last_issued = store.max_timestamp()?.max(config.initial_timestamp);
        log::info!(
            "Opened {} version store, resuming timestamps after {}",
            storage_type,
            last_issued
        );

        Ok(Self::build(
            Arc::new(store),
            Arc::new(TimestampAuthority::resume_from(last_issued)),
            config.gc_interval_commits,
        ))
    }

    fn build(
        store: Arc<dyn VersionStore>,
        authority: Arc<TimestampAuthority>,
        gc_interval_commits: Option<u64>,
    ) -> Self {
        Self {
            core: Arc::new(EngineCore {
                store,
                authority,
                commit_guard: Mutex::new(CommitLedger::default()),
                install_gate: RwLock::new(()),
                registry: RwLock::new(HashMap::new()),
                next_txn_id: AtomicU64::new(0),
                counters: Counters::default(),
                gc_interval_commits: gc_interval_commits.filter(|&n| n > 0),
            }),
        }
    }

    /// Start a new transaction
    pub fn begin(&self) -> TransactionResult<Transaction> {
        let core = &self.core;
        let id = TransactionId::from_u64(core.next_txn_id.fetch_add(1, Ordering::SeqCst) + 1);

        let begin_ts = {
            let _gate = core.install_gate.read();
            let begin_ts = core.authority.next()?;
            core.registry
                .write()
                .insert(id, TransactionInfo::new(id, begin_ts));
            begin_ts
        };

        core.counters.begun.fetch_add(1, Ordering::Relaxed);
        log::debug!("{} began at {}", id, begin_ts);

        Ok(Transaction::new(id, begin_ts, Arc::clone(core)))
    }

    /// IDs of transactions that have not yet committed or aborted
    pub fn active_transaction_ids(&self) -> Vec<TransactionId> {
        let mut ids: Vec<_> = self.core.registry.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn transaction_info(&self, id: TransactionId) -> Option<TransactionInfo> {
        self.core.registry.read().get(&id).cloned()
    }

    pub fn statistics(&self) -> TransactionStatistics {
        let counters = &self.core.counters;
        TransactionStatistics {
            begun: counters.begun.load(Ordering::Relaxed),
            committed: counters.committed.load(Ordering::Relaxed),
            read_only_committed: counters.read_only_committed.load(Ordering::Relaxed),
            aborted: counters.aborted.load(Ordering::Relaxed),
            conflicts: counters.conflicts.load(Ordering::Relaxed),
            storage_failures: counters.storage_failures.load(Ordering::Relaxed),
            active: self.core.registry.read().len(),
        }
    }

    /// Last timestamp issued by the authority
    pub fn current_timestamp(&self) -> Timestamp {
        self.core.authority.current()
    }

    /// Oldest snapshot still in use; the current timestamp when idle
    pub fn low_watermark(&self) -> Timestamp {
        self.core.low_watermark()
    }

    /// Remove versions no present or future snapshot can see
    ///
    /// Returns the number of versions removed.
    pub fn collect_garbage(&self) -> TransactionResult<usize> {
        let removed = self.core.collect_garbage()?;
        log::info!("Garbage collection removed {} version(s)", removed);
        Ok(removed)
    }

    pub fn store(&self) -> Arc<dyn VersionStore> {
        Arc::clone(&self.core.store)
    }

    pub fn authority(&self) -> Arc<TimestampAuthority> {
        Arc::clone(&self.core.authority)
    }

    /// Flush the underlying store
    pub fn flush(&self) -> TransactionResult<()> {
        self.core.store.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("current_timestamp", &self.current_timestamp())
            .field("active", &self.core.registry.read().len())
            .finish()
    }
}
