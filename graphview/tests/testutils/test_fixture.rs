//! Test fixture for GraphView integration tests
//!
//! Uses only the public crate API.

use graphview::{
    EngineConfig, Payload, RecordKey, Timestamp, TransactionManager, TransactionResult,
};

/// Route `log` output through the test harness; safe to call repeatedly
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn account(n: i64) -> RecordKey {
    RecordKey::new("account", n)
}

pub fn vertex(n: i64) -> RecordKey {
    RecordKey::new("vertex", n)
}

/// Isolated engine instance
pub struct TestFixture {
    manager: TransactionManager,
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestFixture {
    /// Fixture over an in-memory store
    pub fn new() -> Self {
        init_logging();
        Self {
            manager: TransactionManager::in_memory(),
            _temp_dir: None,
        }
    }

    /// Fixture over a Sled store in a fresh temporary directory
    pub fn sled() -> Result<Self, Box<dyn std::error::Error>> {
        init_logging();
        let temp_dir = tempfile::tempdir()?;
        let config = EngineConfig::sled(temp_dir.path().join("graphview_test"));
        let manager = TransactionManager::open(&config)?;
        Ok(Self {
            manager,
            _temp_dir: Some(temp_dir),
        })
    }

    pub fn manager(&self) -> &TransactionManager {
        &self.manager
    }

    /// Commit `records` in a single transaction
    pub fn seed(&self, records: &[(RecordKey, &[u8])]) -> TransactionResult<Timestamp> {
        let mut txn = self.manager.begin()?;
        for (key, payload) in records {
            txn.write(key.clone(), payload.to_vec())?;
        }
        txn.commit()
    }

    /// Latest committed payload of `key`, read by a throwaway transaction
    pub fn read_committed(&self, key: &RecordKey) -> TransactionResult<Option<Payload>> {
        let mut txn = self.manager.begin()?;
        let payload = txn.read(key)?;
        txn.abort()?;
        Ok(payload)
    }
}
