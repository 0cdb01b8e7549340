//! Sled-backed engine tests
//!
//! Version chains survive a restart and timestamps keep increasing across it.

#[path = "testutils/mod.rs"]
mod testutils;

use graphview::{EngineConfig, StorageType, TransactionError, TransactionManager};
use testutils::test_fixture::{init_logging, vertex, TestFixture};

#[test]
fn test_sled_fixture_commits_and_reads() {
    let fixture = TestFixture::sled().expect("Failed to create sled fixture");
    fixture
        .seed(&[(vertex(1), b"alice"), (vertex(2), b"bob")])
        .unwrap();

    assert_eq!(
        fixture.read_committed(&vertex(1)).unwrap(),
        Some(b"alice".to_vec())
    );
    assert_eq!(
        fixture.read_committed(&vertex(2)).unwrap(),
        Some(b"bob".to_vec())
    );
}

#[test]
fn test_reopen_recovers_versions_and_timestamps() {
    init_logging();
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = EngineConfig::sled(temp_dir.path().join("db"));

    let last_commit = {
        let manager = TransactionManager::open(&config).unwrap();
        let mut last = 0;
        for payload in [&b"v0"[..], b"v1", b"v2"] {
            let mut txn = manager.begin().unwrap();
            txn.write(vertex(1), payload.to_vec()).unwrap();
            last = txn.commit().unwrap();
        }
        manager.flush().unwrap();
        last
    };

    let manager = TransactionManager::open(&config).unwrap();
    assert_eq!(manager.current_timestamp(), last_commit);

    let mut txn = manager.begin().unwrap();
    assert!(txn.begin_ts() > last_commit);
    assert_eq!(txn.read(&vertex(1)).unwrap(), Some(b"v2".to_vec()));
    txn.write(vertex(1), b"v3".to_vec()).unwrap();
    assert!(txn.commit().unwrap() > last_commit);

    let chain = manager.store().version_chain(&vertex(1)).unwrap();
    assert_eq!(
        chain.iter().map(|v| v.version_key).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    assert_eq!(chain.iter().filter(|v| v.is_open()).count(), 1);
}

#[test]
fn test_initial_timestamp_sets_floor() {
    init_logging();
    let config = EngineConfig::in_memory().with_initial_timestamp(1_000);
    let manager = TransactionManager::open(&config).unwrap();

    assert_eq!(manager.begin().unwrap().begin_ts(), 1_001);
}

#[test]
fn test_open_rejects_invalid_config() {
    let config = EngineConfig {
        storage_type: StorageType::Sled,
        data_path: None,
        ..EngineConfig::default()
    };
    assert!(matches!(
        TransactionManager::open(&config),
        Err(TransactionError::Configuration(_))
    ));

    let rocks = EngineConfig {
        storage_type: StorageType::RocksDB,
        data_path: Some("/tmp/unused".into()),
        ..EngineConfig::default()
    };
    assert!(matches!(
        TransactionManager::open(&rocks),
        Err(TransactionError::StorageUnavailable(_))
    ));
}

#[test]
fn test_garbage_collection_on_sled() {
    let fixture = TestFixture::sled().expect("Failed to create sled fixture");
    for n in 0..5u8 {
        fixture.seed(&[(vertex(1), &[n][..])]).unwrap();
    }
    let manager = fixture.manager();
    assert_eq!(manager.store().version_chain(&vertex(1)).unwrap().len(), 5);

    assert_eq!(manager.collect_garbage().unwrap(), 4);
    assert_eq!(fixture.read_committed(&vertex(1)).unwrap(), Some(vec![4]));
    assert_eq!(manager.collect_garbage().unwrap(), 0);
}

#[test]
fn test_automatic_gc_from_config() {
    init_logging();
    let config = EngineConfig::from_json_str(r#"{"gc_interval_commits": 1}"#).unwrap();
    let manager = TransactionManager::open(&config).unwrap();

    for n in 0..3u8 {
        let mut txn = manager.begin().unwrap();
        txn.write(vertex(1), vec![n]).unwrap();
        txn.commit().unwrap();
    }

    // Each collection keeps the version the committing snapshot could see
    let chain = manager.store().version_chain(&vertex(1)).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1].payload, Some(vec![2]));
}
