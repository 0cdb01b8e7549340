/// Benchmark for commit throughput through the commit critical section
///
/// Measures single-threaded commits, contended and uncontended multi-threaded
/// commits, and snapshot reads against the in-memory and sled backends.
use graphview::{EngineConfig, RecordKey, TransactionManager};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;
use tempfile::tempdir;

const COMMITS: u64 = 10_000;
const THREADS: u64 = 4;

fn sequential_commits(manager: &TransactionManager, label: &str) {
    println!("📊 Sequential Commits ({}):", label);
    let start = Instant::now();

    for i in 0..COMMITS {
        let mut txn = manager.begin().expect("Failed to begin");
        txn.write(RecordKey::new("bench", (i % 1_000) as i64), i.to_le_bytes().to_vec())
            .expect("Failed to write");
        txn.commit().expect("Failed to commit");
    }

    let duration = start.elapsed();
    println!("  Commits: {}", COMMITS);
    println!("  Time: {:?}", duration);
    println!(
        "  Throughput: {:.0} commits/sec",
        COMMITS as f64 / duration.as_secs_f64()
    );
    println!();
}

fn parallel_commits(manager: &TransactionManager, key_space: i64, label: &str) {
    println!("📊 Parallel Commits ({}):", label);
    let conflicts = AtomicU64::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let conflicts = &conflicts;
            scope.spawn(move || {
                let mut rng = fastrand::Rng::with_seed(t);
                let mut done = 0;
                while done < COMMITS / THREADS {
                    let mut txn = manager.begin().expect("Failed to begin");
                    let key = RecordKey::new("parallel", rng.i64(0..key_space));
                    let _ = txn.read(&key).expect("Failed to read");
                    txn.write(key, vec![t as u8]).expect("Failed to write");
                    match txn.commit() {
                        Ok(_) => done += 1,
                        Err(e) if e.is_retryable() => {
                            conflicts.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => panic!("Commit failed: {}", e),
                    }
                }
            });
        }
    });

    let duration = start.elapsed();
    println!("  Threads: {}, key space: {}", THREADS, key_space);
    println!("  Time: {:?}", duration);
    println!(
        "  Throughput: {:.0} commits/sec",
        COMMITS as f64 / duration.as_secs_f64()
    );
    println!("  Conflicts retried: {}", conflicts.load(Ordering::Relaxed));
    println!();
}

fn snapshot_reads(manager: &TransactionManager) {
    println!("📊 Snapshot Reads:");
    let iterations: i64 = 50_000;
    let start = Instant::now();

    let mut txn = manager.begin().expect("Failed to begin");
    for i in 0..iterations {
        let _ = txn
            .read(&RecordKey::new("bench", i % 1_000))
            .expect("Failed to read");
    }
    txn.abort().expect("Failed to abort");

    let duration = start.elapsed();
    println!("  Reads: {}", iterations);
    println!("  Time: {:?}", duration);
    println!(
        "  Throughput: {:.0} reads/sec",
        iterations as f64 / duration.as_secs_f64()
    );
    println!();
}

fn main() {
    let _ = env_logger::Builder::from_default_env().try_init();
    println!("=== Commit Throughput Benchmark ===\n");

    let memory = TransactionManager::in_memory();
    sequential_commits(&memory, "memory");
    parallel_commits(&memory, 10_000, "memory, low contention");
    parallel_commits(&memory, 8, "memory, high contention");
    snapshot_reads(&memory);

    let temp_dir = tempdir().unwrap();
    let sled = TransactionManager::open(&EngineConfig::sled(temp_dir.path().join("bench_db")))
        .expect("Failed to open sled engine");
    sequential_commits(&sled, "sled");
    parallel_commits(&sled, 10_000, "sled, low contention");

    let removed = memory.collect_garbage().expect("Failed to collect garbage");
    println!("📊 Garbage Collection:");
    println!("  Versions removed: {}", removed);
    println!("  Statistics: {:?}", memory.statistics());
}
