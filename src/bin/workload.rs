//! ChronoKV Workload Driver
//!
//! Runs concurrent read-increment-write transactions against a store and
//! checks that no update was lost.

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chronokv::{ChronoError, Config, DetectorKind, TransactionCoordinator, TxnId};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// ChronoKV workload driver
#[derive(Parser, Debug)]
#[command(name = "chronokv-workload")]
#[command(about = "Concurrent counter workload for the ChronoKV MVCC store")]
#[command(version)]
struct Args {
    /// Conflict detector: active-set or timestamp
    #[arg(short, long, default_value = "active-set")]
    detector: DetectorKind,

    /// Worker threads
    #[arg(short, long, default_value = "8")]
    threads: usize,

    /// Committed increments per thread
    #[arg(short = 'n', long, default_value = "1000")]
    txns_per_thread: usize,

    /// Number of counter keys shared by all threads
    #[arg(short, long, default_value = "4")]
    keys: usize,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chronokv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    if args.keys == 0 {
        tracing::error!("--keys must be at least 1");
        process::exit(2);
    }

    tracing::info!("ChronoKV workload v{}", chronokv::VERSION);
    tracing::info!(
        "Detector: {}, threads: {}, increments/thread: {}, keys: {}",
        args.detector,
        args.threads,
        args.txns_per_thread,
        args.keys
    );

    let config = Config::builder()
        .detector(args.detector)
        .registry_capacity(args.threads)
        .build();
    let db = TransactionCoordinator::open(config);
    let retries = AtomicU64::new(0);

    let started = Instant::now();
    let outcome = crossbeam::scope(|scope| {
        for worker in 0..args.threads {
            let db = &db;
            let retries = &retries;
            let args = &args;
            scope.spawn(move |_| run_worker(db, worker, args, retries));
        }
    });
    let elapsed = started.elapsed();

    if outcome.is_err() {
        tracing::error!("A worker thread panicked");
        process::exit(1);
    }

    let stats = db.stats();
    let expected = (args.threads * args.txns_per_thread) as u64;
    let total: u64 = (0..args.keys)
        .map(|k| {
            db.read_latest(counter_key(k).as_bytes())
                .and_then(|v| parse_counter(&v))
                .unwrap_or(0)
        })
        .sum();

    tracing::info!(
        "Finished in {:.2?}: {} committed, {} aborted, {} conflicts, {} retries",
        elapsed,
        stats.committed,
        stats.aborted,
        stats.conflicts,
        retries.load(Ordering::Relaxed)
    );
    tracing::info!("Versions stored: {} across {} keys", stats.versions, stats.keys);

    if total != expected {
        tracing::error!("Lost updates: counters sum to {}, expected {}", total, expected);
        process::exit(1);
    }

    tracing::info!("Counters sum to {} (no lost updates)", total);
}

/// Commit `txns_per_thread` increments, retrying each with a fresh
/// transaction until it commits
fn run_worker(db: &TransactionCoordinator, worker: usize, args: &Args, retries: &AtomicU64) {
    for i in 0..args.txns_per_thread {
        let key = counter_key((worker * 31 + i) % args.keys);

        loop {
            let id = db.begin();
            match increment(db, id, &key) {
                Ok(()) => break,
                Err(e) if e.is_conflict() => {
                    db.rollback(id);
                    retries.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::error!("Worker {} failed: {}", worker, e);
                    db.rollback(id);
                    return;
                }
            }
        }
    }

    tracing::debug!("Worker {} done", worker);
}

fn increment(db: &TransactionCoordinator, id: TxnId, key: &str) -> Result<(), ChronoError> {
    let current = db
        .read(id, key.as_bytes())?
        .and_then(|v| parse_counter(&v))
        .unwrap_or(0);

    db.write(id, key.to_string(), (current + 1).to_string())?;
    db.commit(id)?;
    Ok(())
}

fn counter_key(k: usize) -> String {
    format!("counter:{}", k)
}

fn parse_counter(raw: &[u8]) -> Option<u64> {
    std::str::from_utf8(raw).ok()?.parse().ok()
}
