//! Bounded worker pool
//!
//! Jobs are spread over a dedicated Rayon pool (work stealing acts as the
//! shared, unordered job queue); every job's result travels back over a
//! channel and is handed to a sink on the calling thread, in arrival order.

use crate::error::Result;
use rayon::prelude::*;
use std::sync::mpsc;
use std::thread;
use tracing::debug;

/// At most one worker per this many files
pub const FILES_PER_WORKER: usize = 100;

/// At most this many workers per available processing unit
pub const WORKERS_PER_UNIT: usize = 2;

/// Number of processing units, falling back to one
pub fn available_units() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Clamp a requested worker count to the size of the run
///
/// `requested == 0` means "one per available unit". The result never exceeds
/// one worker per [`FILES_PER_WORKER`] files or [`WORKERS_PER_UNIT`] workers
/// per unit, and is always at least one.
pub fn effective_workers(requested: usize, total_files: usize, available_units: usize) -> usize {
    let requested = if requested == 0 {
        available_units
    } else {
        requested
    };
    let by_files = total_files.div_ceil(FILES_PER_WORKER);
    let by_units = available_units.saturating_mul(WORKERS_PER_UNIT);

    requested.min(by_files).min(by_units).max(1)
}

/// Fixed-size pool running one closure per job
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Build a pool with exactly `workers` threads (at least one)
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("chronosort-worker-{i}"))
            .build()?;
        debug!(workers, "Worker pool ready");
        Ok(Self { pool, workers })
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `work` on every job and feed each result to `sink`
    ///
    /// Returns once every job has produced its result and the sink has seen
    /// it. The return value is the number of results drained.
    pub fn run<T, R, W, S>(&self, jobs: Vec<T>, work: W, mut sink: S) -> usize
    where
        T: Send,
        R: Send,
        W: Fn(T) -> R + Sync,
        S: FnMut(R),
    {
        let (tx, rx) = mpsc::channel::<R>();
        let pool = &self.pool;
        let work = &work;
        let mut drained = 0usize;

        thread::scope(|scope| {
            scope.spawn(move || {
                pool.install(|| {
                    jobs.into_par_iter().for_each_with(tx, |tx, job| {
                        // The receiver outlives every sender
                        let _ = tx.send(work(job));
                    });
                });
            });

            // Ends when the last sender clone is dropped
            for result in rx {
                sink(result);
                drained += 1;
            }
        });

        drained
    }
}
