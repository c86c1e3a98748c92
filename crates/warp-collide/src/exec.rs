// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Executor seam for data-parallel batch jobs.
//!
//! The collision core never owns a thread pool. Builds and pair searches hand
//! an indexed batch to a [`JobExecutor`], which runs every job exactly once on
//! some worker and returns the results ordered by job index. Merges therefore
//! never depend on which worker ran what, or in which order.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stable index of the worker running a job, in `0..worker_count()`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerIndex(pub usize);

/// Runs an indexed batch of jobs, N-way parallel.
pub trait JobExecutor: Sync {
    /// Number of distinct worker indices this executor hands out.
    fn worker_count(&self) -> usize;

    /// Runs `job(worker, job_index)` for every `job_index` in `0..job_count`
    /// and returns the results in job-index order.
    ///
    /// A worker index is never used by two jobs at the same time.
    fn map_jobs<R, F>(&self, job_count: usize, job: F) -> Vec<R>
    where
        R: Send,
        F: Fn(WorkerIndex, usize) -> R + Sync;
}

/// Runs every job on the calling thread as worker 0.
#[derive(Debug, Default, Copy, Clone)]
pub struct SerialExecutor;

impl JobExecutor for SerialExecutor {
    fn worker_count(&self) -> usize {
        1
    }

    fn map_jobs<R, F>(&self, job_count: usize, job: F) -> Vec<R>
    where
        R: Send,
        F: Fn(WorkerIndex, usize) -> R + Sync,
    {
        (0..job_count).map(|i| job(WorkerIndex(0), i)).collect()
    }
}

/// Spawns scoped threads per batch; workers claim jobs from an atomic counter.
#[derive(Debug, Copy, Clone)]
pub struct ScopedThreadExecutor {
    workers: NonZeroUsize,
}

impl ScopedThreadExecutor {
    /// Executor with `workers` threads.
    pub fn new(workers: NonZeroUsize) -> Self {
        Self { workers }
    }

    /// Executor sized to the machine's available parallelism.
    pub fn from_available_parallelism() -> Self {
        Self::new(std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }
}

impl JobExecutor for ScopedThreadExecutor {
    fn worker_count(&self) -> usize {
        self.workers.get()
    }

    fn map_jobs<R, F>(&self, job_count: usize, job: F) -> Vec<R>
    where
        R: Send,
        F: Fn(WorkerIndex, usize) -> R + Sync,
    {
        let workers = self.workers.get().min(job_count);
        if workers <= 1 {
            return SerialExecutor.map_jobs(job_count, job);
        }

        let next_job = AtomicUsize::new(0);
        let per_worker: Vec<Vec<(usize, R)>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    let next_job = &next_job;
                    let job = &job;
                    s.spawn(move || {
                        let mut out = Vec::new();
                        loop {
                            let i = next_job.fetch_add(1, Ordering::Relaxed);
                            if i >= job_count {
                                break;
                            }
                            out.push((i, job(WorkerIndex(w), i)));
                        }
                        out
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(out) => out,
                    Err(e) => std::panic::resume_unwind(e),
                })
                .collect()
        });

        let mut slots: Vec<Option<R>> = (0..job_count).map(|_| None).collect();
        for (i, r) in per_worker.into_iter().flatten() {
            slots[i] = Some(r);
        }
        debug_assert!(slots.iter().all(Option::is_some), "every job ran once");
        slots.into_iter().flatten().collect()
    }
}
