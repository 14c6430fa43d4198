//! Run coordinator - owns the queue and worker pool lifecycle
//!
//! The coordinator is responsible for:
//! - The pre-flight root existence check
//! - The single-file shortcut (no queue, no pool)
//! - Spawning the worker pool and running the tree walk as producer
//! - The sentinel termination protocol: one shutdown message per worker
//! - Joining workers and assembling the final run report

use crate::applier::PermissionApplier;
use crate::config::RunConfig;
use crate::engine::queue::TaskQueue;
use crate::engine::walker::TreeWalker;
use crate::engine::worker::{aggregate_stats, Worker, WorkerStats};
use crate::error::{FastmodError, Result};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of a completed run
#[derive(Debug)]
pub struct RunReport {
    /// Entries enqueued by the walk (files + directories), or 1 for the
    /// single-file shortcut
    pub total_tasks: u64,

    /// Batches handed to the applier
    pub batches_flushed: u64,

    /// Batches the applier reported as failed
    pub batches_failed: u64,

    /// Paths covered by flushed batches
    pub paths_applied: u64,

    /// Entries skipped because they could not be read during the walk
    pub skipped: u64,

    /// Wall-clock time for the whole run
    pub duration: Duration,
}

impl RunReport {
    /// Tasks processed per second; 0.0 for an instantaneous or empty run
    pub fn tasks_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_tasks as f64 / secs
        } else {
            0.0
        }
    }

    /// Seconds spent per task; 0.0 when no tasks were processed
    pub fn seconds_per_task(&self) -> f64 {
        if self.total_tasks > 0 {
            self.duration.as_secs_f64() / self.total_tasks as f64
        } else {
            0.0
        }
    }

    pub fn has_failures(&self) -> bool {
        self.batches_failed > 0
    }
}

/// Coordinates one run: pool lifecycle, producer walk, final report
pub struct Coordinator {
    config: Arc<RunConfig>,
    applier: Arc<dyn PermissionApplier>,
}

impl Coordinator {
    pub fn new(config: RunConfig, applier: Arc<dyn PermissionApplier>) -> Self {
        Self {
            config: Arc::new(config),
            applier,
        }
    }

    /// Run to completion. Fails fast if the root does not exist; once workers
    /// are up, only queue breakage is fatal - applier failures are counted,
    /// not raised.
    pub fn run(self) -> Result<RunReport> {
        // Pre-flight: must happen before any worker is spawned
        let metadata = fs::symlink_metadata(&self.config.path).map_err(|_| {
            FastmodError::PathNotFound {
                path: self.config.path.clone(),
            }
        })?;

        if metadata.is_dir() {
            self.run_tree()
        } else {
            self.run_single_file()
        }
    }

    /// Shortcut for a non-directory target: one synchronous batch of one,
    /// bypassing the queue and pool entirely
    fn run_single_file(self) -> Result<RunReport> {
        let start = Instant::now();
        let paths = vec![self.config.path.clone()];
        let mut failed = false;

        if let Some(group) = &self.config.group {
            if let Err(err) = self.applier.apply_ownership(&paths, group) {
                warn!(group = %group, error = %err, "ownership change failed");
                failed = true;
            }
        }

        if let Err(err) = self.applier.apply_permissions(&paths, &self.config.file_perms) {
            warn!(perms = %self.config.file_perms, error = %err, "permission change failed");
            failed = true;
        }

        Ok(RunReport {
            total_tasks: 1,
            batches_flushed: 1,
            batches_failed: failed as u64,
            paths_applied: 1,
            skipped: 0,
            duration: start.elapsed(),
        })
    }

    fn run_tree(self) -> Result<RunReport> {
        let start = Instant::now();

        info!(
            path = %self.config.path.display(),
            workers = self.config.worker_count,
            block_size = self.config.block_size,
            "starting run"
        );

        let queue = TaskQueue::new();

        // Spawn the pool before producing: workers block on the empty queue
        let mut workers = Vec::with_capacity(self.config.worker_count);
        for id in 0..self.config.worker_count {
            workers.push(Worker::spawn(
                id,
                Arc::clone(&self.config),
                queue.receiver(),
                Arc::clone(&self.applier),
            )?);
        }

        // Produce synchronously from this thread
        let sender = queue.sender();
        let walker = TreeWalker::new(
            &self.config.path,
            self.config.file_perms.as_str(),
            self.config.dir_perms.as_str(),
        );
        let totals = walker.run(&sender)?;

        // Exactly one termination sentinel per worker
        for _ in &workers {
            sender.send_shutdown()?;
        }

        // Join, then aggregate - counters are final once every thread is done
        let stats: Vec<Arc<WorkerStats>> = workers.iter().map(Worker::stats).collect();
        for worker in workers {
            if let Err(err) = worker.join() {
                warn!(error = %err, "worker failed to join cleanly");
            }
        }
        let (batches_flushed, batches_failed, paths_applied) = aggregate_stats(&stats);

        let duration = start.elapsed();
        let report = RunReport {
            total_tasks: totals.enqueued,
            batches_flushed,
            batches_failed,
            paths_applied,
            skipped: totals.skipped,
            duration,
        };

        info!(
            total = report.total_tasks,
            batches = report.batches_flushed,
            failed = report.batches_failed,
            duration_ms = duration.as_millis() as u64,
            "run completed"
        );

        Ok(report)
    }
}
