//! Worker thread logic for batched permission changes
//!
//! Each worker:
//! - Pulls tasks from the shared queue
//! - Buffers resolved paths into per-permission-string groups (set semantics,
//!   so a path enqueued twice lands in a group once)
//! - Flushes a group to the applier as soon as it reaches the block size
//! - On shutdown, drains every remaining non-empty group
//!
//! When group ownership is configured, chgrp runs before chmod for each
//! batch: group-dependent permission bits such as setgid must see the final
//! group.
//!
//! A failed batch is recorded and logged, never fatal - the rest of the tree
//! still gets processed.

use crate::applier::PermissionApplier;
use crate::config::RunConfig;
use crate::engine::queue::{Message, TaskReceiver};
use crate::error::WorkerError;
use std::collections::{HashMap, HashSet};
use std::mem;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Batches handed to the applier (failed ones included)
    pub batches_flushed: AtomicU64,

    /// Batches for which the applier reported failure
    pub batches_failed: AtomicU64,

    /// Paths covered by flushed batches
    pub paths_applied: AtomicU64,
}

impl WorkerStats {
    fn record_flush(&self, paths: u64, failed: bool) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.paths_applied.fetch_add(paths, Ordering::Relaxed);
        if failed {
            self.batches_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// A worker thread that buffers and flushes permission batches
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread bound to the queue
    pub fn spawn(
        id: usize,
        config: Arc<RunConfig>,
        receiver: TaskReceiver,
        applier: Arc<dyn PermissionApplier>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("fastmod-{id}"))
            .spawn(move || worker_loop(id, &config, &receiver, applier.as_ref(), &stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Shared handle to this worker's counters
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| WorkerError::Panicked { id: self.id })
        } else {
            Ok(())
        }
    }
}

/// Main worker loop: buffer until block size, flush, drain on shutdown
fn worker_loop(
    id: usize,
    config: &RunConfig,
    receiver: &TaskReceiver,
    applier: &dyn PermissionApplier,
    stats: &WorkerStats,
) {
    debug!(worker = id, block_size = config.block_size, "worker starting");

    let mut groups: HashMap<String, HashSet<PathBuf>> = HashMap::new();

    loop {
        match receiver.recv() {
            Some(Message::Task(task)) => {
                let path = task.resolved_path();
                let perms = task.perms;
                let group = groups.entry(perms.clone()).or_default();
                group.insert(path);

                if group.len() >= config.block_size {
                    let batch = mem::take(group);
                    flush_batch(id, &perms, batch, config.group.as_deref(), applier, stats);
                }
            }
            // Disconnection means every sender is gone; treat like shutdown
            Some(Message::Shutdown) | None => break,
        }
    }

    // Drain: whatever is still buffered goes out now, order across
    // permission strings irrelevant
    for (perms, batch) in groups {
        if !batch.is_empty() {
            flush_batch(id, &perms, batch, config.group.as_deref(), applier, stats);
        }
    }

    debug!(
        worker = id,
        batches = stats.batches_flushed.load(Ordering::Relaxed),
        paths = stats.paths_applied.load(Ordering::Relaxed),
        failed = stats.batches_failed.load(Ordering::Relaxed),
        "worker shutting down"
    );
}

/// Hand one batch to the applier: chgrp first when configured, then chmod
fn flush_batch(
    worker: usize,
    perms: &str,
    batch: HashSet<PathBuf>,
    group: Option<&str>,
    applier: &dyn PermissionApplier,
    stats: &WorkerStats,
) {
    let paths: Vec<PathBuf> = batch.into_iter().collect();
    let mut failed = false;

    if let Some(group_name) = group {
        if let Err(err) = applier.apply_ownership(&paths, group_name) {
            warn!(worker, group = %group_name, error = %err, "ownership batch failed");
            failed = true;
        }
    }

    if let Err(err) = applier.apply_permissions(&paths, perms) {
        warn!(worker, perms, error = %err, "permission batch failed");
        failed = true;
    }

    stats.record_flush(paths.len() as u64, failed);
}

/// Aggregate counters across the pool: (flushed, failed, paths)
pub fn aggregate_stats(stats: &[Arc<WorkerStats>]) -> (u64, u64, u64) {
    let mut flushed = 0u64;
    let mut failed = 0u64;
    let mut paths = 0u64;

    for s in stats {
        flushed += s.batches_flushed.load(Ordering::Relaxed);
        failed += s.batches_failed.load(Ordering::Relaxed);
        paths += s.paths_applied.load(Ordering::Relaxed);
    }

    (flushed, failed, paths)
}
