//! Tree-walking producer
//!
//! Walks the root depth-first and emits one task per directory (for the
//! directory itself) and one per non-directory entry. Downstream grouping is
//! keyed by permission string, not path, so no ordering is promised beyond
//! what the walk happens to produce.
//!
//! Symlinks are not followed; they receive file tasks like any other
//! non-directory entry. Unreadable subtrees are logged and skipped - only a
//! missing root is fatal, and that is checked by the coordinator before any
//! worker exists.

use crate::engine::queue::{Task, TaskSender};
use crate::error::WorkerError;
use std::path::PathBuf;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Counts accumulated over one walk
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkTotals {
    /// Tasks handed to the queue
    pub enqueued: u64,

    /// Entries skipped because they could not be read
    pub skipped: u64,
}

/// Producer that turns a directory tree into a stream of tasks
pub struct TreeWalker {
    root: PathBuf,
    file_perms: String,
    dir_perms: String,
}

impl TreeWalker {
    pub fn new(
        root: impl Into<PathBuf>,
        file_perms: impl Into<String>,
        dir_perms: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            file_perms: file_perms.into(),
            dir_perms: dir_perms.into(),
        }
    }

    /// Walk the tree, pushing every entry onto the queue. Runs on the calling
    /// thread; the sequence is finite and not restartable.
    pub fn run(&self, sender: &TaskSender) -> Result<WalkTotals, WorkerError> {
        let mut totals = WalkTotals::default();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    totals.skipped += 1;
                    continue;
                }
            };

            let task = if entry.file_type().is_dir() {
                Task::for_directory(entry.path(), self.dir_perms.as_str())
            } else {
                match entry.path().parent() {
                    Some(dir) => Task::for_file(dir, entry.file_name(), self.file_perms.as_str()),
                    // Parentless entries can only be a non-directory walk root
                    None => Task::for_directory(entry.path(), self.file_perms.as_str()),
                }
            };

            sender.send(task)?;
            totals.enqueued += 1;
        }

        debug!(
            enqueued = totals.enqueued,
            skipped = totals.skipped,
            root = %self.root.display(),
            "walk finished"
        );

        Ok(totals)
    }
}
