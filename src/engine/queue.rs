//! Task queue shared between the tree walk and the worker pool
//!
//! A single producer pushes one task per filesystem entry; N workers consume.
//! The channel is unbounded so the producer never blocks; memory grows with
//! tree size, which the design accepts in exchange for a simple producer.
//!
//! Termination uses a sentinel protocol: the coordinator pushes exactly one
//! [`Message::Shutdown`] per worker after the walk finishes, and each worker
//! stops consuming after seeing one.

use crate::error::WorkerError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A single permission directive for one filesystem entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Directory the entry lives in
    pub dir: PathBuf,

    /// Entry name within `dir`; `None` means the directory itself
    pub entry: Option<OsString>,

    /// Opaque chmod-style permission string
    pub perms: String,
}

impl Task {
    /// Task for a directory's own permission change
    pub fn for_directory(dir: impl Into<PathBuf>, perms: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            entry: None,
            perms: perms.into(),
        }
    }

    /// Task for a file (or other non-directory entry) within `dir`
    pub fn for_file(
        dir: impl Into<PathBuf>,
        entry: impl Into<OsString>,
        perms: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            entry: Some(entry.into()),
            perms: perms.into(),
        }
    }

    /// The full path this task applies to
    pub fn resolved_path(&self) -> PathBuf {
        match &self.entry {
            Some(name) => self.dir.join(name),
            None => self.dir.clone(),
        }
    }
}

/// What workers pull off the queue
#[derive(Debug, Clone)]
pub enum Message {
    /// A permission directive to buffer
    Task(Task),

    /// Termination sentinel; consume one, then drain and exit
    Shutdown,
}

/// Statistics for the task queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total tasks enqueued (shutdown sentinels not counted)
    pub enqueued: AtomicU64,

    /// Total tasks dequeued
    pub dequeued: AtomicU64,
}

impl QueueStats {
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dequeued_count(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }
}

/// Unbounded multi-consumer FIFO carrying tasks and shutdown sentinels
pub struct TaskQueue {
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    stats: Arc<QueueStats>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Get a sender handle (one for the producer)
    pub fn sender(&self) -> TaskSender {
        TaskSender {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get a receiver handle (clone for each worker)
    pub fn receiver(&self) -> TaskReceiver {
        TaskReceiver {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for pushing tasks onto the queue
#[derive(Clone)]
pub struct TaskSender {
    sender: Sender<Message>,
    stats: Arc<QueueStats>,
}

impl TaskSender {
    /// Enqueue a task. Never blocks (unbounded channel).
    pub fn send(&self, task: Task) -> Result<(), WorkerError> {
        self.sender
            .send(Message::Task(task))
            .map_err(|_| WorkerError::QueueSendFailed)?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Enqueue one termination sentinel
    pub fn send_shutdown(&self) -> Result<(), WorkerError> {
        self.sender
            .send(Message::Shutdown)
            .map_err(|_| WorkerError::QueueSendFailed)
    }
}

/// Handle for pulling messages off the queue
#[derive(Clone)]
pub struct TaskReceiver {
    receiver: Receiver<Message>,
    stats: Arc<QueueStats>,
}

impl TaskReceiver {
    /// Blocks until a message is available. Returns `None` if every sender
    /// is gone, which workers treat the same as a shutdown sentinel.
    pub fn recv(&self) -> Option<Message> {
        match self.receiver.recv() {
            Ok(msg) => {
                if matches!(msg, Message::Task(_)) {
                    self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                }
                Some(msg)
            }
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_resolved_path_self_marker() {
        let task = Task::for_directory("/data/sub", "u+rwx");
        assert_eq!(task.resolved_path(), Path::new("/data/sub"));
        assert!(task.entry.is_none());
    }

    #[test]
    fn test_resolved_path_file_entry() {
        let task = Task::for_file("/data/sub", "report.txt", "u+rw");
        assert_eq!(task.resolved_path(), Path::new("/data/sub/report.txt"));
    }

    #[test]
    fn test_queue_roundtrip() {
        let queue = TaskQueue::new();
        let sender = queue.sender();
        let receiver = queue.receiver();

        sender.send(Task::for_directory("/a", "u+rwx")).unwrap();
        assert_eq!(queue.len(), 1);

        match receiver.recv() {
            Some(Message::Task(task)) => assert_eq!(task.dir, Path::new("/a")),
            other => panic!("expected task, got {other:?}"),
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_shutdown_sentinel_delivery() {
        let queue = TaskQueue::new();
        let sender = queue.sender();
        let receiver = queue.receiver();

        sender.send_shutdown().unwrap();
        assert!(matches!(receiver.recv(), Some(Message::Shutdown)));
    }

    #[test]
    fn test_queue_stats_count_tasks_only() {
        let queue = TaskQueue::new();
        let sender = queue.sender();
        let receiver = queue.receiver();

        sender.send(Task::for_directory("/a", "u+rwx")).unwrap();
        sender.send(Task::for_file("/a", "f", "u+rw")).unwrap();
        sender.send_shutdown().unwrap();

        receiver.recv().unwrap();
        receiver.recv().unwrap();
        receiver.recv().unwrap();

        let stats = queue.stats();
        assert_eq!(stats.enqueued_count(), 2);
        assert_eq!(stats.dequeued_count(), 2);
    }

    #[test]
    fn test_recv_none_after_senders_dropped() {
        let queue = TaskQueue::new();
        let receiver = queue.receiver();
        drop(queue);
        assert!(receiver.recv().is_none());
    }
}
