//! Error types for fastmod
//!
//! Fatal errors (missing root path, bad configuration) abort the run before
//! any worker is spawned and before the summary is printed. Batch application
//! failures are deliberately non-fatal: they are logged and counted so that
//! partial progress on a large tree is never thrown away.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the fastmod application
#[derive(Error, Debug)]
pub enum FastmodError {
    /// The target path does not exist (pre-flight check)
    #[error("no such path as '{}'", .path.display())]
    PathNotFound { path: PathBuf },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid block size
    #[error("invalid block size {size}: must be at least 1")]
    InvalidBlockSize { size: usize },

    /// Unknown preset name
    #[error("preset '{name}' does not exist")]
    UnknownPreset { name: String },

    /// Malformed permission spec
    #[error("invalid permission spec '{spec}': expected FLAGS or file-perms:dir-perms")]
    InvalidPermsSpec { spec: String },

    /// Primary group lookup failed for a bare -G
    #[error("cannot resolve primary group: {reason}")]
    PrimaryGroupUnavailable { reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("worker {id} panicked")]
    Panicked { id: usize },

    /// Worker thread could not be spawned
    #[error("failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Task queue closed with workers still expected to consume
    #[error("task queue closed unexpectedly")]
    QueueSendFailed,
}

/// A failed invocation of the external permission-change primitive.
///
/// Always non-fatal: the worker that observed it records the failure and
/// keeps flushing subsequent batches.
#[derive(Error, Debug)]
pub enum ApplierError {
    /// The command could not be launched at all
    #[error("failed to launch {command}: {reason}")]
    LaunchFailed { command: String, reason: String },

    /// The command ran but reported failure
    #[error("{command} exited with status {code} for a batch of {paths} paths")]
    NonZeroExit {
        command: String,
        code: i32,
        paths: usize,
    },
}

/// Result type alias for FastmodError
pub type Result<T> = std::result::Result<T, FastmodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let cfg_err = ConfigError::InvalidBlockSize { size: 0 };
        let err: FastmodError = cfg_err.into();
        assert!(matches!(err, FastmodError::Config(_)));
    }

    #[test]
    fn test_path_not_found_display() {
        let err = FastmodError::PathNotFound {
            path: PathBuf::from("/missing"),
        };
        assert_eq!(err.to_string(), "no such path as '/missing'");
    }
}
