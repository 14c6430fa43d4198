//! fastmod - Multithreaded utility for recursively changing permissions
//!
//! Recursively applies permission (and optionally group ownership) changes
//! across a directory tree. The cost of the underlying chmod/chgrp
//! invocation is amortized by batching: workers group paths by their exact
//! permission string and flush a whole batch through one process invocation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Coordinator                          │
//! │   pre-flight check · pool lifecycle · final report        │
//! └──────────────────────────┬───────────────────────────────┘
//!                            │
//!          TreeWalker (producer, runs on the main thread)
//!                            │ one Task per entry
//!                            ▼
//!               ┌─────────────────────────┐
//!               │        TaskQueue        │
//!               │  unbounded, blocking    │
//!               └────────────┬────────────┘
//!        ┌───────────────────┼───────────────────┐
//!  ┌─────▼────┐        ┌─────▼────┐        ┌─────▼────┐
//!  │ Worker 1 │        │ Worker 2 │  ...   │ Worker N │
//!  └─────┬────┘        └─────┬────┘        └─────┬────┘
//!        │   batches keyed by permission string   │
//!        ▼                   ▼                    ▼
//!            PermissionApplier (chgrp → chmod)
//! ```
//!
//! Termination uses a sentinel protocol: after the walk, the coordinator
//! pushes one shutdown message per worker; each worker drains its remaining
//! batches after consuming one.
//!
//! # Example
//!
//! ```bash
//! # Set the current tree to baseline perms (user rw, group/others read-only)
//! fastmod .
//!
//! # Read-only everything, group ownership to your primary group
//! fastmod . --preset readonly -G
//!
//! # Custom flags for files and directories, 8 workers
//! fastmod /data 'u+rw,o-rwx:u+rwx,o-rwx' -w 8
//! ```

pub mod applier;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;

pub use applier::{ChmodApplier, PermissionApplier};
pub use config::{CliArgs, RunConfig};
pub use engine::{Coordinator, RunReport};
pub use error::{FastmodError, Result};
