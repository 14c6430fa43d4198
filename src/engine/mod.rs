//! Producer/worker batching engine
//!
//! One producer walks the tree while a fixed pool of workers buffers the
//! resulting tasks into per-permission-string batches and flushes them to the
//! external chmod/chgrp primitive.
//!
//! ```text
//!                  ┌────────────────────────┐
//!                  │      Coordinator       │
//!                  │  - spawns worker pool  │
//!                  │  - runs the tree walk  │
//!                  └───────────┬────────────┘
//!                              │ Task per entry, then N × Shutdown
//!                              ▼
//!                  ┌────────────────────────┐
//!                  │       TaskQueue        │
//!                  │  (crossbeam unbounded) │
//!                  └───────────┬────────────┘
//!        ┌─────────────────────┼─────────────────────┐
//!  ┌─────▼─────┐         ┌─────▼─────┐         ┌─────▼─────┐
//!  │  Worker 1 │         │  Worker 2 │         │  Worker N │
//!  │ batch map │         │ batch map │         │ batch map │
//!  └─────┬─────┘         └─────┬─────┘         └─────┬─────┘
//!        │ flush at block size │ or on drain         │
//!        ▼                     ▼                     ▼
//!                  chgrp (optional) then chmod
//! ```

pub mod coordinator;
pub mod queue;
pub mod walker;
pub mod worker;

pub use coordinator::{Coordinator, RunReport};
pub use queue::{Message, Task, TaskQueue};
pub use walker::{TreeWalker, WalkTotals};
pub use worker::Worker;
