//! The external permission-change primitive
//!
//! The engine never composes command strings itself: workers hand whole
//! batches to a [`PermissionApplier`] and the production implementation execs
//! the system chmod/chgrp binaries with the paths as plain argv entries, so
//! quoting and escaping never enter the picture. Tests substitute a recording
//! fake.

use crate::error::ApplierError;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Applies a permission or ownership directive to a batch of paths in one
/// invocation. Batching is the entire point: calling this per path would
/// defeat the design.
pub trait PermissionApplier: Send + Sync {
    /// Apply one chmod-style permission string to every path in the batch
    fn apply_permissions(&self, paths: &[PathBuf], perms: &str) -> Result<(), ApplierError>;

    /// Change group ownership of every path in the batch
    fn apply_ownership(&self, paths: &[PathBuf], group: &str) -> Result<(), ApplierError>;
}

/// Production applier that shells out to chmod(1) and chgrp(1).
///
/// Quiet mode passes `-f`, matching both tools' "suppress most error
/// messages" flag.
pub struct ChmodApplier {
    quiet: bool,
}

impl ChmodApplier {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn run_batch(&self, program: &str, directive: &str, paths: &[PathBuf]) -> Result<(), ApplierError> {
        let mut cmd = Command::new(program);
        if self.quiet {
            cmd.arg("-f");
        }
        cmd.arg(directive);
        cmd.args(paths);

        debug!(program, directive, paths = paths.len(), "running batch");

        let status = cmd.status().map_err(|e| ApplierError::LaunchFailed {
            command: program.to_string(),
            reason: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ApplierError::NonZeroExit {
                command: program.to_string(),
                code: status.code().unwrap_or(-1),
                paths: paths.len(),
            })
        }
    }
}

impl PermissionApplier for ChmodApplier {
    fn apply_permissions(&self, paths: &[PathBuf], perms: &str) -> Result<(), ApplierError> {
        self.run_batch("chmod", perms, paths)
    }

    fn apply_ownership(&self, paths: &[PathBuf], group: &str) -> Result<(), ApplierError> {
        self.run_batch("chgrp", group, paths)
    }
}
