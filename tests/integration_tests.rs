//! Integration tests for the fastmod batching engine
//!
//! These run entirely against scratch directories with a recording applier;
//! the system chmod/chgrp binaries are never invoked.

use fastmod::config::RunConfig;
use fastmod::engine::Coordinator;
use fastmod::error::{ApplierError, FastmodError};
use fastmod::PermissionApplier;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Ownership(String, Vec<PathBuf>),
    Permissions(String, Vec<PathBuf>),
}

impl Call {
    fn paths(&self) -> &[PathBuf] {
        match self {
            Call::Ownership(_, paths) | Call::Permissions(_, paths) => paths,
        }
    }
}

#[derive(Default)]
struct RecordingApplier {
    calls: Mutex<Vec<Call>>,
    fail_permissions: bool,
}

impl RecordingApplier {
    fn failing() -> Self {
        Self {
            fail_permissions: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl PermissionApplier for RecordingApplier {
    fn apply_permissions(&self, paths: &[PathBuf], perms: &str) -> Result<(), ApplierError> {
        let mut sorted = paths.to_vec();
        sorted.sort();
        self.calls
            .lock()
            .unwrap()
            .push(Call::Permissions(perms.to_string(), sorted));
        if self.fail_permissions {
            Err(ApplierError::NonZeroExit {
                command: "chmod".into(),
                code: 1,
                paths: paths.len(),
            })
        } else {
            Ok(())
        }
    }

    fn apply_ownership(&self, paths: &[PathBuf], group: &str) -> Result<(), ApplierError> {
        let mut sorted = paths.to_vec();
        sorted.sort();
        self.calls
            .lock()
            .unwrap()
            .push(Call::Ownership(group.to_string(), sorted));
        Ok(())
    }
}

fn config_for(path: &Path, workers: usize, block_size: usize, group: Option<&str>) -> RunConfig {
    RunConfig {
        path: path.to_path_buf(),
        // Shared string for files and dirs keeps the whole tree in one group
        file_perms: "u+rw".into(),
        dir_perms: "u+rw".into(),
        group: group.map(String::from),
        worker_count: workers,
        block_size,
        quiet: true,
        verbose: false,
    }
}

fn run_with(
    config: RunConfig,
    applier: Arc<RecordingApplier>,
) -> fastmod::Result<fastmod::RunReport> {
    Coordinator::new(config, applier as Arc<dyn PermissionApplier>).run()
}

fn populate_files(dir: &Path, count: usize) {
    for i in 0..count {
        File::create(dir.join(format!("file_{i:04}"))).unwrap();
    }
}

#[test]
fn test_three_hundred_files_flush_as_128_128_45() {
    let dir = tempdir().unwrap();
    populate_files(dir.path(), 300);

    let applier = Arc::new(RecordingApplier::default());
    // One worker makes batch boundaries deterministic
    let report = run_with(
        config_for(dir.path(), 1, 128, None),
        Arc::clone(&applier),
    )
    .unwrap();

    // 300 files + the directory self-task
    assert_eq!(report.total_tasks, 301);
    assert_eq!(report.paths_applied, 301);

    let mut sizes: Vec<usize> = applier.calls().iter().map(|c| c.paths().len()).collect();
    assert_eq!(sizes.len(), 3);
    // Two eager flushes at the block size, one smaller drain flush last
    assert_eq!(sizes.pop(), Some(45));
    assert_eq!(sizes, vec![128, 128]);
}

#[test]
fn test_empty_directory_single_drain_flush() {
    let dir = tempdir().unwrap();

    let applier = Arc::new(RecordingApplier::default());
    let report = run_with(
        config_for(dir.path(), 2, 128, None),
        Arc::clone(&applier),
    )
    .unwrap();

    assert_eq!(report.total_tasks, 1);
    assert_eq!(report.batches_flushed, 1);

    let calls = applier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].paths(), [dir.path().to_path_buf()]);
}

#[test]
fn test_missing_root_aborts_before_report() {
    let applier = Arc::new(RecordingApplier::default());
    let err = run_with(
        config_for(Path::new("/no/such/tree"), 2, 128, None),
        Arc::clone(&applier),
    )
    .unwrap_err();

    assert!(matches!(err, FastmodError::PathNotFound { .. }));
    assert!(applier.calls().is_empty());
}

#[test]
fn test_single_file_root_bypasses_queue_and_pool() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("lone.txt");
    File::create(&file).unwrap();

    let applier = Arc::new(RecordingApplier::default());
    let report = run_with(config_for(&file, 4, 128, Some("users")), Arc::clone(&applier)).unwrap();

    assert_eq!(report.total_tasks, 1);
    let calls = applier.calls();
    // Ownership strictly before permission, one call each, same single path
    assert_eq!(
        calls,
        vec![
            Call::Ownership("users".into(), vec![file.clone()]),
            Call::Permissions("u+rw".into(), vec![file]),
        ]
    );
}

#[test]
fn test_every_entry_flushed_exactly_once_across_workers() {
    let dir = tempdir().unwrap();
    let mut expected: HashSet<PathBuf> = HashSet::new();
    expected.insert(dir.path().to_path_buf());

    for sub in ["alpha", "beta", "gamma"] {
        let sub_path = dir.path().join(sub);
        fs::create_dir(&sub_path).unwrap();
        populate_files(&sub_path, 13);
        for i in 0..13 {
            expected.insert(sub_path.join(format!("file_{i:04}")));
        }
        expected.insert(sub_path);
    }

    let applier = Arc::new(RecordingApplier::default());
    let report = run_with(config_for(dir.path(), 4, 8, None), Arc::clone(&applier)).unwrap();

    // 3 dirs * 13 files + 3 dirs + root
    assert_eq!(report.total_tasks, 43);

    let mut seen: Vec<PathBuf> = Vec::new();
    for call in applier.calls() {
        assert!(!call.paths().is_empty(), "empty batch flushed");
        seen.extend(call.paths().iter().cloned());
    }

    // No duplicates across all flushed batches, and full coverage
    assert_eq!(seen.len(), expected.len());
    assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);
}

#[test]
fn test_ownership_precedes_permissions_for_every_batch() {
    let dir = tempdir().unwrap();
    populate_files(dir.path(), 20);

    let applier = Arc::new(RecordingApplier::default());
    run_with(config_for(dir.path(), 1, 6, Some("staff")), Arc::clone(&applier)).unwrap();

    let calls = applier.calls();
    assert_eq!(calls.len() % 2, 0);
    for pair in calls.chunks(2) {
        match pair {
            [Call::Ownership(group, own_paths), Call::Permissions(_, perm_paths)] => {
                assert_eq!(group, "staff");
                assert_eq!(own_paths, perm_paths);
            }
            other => panic!("expected chgrp/chmod pair, got {other:?}"),
        }
    }
}

#[test]
fn test_applier_failures_are_counted_not_fatal() {
    let dir = tempdir().unwrap();
    populate_files(dir.path(), 10);

    let applier = Arc::new(RecordingApplier::failing());
    let report = run_with(config_for(dir.path(), 1, 4, None), Arc::clone(&applier)).unwrap();

    // The run completed and every batch was still attempted
    assert_eq!(report.total_tasks, 11);
    assert_eq!(report.paths_applied, 11);
    assert!(report.batches_failed > 0);
    assert_eq!(report.batches_failed, report.batches_flushed);
}

#[test]
fn test_sum_of_batch_sizes_equals_files_plus_directories() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
    populate_files(&dir.path().join("a"), 7);
    populate_files(&dir.path().join("a/b/c"), 5);

    let applier = Arc::new(RecordingApplier::default());
    let report = run_with(config_for(dir.path(), 3, 4, None), Arc::clone(&applier)).unwrap();

    // 4 directories + 12 files
    assert_eq!(report.total_tasks, 16);
    let flushed: usize = applier.calls().iter().map(|c| c.paths().len()).sum();
    assert_eq!(flushed as u64, report.total_tasks);
    assert_eq!(report.paths_applied, 16);
}
