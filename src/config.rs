//! Configuration types for fastmod
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - The built-in permission preset table
//! - Environment-variable defaults (FASTMOD_BLOCKSIZE, FASTMOD_CORES,
//!   FASTMOD_PRESET)
//! - Runtime configuration with validation
//!
//! Permission strings are opaque here: they are handed to chmod untouched,
//! so anything chmod accepts is valid.

use crate::error::ConfigError;
use clap::Parser;
use nix::unistd::{Group, Uid, User};
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Paths changed per chmod/chgrp invocation unless overridden
pub const DEFAULT_BLOCK_SIZE: usize = 128;

/// Preset used when neither FLAGS nor --preset is given
pub const DEFAULT_PRESET: &str = "baseline";

/// A named pair of file/directory permission strings
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub file_perms: &'static str,
    pub dir_perms: &'static str,
}

/// Built-in permission presets, selectable with `--preset`
pub const PRESETS: &[Preset] = &[
    Preset {
        name: "baseline",
        file_perms: "u+rw,g+r-w,o+r-w",
        dir_perms: "u+rwx,g+rxs-w,o+rx-w",
    },
    Preset {
        name: "group-allowed",
        file_perms: "ug+rw,o+r-w",
        dir_perms: "ug+rwx,g+s,o+rx-w",
    },
    Preset {
        name: "private",
        file_perms: "u+rw,go-rwx",
        dir_perms: "u+rwx,g-rwx,o-rwx",
    },
    Preset {
        name: "private-group",
        file_perms: "ug+rw,o-rwx",
        dir_perms: "ug+rwx,g+s,o-rwx",
    },
    Preset {
        name: "readonly",
        file_perms: "a-w,+t",
        dir_perms: "a-w,+t",
    },
];

/// Look up a preset by name
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

fn env_or(key: &str, fallback: usize) -> usize {
    // Unparseable overrides fall back to the built-in default
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn default_block_size() -> usize {
    env_or("FASTMOD_BLOCKSIZE", DEFAULT_BLOCK_SIZE)
}

fn default_workers() -> usize {
    // Leave one core for the producer walk
    let available = num_cpus::get().saturating_sub(1).max(1);
    env_or("FASTMOD_CORES", available)
}

fn default_preset() -> String {
    std::env::var("FASTMOD_PRESET").unwrap_or_else(|_| DEFAULT_PRESET.to_string())
}

fn preset_help() -> String {
    let name_w = PRESETS
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0)
        .max("Preset".len());
    let file_w = PRESETS
        .iter()
        .map(|p| p.file_perms.len())
        .max()
        .unwrap_or(0)
        .max("File Permissions".len());

    let mut out = String::from("PRESETS:\n");
    out.push_str(&format!(
        "    {:name_w$}    {:file_w$}    {}\n",
        "Preset", "File Permissions", "Folder Permissions"
    ));
    out.push_str(&format!(
        "    {}    {}    {}\n",
        "-".repeat(name_w),
        "-".repeat(file_w),
        "-".repeat("Folder Permissions".len())
    ));
    for p in PRESETS {
        out.push_str(&format!(
            "    {:name_w$}    {:file_w$}    {}\n",
            p.name, p.file_perms, p.dir_perms
        ));
    }
    out.push_str(
        "\nDefaults can be overridden with the FASTMOD_BLOCKSIZE, FASTMOD_CORES\n\
         and FASTMOD_PRESET environment variables.",
    );
    out
}

/// Multithreaded utility for recursively changing permissions
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fastmod",
    version,
    about = "Multithreaded utility for recursively changing permissions",
    long_about = "Recursively changes permissions (and optionally group ownership) of a \
                  directory tree.\n\n\
                  Entries are distributed across a pool of worker threads and applied in \
                  batches, amortizing one chmod/chgrp invocation over many paths.",
    after_help = preset_help()
)]
pub struct CliArgs {
    /// Path to change permissions of; directories are changed recursively
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// chmod-style permission string, e.g. 'u+rx,g=rs,o+r-w'.
    /// Use 'file-perms:dir-perms' to give files and folders separate flags.
    #[arg(value_name = "FLAGS")]
    pub perms: Option<String>,

    /// Named preset to use when FLAGS is not given (see PRESETS below)
    #[arg(long, value_name = "NAME", default_value_t = default_preset(), conflicts_with = "perms")]
    pub preset: String,

    /// Set group ownership before permissions are applied.
    /// With no value, uses the caller's primary group.
    #[arg(short = 'G', long, value_name = "GROUP", num_args = 0..=1)]
    pub group: Option<Option<String>>,

    /// Number of worker threads
    #[arg(short = 'w', long, default_value_t = default_workers(), value_name = "NUM")]
    pub workers: usize,

    /// Paths changed per chmod/chgrp invocation
    #[arg(short = 'b', long, default_value_t = default_block_size(), value_name = "NUM")]
    pub block_size: usize,

    /// Quiet mode - suppress banner, spinner and "no such file" noise
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug-level logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Validated runtime configuration, read-only during a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Target path (file or directory)
    pub path: PathBuf,

    /// Permission string applied to files
    pub file_perms: String,

    /// Permission string applied to directories
    pub dir_perms: String,

    /// Group to chgrp to before chmod, if any (already resolved)
    pub group: Option<String>,

    /// Number of worker threads
    pub worker_count: usize,

    /// Paths per batch before an eager flush
    pub block_size: usize,

    /// Suppress banner/spinner and chmod diagnostics
    pub quiet: bool,

    /// Debug-level logging
    pub verbose: bool,
}

impl RunConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize {
                size: args.block_size,
            });
        }

        let (file_perms, dir_perms) = match &args.perms {
            Some(spec) => split_perms(spec)?,
            None => {
                let preset =
                    find_preset(&args.preset).ok_or_else(|| ConfigError::UnknownPreset {
                        name: args.preset.clone(),
                    })?;
                (preset.file_perms.to_string(), preset.dir_perms.to_string())
            }
        };

        let group = match args.group {
            Some(Some(name)) => Some(name),
            Some(None) => Some(primary_group_name()?),
            None => None,
        };

        Ok(Self {
            path: args.path,
            file_perms,
            dir_perms,
            group,
            worker_count: args.workers,
            block_size: args.block_size,
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }
}

/// Split a permission spec into (file, directory) strings.
///
/// A plain spec applies to both; 'file:dir' splits them.
fn split_perms(spec: &str) -> Result<(String, String), ConfigError> {
    let parts: Vec<&str> = spec.split(':').collect();
    match parts.as_slice() {
        [single] if !single.is_empty() => Ok((single.to_string(), single.to_string())),
        [file, dir] if !file.is_empty() && !dir.is_empty() => {
            Ok((file.to_string(), dir.to_string()))
        }
        _ => Err(ConfigError::InvalidPermsSpec {
            spec: spec.to_string(),
        }),
    }
}

/// Resolve the invoking user's primary group name (bare -G)
fn primary_group_name() -> Result<String, ConfigError> {
    let uid = Uid::effective();
    let user = User::from_uid(uid)
        .map_err(|e| ConfigError::PrimaryGroupUnavailable {
            reason: e.to_string(),
        })?
        .ok_or_else(|| ConfigError::PrimaryGroupUnavailable {
            reason: format!("no passwd entry for uid {uid}"),
        })?;
    let group = Group::from_gid(user.gid)
        .map_err(|e| ConfigError::PrimaryGroupUnavailable {
            reason: e.to_string(),
        })?
        .ok_or_else(|| ConfigError::PrimaryGroupUnavailable {
            reason: format!("no group entry for gid {}", user.gid),
        })?;
    Ok(group.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(path: &str) -> CliArgs {
        CliArgs {
            path: PathBuf::from(path),
            perms: None,
            preset: DEFAULT_PRESET.to_string(),
            group: None,
            workers: 4,
            block_size: 128,
            quiet: false,
            verbose: false,
        }
    }

    #[test]
    fn test_split_perms_single() {
        let (file, dir) = split_perms("u+rw").unwrap();
        assert_eq!(file, "u+rw");
        assert_eq!(dir, "u+rw");
    }

    #[test]
    fn test_split_perms_pair() {
        let (file, dir) = split_perms("u+xs,g+x,o-w:g+s,o-w").unwrap();
        assert_eq!(file, "u+xs,g+x,o-w");
        assert_eq!(dir, "g+s,o-w");
    }

    #[test]
    fn test_split_perms_invalid() {
        assert!(split_perms("").is_err());
        assert!(split_perms("a:b:c").is_err());
        assert!(split_perms("u+rw:").is_err());
        assert!(split_perms(":u+rw").is_err());
    }

    #[test]
    fn test_default_preset_resolution() {
        let config = RunConfig::from_args(args("/tmp")).unwrap();
        assert_eq!(config.file_perms, "u+rw,g+r-w,o+r-w");
        assert_eq!(config.dir_perms, "u+rwx,g+rxs-w,o+rx-w");
        assert!(config.group.is_none());
    }

    #[test]
    fn test_explicit_perms_override_preset() {
        let mut a = args("/tmp");
        a.perms = Some("a+x".to_string());
        let config = RunConfig::from_args(a).unwrap();
        assert_eq!(config.file_perms, "a+x");
        assert_eq!(config.dir_perms, "a+x");
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let mut a = args("/tmp");
        a.preset = "nonsense".to_string();
        let err = RunConfig::from_args(a).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset { .. }));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut a = args("/tmp");
        a.workers = 0;
        assert!(matches!(
            RunConfig::from_args(a),
            Err(ConfigError::InvalidWorkerCount { .. })
        ));
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let mut a = args("/tmp");
        a.block_size = 0;
        assert!(matches!(
            RunConfig::from_args(a),
            Err(ConfigError::InvalidBlockSize { .. })
        ));
    }

    #[test]
    fn test_named_group_kept_verbatim() {
        let mut a = args("/tmp");
        a.group = Some(Some("staff".to_string()));
        let config = RunConfig::from_args(a).unwrap();
        assert_eq!(config.group.as_deref(), Some("staff"));
    }

    #[test]
    fn test_cli_parse_flags() {
        let a = CliArgs::try_parse_from(["fastmod", "/data", "a+x", "-q", "-w", "8"]).unwrap();
        assert_eq!(a.path, PathBuf::from("/data"));
        assert_eq!(a.perms.as_deref(), Some("a+x"));
        assert!(a.quiet);
        assert_eq!(a.workers, 8);
    }

    #[test]
    fn test_cli_parse_group_value() {
        let a = CliArgs::try_parse_from(["fastmod", "/data", "-Gstaff"]).unwrap();
        assert_eq!(a.group, Some(Some("staff".to_string())));
    }

    #[test]
    fn test_cli_parse_preset_conflicts_with_flags() {
        assert!(CliArgs::try_parse_from(["fastmod", "/data", "a+x", "--preset", "private"])
            .is_err());
    }

    #[test]
    fn test_find_preset() {
        assert!(find_preset("readonly").is_some());
        assert!(find_preset("no-such-preset").is_none());
    }
}
