//! Batched version-control side effects.
//!
//! Document writes and renames are staged as they happen; the commit runs
//! exactly once, at the end of the run, after every other mutation. The
//! commit message carries `[skip ci]` so the sync's own commit never
//! re-triggers the sync.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Suffix appended to every batch commit message.
const SKIP_CI: &str = "[skip ci]";

/// Errors from git invocations.
#[derive(Debug, Error)]
pub enum GitError {
    /// git exited non-zero.
    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },

    /// git could not be spawned.
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Collects staged paths during a run and commits them once.
///
/// Outside a git checkout (no `.git` in `root`) every operation is a no-op,
/// so the pipeline works against plain directories (and in tests).
#[derive(Debug)]
pub struct GitBatch {
    root: PathBuf,
    enabled: bool,
    dry_run: bool,
    staged: usize,
}

impl GitBatch {
    pub fn new(root: &Path, dry_run: bool) -> Self {
        let enabled = root.join(".git").exists();
        if !enabled {
            tracing::debug!(
                "{} is not a git checkout; version-control batching disabled",
                root.display()
            );
        }
        Self {
            root: root.to_path_buf(),
            enabled,
            dry_run,
            staged: 0,
        }
    }

    /// Stage a path (addition, modification, or deletion).
    pub fn add(&mut self, path: &Path) -> Result<(), GitError> {
        if self.dry_run || !self.enabled {
            return Ok(());
        }
        self.run(&["add", "--"], Some(path))?;
        self.staged += 1;
        Ok(())
    }

    /// Commit everything staged so far, if anything was. Returns whether a
    /// commit was made.
    pub fn commit(&mut self, message: &str) -> Result<bool, GitError> {
        if self.staged == 0 || self.dry_run || !self.enabled {
            return Ok(false);
        }
        let full = format!("{message} {SKIP_CI}");
        self.run(&["commit", "-m", &full], None)?;
        tracing::info!("committed {} staged path(s)", self.staged);
        self.staged = 0;
        Ok(true)
    }

    /// Push the batch commit to the default remote.
    pub fn push(&self) -> Result<(), GitError> {
        if self.dry_run || !self.enabled {
            return Ok(());
        }
        self.run(&["push"], None)
    }

    fn run(&self, args: &[&str], path: Option<&Path>) -> Result<(), GitError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.root).args(args);
        if let Some(path) = path {
            cmd.arg(path);
        }
        let output = cmd.output()?;
        if !output.status.success() {
            return Err(GitError::Command {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }
}
