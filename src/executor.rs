//! Applying or reporting decisions
//!
//! The [`Executor`] is the only part of the crate that modifies the
//! filesystem, and only in [`ExecutionMode::Commit`]. In a dry run it logs
//! exactly what a commit would do. Either way every outcome is tallied in a
//! [`RunSummary`].
//!
//! A rename re-checks its target right before renaming. If something has
//! appeared there since planning, the rename is refused instead of
//! overwriting it.

use crate::error::{AutorenameError, Result};
use crate::types::{ExecutionMode, PlannedFile, RenameDecision};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// A rename that was applied (or would be, in a dry run)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameRecord {
    /// Original path
    pub from: PathBuf,
    /// New path
    pub to: PathBuf,
}

/// A file left alone because its target was contested
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    /// File that was not renamed
    pub path: PathBuf,
    /// Target it wanted
    pub target: String,
    /// Human readable explanation
    pub reason: String,
}

/// A per-file failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// File or directory the error is about
    pub path: PathBuf,
    /// Error message
    pub message: String,
}

/// Everything that happened during a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Whether files were actually touched
    pub mode: ExecutionMode,
    /// Renamed files
    pub renamed: Vec<RenameRecord>,
    /// Deleted marker files
    pub deleted: Vec<PathBuf>,
    /// Files left alone on purpose
    pub skipped: usize,
    /// Files left alone because of a name collision
    pub conflicts: Vec<ConflictRecord>,
    /// Files that could not be processed
    pub errors: Vec<ErrorRecord>,
}

impl RunSummary {
    /// Empty summary for a run in `mode`
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Record an error that happened outside of a planned file
    pub fn record_error(&mut self, path: impl Into<PathBuf>, error: &AutorenameError) {
        self.errors.push(ErrorRecord {
            path: path.into(),
            message: error.to_string(),
        });
    }

    /// True when any conflict or error was recorded
    pub fn has_problems(&self) -> bool {
        !self.conflicts.is_empty() || !self.errors.is_empty()
    }

    /// Number of files the run changed (or would change)
    pub fn changed(&self) -> usize {
        self.renamed.len() + self.deleted.len()
    }
}

/// Applies or reports planned decisions
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor {
    mode: ExecutionMode,
}

impl Executor {
    /// Create an executor
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    /// Mode of this executor
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Handle every planned file of one directory
    ///
    /// Names are padded to the widest name in the batch so the log lines up.
    pub fn execute_batch(&self, planned: &[PlannedFile], summary: &mut RunSummary) {
        let width = planned
            .iter()
            .map(|p| display_name(&p.source).chars().count())
            .max()
            .unwrap_or(0);
        for file in planned {
            self.execute(file, width, summary);
        }
    }

    /// Handle one planned file
    pub fn execute(&self, planned: &PlannedFile, width: usize, summary: &mut RunSummary) {
        let source = &planned.source;
        let name = display_name(source);
        let suffix = if self.mode.is_dry_run() { " (dryrun)" } else { "" };

        let decision = match &planned.decision {
            Ok(decision) => decision,
            Err(e) => {
                warn!("  Failed:                   {}: {}", name, e);
                summary.record_error(source, e);
                return;
            }
        };

        match decision {
            RenameDecision::Skip(reason) => {
                trace!("  Skipping file:            {} ({})", name, reason);
                summary.skipped += 1;
            }
            RenameDecision::Conflict(reason) => {
                warn!("  Conflict:                 {}: {}", name, reason);
                summary.conflicts.push(ConflictRecord {
                    path: source.clone(),
                    target: reason.target().to_string(),
                    reason: reason.to_string(),
                });
            }
            RenameDecision::Delete => {
                warn!("  Deleting file{}: {}", suffix, name);
                match self.delete(source) {
                    Ok(()) => summary.deleted.push(source.clone()),
                    Err(e) => summary.record_error(source, &e),
                }
            }
            RenameDecision::Rename(target) => {
                let target_path = source
                    .parent()
                    .unwrap_or_else(|| Path::new(""))
                    .join(target);
                let padded = format!("{:<width$}", name, width = width);
                debug!("  Renaming file{}: {} -> {}", suffix, padded, target);
                match self.rename(source, &target_path) {
                    Ok(()) => summary.renamed.push(RenameRecord {
                        from: source.clone(),
                        to: target_path,
                    }),
                    Err(e) => {
                        warn!("  Rename failed:            {}: {}", name, e);
                        summary.record_error(source, &e);
                    }
                }
            }
        }
    }

    fn rename(&self, source: &Path, target: &Path) -> Result<()> {
        if self.mode.is_dry_run() {
            return Ok(());
        }
        // fs::rename replaces an existing target on most platforms; a
        // dangling symlink counts as existing
        if fs::symlink_metadata(target).is_ok() {
            return Err(AutorenameError::TargetExists(target.to_path_buf()));
        }
        fs::rename(source, target).map_err(|e| AutorenameError::file_read(source, e))
    }

    fn delete(&self, path: &Path) -> Result<()> {
        if self.mode.is_dry_run() {
            return Ok(());
        }
        fs::remove_file(path).map_err(|e| AutorenameError::file_read(path, e))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
