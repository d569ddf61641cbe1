//! High-level entry point
//!
//! [`Autorename`] wires traversal, planning, and execution together. Targets
//! are expanded and their files grouped by directory, every directory is
//! planned once, and the plan is then handed to the executor. Planning the whole run before touching
//! anything means conflicts are known up front, across every target.

use crate::config::{ConfigSource, IniConfigSource};
use crate::executor::{Executor, RunSummary};
use crate::planner::{PlannerOptions, RenamePlanner};
use crate::traversal::{absolute_target, expand_target};
use crate::types::{CollisionPolicy, ExecutionMode, PlannedFile, TimeBasis};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Planned files of one directory
#[derive(Debug)]
pub struct PlannedBatch {
    /// Directory the files live in
    pub directory: PathBuf,
    /// Decisions, sorted by file name
    pub files: Vec<PlannedFile>,
}

/// Decisions for a whole run, before anything is executed
#[derive(Debug, Default)]
pub struct RunPlan {
    /// Per-directory decisions, ordered by directory
    pub batches: Vec<PlannedBatch>,
    /// Targets and walk entries that could not be expanded
    pub failures: Vec<PlannedFile>,
}

impl RunPlan {
    /// Every planned file across all batches
    pub fn files(&self) -> impl Iterator<Item = &PlannedFile> {
        self.batches.iter().flat_map(|batch| batch.files.iter())
    }
}

/// Renames files below a set of targets
///
/// # Examples
///
/// ```rust,no_run
/// use autorename::{AutorenameBuilder, ExecutionMode};
///
/// let mut autorename = AutorenameBuilder::new()
///     .mode(ExecutionMode::Commit)
///     .build();
/// let summary = autorename.run(&["./Downloads"]);
/// println!("Renamed {} files", summary.renamed.len());
/// ```
#[derive(Debug)]
pub struct Autorename<S = IniConfigSource> {
    planner: RenamePlanner<S>,
    executor: Executor,
}

impl<S: ConfigSource> Autorename<S> {
    /// Plan every target without executing anything
    ///
    /// Files from all targets are grouped by directory first, so each
    /// directory is planned once no matter how the targets split it.
    pub fn plan<P: AsRef<Path>>(&mut self, targets: &[P]) -> RunPlan {
        let mut plan = RunPlan::default();
        let mut directories: BTreeMap<PathBuf, BTreeSet<PathBuf>> = BTreeMap::new();

        for target in targets {
            let target = target.as_ref();
            let target = match absolute_target(target) {
                Ok(target) => target,
                Err(e) => {
                    plan.failures.push(PlannedFile::failed(target, e));
                    continue;
                }
            };

            let traversal = match expand_target(&target) {
                Ok(traversal) => traversal,
                Err(e) => {
                    warn!("Argument '{}' is not a file or a directory, skipping", target.display());
                    plan.failures.push(PlannedFile::failed(&target, e));
                    continue;
                }
            };
            info!(
                "Processing argument '{}' ({} files)",
                target.display(),
                traversal.file_count()
            );

            for error in traversal.errors {
                let path = error.path().map(Path::to_path_buf).unwrap_or_else(|| target.clone());
                plan.failures.push(PlannedFile::failed(path, error));
            }

            for batch in traversal.batches {
                directories
                    .entry(batch.directory)
                    .or_default()
                    .extend(batch.files);
            }
        }

        for (directory, files) in directories {
            info!(
                "Processing directory '{}' ({} files)",
                directory.display(),
                files.len()
            );
            let planned = self.planner.plan_paths(files);
            plan.batches.push(PlannedBatch { directory, files: planned });
        }

        plan
    }

    /// Execute a plan
    pub fn execute(&self, plan: &RunPlan) -> RunSummary {
        let mut summary = RunSummary::new(self.executor.mode());
        for failure in &plan.failures {
            self.executor.execute(failure, 0, &mut summary);
        }
        for batch in &plan.batches {
            self.executor.execute_batch(&batch.files, &mut summary);
        }
        info!(
            "Renamed: {}   Deleted: {}   Skipped: {}   Conflicts: {}   Errors: {}",
            summary.renamed.len(),
            summary.deleted.len(),
            summary.skipped,
            summary.conflicts.len(),
            summary.errors.len()
        );
        summary
    }

    /// Plan and execute
    pub fn run<P: AsRef<Path>>(&mut self, targets: &[P]) -> RunSummary {
        if self.executor.mode().is_dry_run() {
            warn!("Dry run mode enabled, no files will be renamed");
        } else {
            info!("Commit mode enabled, files will be renamed");
        }
        let plan = self.plan(targets);
        self.execute(&plan)
    }

    /// The planner, with its configuration cache and claimed names
    pub fn planner(&self) -> &RenamePlanner<S> {
        &self.planner
    }
}

/// Builder for [`Autorename`]
#[derive(Debug, Clone, Default)]
pub struct AutorenameBuilder {
    mode: ExecutionMode,
    collision_policy: CollisionPolicy,
    time_basis: TimeBasis,
    config_file_name: Option<String>,
}

impl AutorenameBuilder {
    /// Create a builder: dry run, report conflicts, local time
    pub fn new() -> Self {
        Self::default()
    }

    /// Dry run or commit
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// How name collisions are handled
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Clock used to read modification times
    pub fn time_basis(mut self, basis: TimeBasis) -> Self {
        self.time_basis = basis;
        self
    }

    /// Name of the per-directory configuration file
    pub fn config_file_name(mut self, name: impl Into<String>) -> Self {
        self.config_file_name = Some(name.into());
        self
    }

    /// Build with INI files on disk as configuration
    pub fn build(mut self) -> Autorename<IniConfigSource> {
        let source = match self.config_file_name.take() {
            Some(name) => IniConfigSource::with_file_name(name),
            None => IniConfigSource::new(),
        };
        self.build_with_source(source)
    }

    /// Build with a custom configuration source
    pub fn build_with_source<S: ConfigSource>(self, source: S) -> Autorename<S> {
        let options = PlannerOptions {
            collision_policy: self.collision_policy,
            time_basis: self.time_basis,
        };
        Autorename {
            planner: RenamePlanner::new(source, options),
            executor: Executor::new(self.mode),
        }
    }
}
