//! Integration tests for Autorename
//!
//! Exercises real directory trees: configuration hierarchies, forced digest
//! collisions, claims across separate plans, and repeated runs.

use ::autorename::*;
use filetime::{set_file_mtime, FileTime};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;

/// 2010-01-02 11:04:05 UTC
pub const MTIME: i64 = 1262430245;

/// Test harness owning a scratch directory tree
pub struct RenameHarness {
    pub temp_dir: TempDir,
}

impl RenameHarness {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file with the pinned modification time
    pub fn create(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(MTIME, 0)).unwrap();
        path
    }

    /// Write a configuration file selecting `granularity`
    pub fn configure(&self, relative_dir: &str, granularity: &str) {
        let dir = self.root().join(relative_dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(::autorename::config::CONFIG_FILE_NAME),
            format!("[autorename]\nprefix_timestamp = {}\n", granularity),
        )
        .unwrap();
    }

    /// Run over the whole tree
    pub fn run(&self, mode: ExecutionMode, policy: CollisionPolicy) -> RunSummary {
        let summary = AutorenameBuilder::new()
            .mode(mode)
            .collision_policy(policy)
            .time_basis(TimeBasis::Utc)
            .build()
            .run(&[self.root()]);
        info!(
            "Run finished: {} renamed, {} conflicts",
            summary.renamed.len(),
            summary.conflicts.len()
        );
        summary
    }

    /// Relative path of every file in the tree, mapped to its content
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        walkdir::WalkDir::new(self.root())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let relative = entry
                    .path()
                    .strip_prefix(self.root())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                let content = fs::read_to_string(entry.path()).unwrap_or_default();
                (relative, content)
            })
            .collect()
    }
}

/// Uses the file content itself as the digest, so tests can force prefixes
struct ContentIsDigest;

impl ContentHasher for ContentIsDigest {
    fn hash_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| AutorenameError::file_read(path, e))
    }
}

fn digest(prefix: &str) -> String {
    format!("{:0<32}", prefix)
}

fn no_config(_: &Path) -> std::result::Result<Option<Granularity>, ConfigError> {
    Ok(None)
}

#[test]
fn test_configuration_hierarchy() {
    let harness = RenameHarness::new();
    harness.configure("", "minute");
    harness.configure("albums", "day");
    harness.create("top.jpg", "abc");
    harness.create("albums/a.jpg", "abc");
    harness.create("albums/2010/b.jpg", "abc");
    harness.create("loose/c.jpg", "abc");

    let summary = harness.run(ExecutionMode::Commit, CollisionPolicy::Report);
    assert!(!summary.has_problems(), "{:?}", summary);

    let files: Vec<String> = harness
        .snapshot()
        .into_keys()
        .filter(|name| !name.ends_with(".ini"))
        .collect();
    assert_eq!(
        files,
        vec![
            "2010-01-02-1104-900150983c.jpg",
            "albums/2010-01-02-900150983c.jpg",
            "albums/2010/2010-01-02-900150983c.jpg",
            "loose/2010-01-02-1104-900150983c.jpg",
        ]
    );
}

#[test]
fn test_content_survives_renames() {
    let harness = RenameHarness::new();
    for i in 0..25 {
        harness.create(&format!("import/IMG_{:04}.JPG", i), &format!("picture {}", i));
    }
    let before: Vec<String> = harness.snapshot().into_values().collect();

    let summary = harness.run(ExecutionMode::Commit, CollisionPolicy::Report);
    assert_eq!(summary.renamed.len(), 25);

    let mut after: Vec<String> = harness.snapshot().into_values().collect();
    let mut before = before;
    before.sort();
    after.sort();
    assert_eq!(before, after);

    let rerun = harness.run(ExecutionMode::Commit, CollisionPolicy::Report);
    assert_eq!(rerun.changed(), 0);
    assert_eq!(rerun.skipped, 25);
}

#[test]
fn test_forced_collision_report_then_extend() {
    let harness = RenameHarness::new();
    let a = harness.create("a.jpg", &digest("98ecf8427e1"));
    let b = harness.create("b.jpg", &digest("98ecf8427e2"));
    let options = |collision_policy| PlannerOptions {
        collision_policy,
        time_basis: TimeBasis::Utc,
    };

    let mut planner = RenamePlanner::with_hasher(
        no_config,
        ContentIsDigest,
        options(CollisionPolicy::Report),
    );
    let planned = planner.plan_paths([&b, &a]);
    for file in &planned {
        assert!(matches!(
            file.decision,
            Ok(RenameDecision::Conflict(ConflictReason::SharedTarget { .. }))
        ));
    }

    let mut planner = RenamePlanner::with_hasher(
        no_config,
        ContentIsDigest,
        options(CollisionPolicy::ExtendDigest),
    );
    let planned = planner.plan_paths([&a, &b]);
    let mut summary = RunSummary::new(ExecutionMode::Commit);
    Executor::new(ExecutionMode::Commit).execute_batch(&planned, &mut summary);
    assert_eq!(summary.renamed.len(), 2);

    let names: Vec<String> = harness.snapshot().into_keys().collect();
    assert_eq!(
        names,
        vec!["2010-01-02-98ecf8427e1.jpg", "2010-01-02-98ecf8427e2.jpg"]
    );

    // extended names are canonical on the next run, whatever the policy
    let mut planner = RenamePlanner::with_hasher(
        no_config,
        ContentIsDigest,
        options(CollisionPolicy::Report),
    );
    let paths: Vec<PathBuf> = names.iter().map(|n| harness.root().join(n)).collect();
    let planned = planner.plan_paths(&paths);
    assert!(planned
        .iter()
        .all(|p| matches!(p.decision, Ok(RenameDecision::Skip(SkipReason::AlreadyCanonical)))));
}

#[test]
fn test_separate_plans_respect_claims() {
    // a run plans each directory in one call; a caller driving the planner
    // batch by batch still never gets a name handed out twice
    let harness = RenameHarness::new();
    let first = harness.create("first.png", &digest("0123456789a"));
    let second = harness.create("second.png", &digest("0123456789b"));

    let mut planner = RenamePlanner::with_hasher(
        no_config,
        ContentIsDigest,
        PlannerOptions {
            time_basis: TimeBasis::Utc,
            ..PlannerOptions::default()
        },
    );
    let planned = planner.plan_paths([&first]);
    assert_eq!(
        planned[0].decision.as_ref().unwrap(),
        &RenameDecision::Rename("2010-01-02-0123456789.png".into())
    );

    let planned = planner.plan_paths([&second]);
    assert_eq!(
        planned[0].decision.as_ref().unwrap(),
        &RenameDecision::Conflict(ConflictReason::ClaimedEarlier {
            target: "2010-01-02-0123456789.png".into(),
            by: first,
        })
    );
}

#[test]
fn test_dry_run_matches_commit() {
    let harness = RenameHarness::new();
    harness.configure("minute", "minute");
    harness.create("a.gif", "a");
    harness.create("minute/b.m4a", "b");
    harness.create("minute/.DS_Store", "finder");
    harness.create("2010-01-02 kept.pdf", "kept");

    let dry = harness.run(ExecutionMode::DryRun, CollisionPolicy::Report);
    let untouched = harness.snapshot();
    let commit = harness.run(ExecutionMode::Commit, CollisionPolicy::Report);

    assert_eq!(dry.renamed, commit.renamed);
    assert_eq!(dry.deleted, commit.deleted);
    assert_eq!(dry.skipped, commit.skipped);
    assert_ne!(untouched, harness.snapshot());
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let harness = RenameHarness::new();
    let outside = TempDir::new().unwrap();
    let target = outside.path().join("real.jpg");
    fs::write(&target, "real").unwrap();
    std::os::unix::fs::symlink(&target, harness.root().join("link.jpg")).unwrap();
    std::os::unix::fs::symlink(outside.path(), harness.root().join("linked-dir")).unwrap();

    let summary = harness.run(ExecutionMode::Commit, CollisionPolicy::Report);
    assert_eq!(summary, RunSummary::new(ExecutionMode::Commit));
    assert!(target.exists());
}
