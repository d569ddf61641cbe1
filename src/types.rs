//! Core data types used throughout autorename
//!
//! ## Overview
//!
//! - **Configuration**: [`Granularity`], [`CollisionPolicy`], [`TimeBasis`],
//!   [`ExecutionMode`]
//! - **Inputs**: [`FileRecord`], one candidate file with a lazily computed digest
//! - **Outputs**: [`RenameDecision`] and [`PlannedFile`], what the planner
//!   wants done with a file
//!
//! ```rust
//! use autorename::types::{Granularity, RenameDecision, SkipReason};
//!
//! let granularity: Granularity = "minute".parse().unwrap();
//! assert_eq!(granularity, Granularity::Minute);
//!
//! let decision = RenameDecision::Skip(SkipReason::AlreadyCanonical);
//! assert_eq!(decision.to_string(), "skip (already-canonical)");
//! ```

use crate::error::{AutorenameError, Result};
use crate::hasher::ContentHasher;
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

/// Time resolution embedded in generated names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// `YYYY-MM-DD-<digest>.<ext>`
    #[default]
    Day,
    /// `YYYY-MM-DD-HHMM-<digest>.<ext>`
    Minute,
}

impl Granularity {
    /// Value as written in `prefix_timestamp`
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Minute => "minute",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    /// Accepts `day` or `minute`, surrounding whitespace and ASCII case ignored
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("day") {
            Ok(Granularity::Day)
        } else if value.eq_ignore_ascii_case("minute") {
            Ok(Granularity::Minute)
        } else {
            Err(format!("expected 'day' or 'minute', got {:?}", s))
        }
    }
}

/// What to do when two files want the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Every file involved in a collision gets a conflict and stays put
    #[default]
    Report,
    /// Colliding files with different content lengthen their digest segment
    /// until the names differ. Identical content is still a conflict.
    ExtendDigest,
}

/// Clock used to turn a modification time into date and time fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBasis {
    /// The machine's local time zone
    #[default]
    Local,
    /// Coordinated universal time
    Utc,
}

impl TimeBasis {
    /// Convert a filesystem timestamp into wall-clock time on this basis
    pub fn convert(&self, time: SystemTime) -> DateTime<FixedOffset> {
        match self {
            TimeBasis::Local => DateTime::<Local>::from(time).fixed_offset(),
            TimeBasis::Utc => DateTime::<Utc>::from(time).fixed_offset(),
        }
    }
}

/// Whether decisions are only reported or also applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Report what would happen, touch nothing
    #[default]
    DryRun,
    /// Rename and delete files
    Commit,
}

impl ExecutionMode {
    /// True for [`ExecutionMode::DryRun`]
    pub fn is_dry_run(&self) -> bool {
        matches!(self, ExecutionMode::DryRun)
    }
}

/// A candidate file as seen by the planner
///
/// The digest is computed on first use and memoized, so a record can be
/// consulted several times without rereading the file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    path: PathBuf,
    extension: Option<String>,
    modified: DateTime<FixedOffset>,
    digest: OnceCell<String>,
}

impl FileRecord {
    /// Build a record from explicit values
    pub fn new(path: impl Into<PathBuf>, modified: DateTime<FixedOffset>) -> Self {
        let path = path.into();
        let extension = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(file_extension);
        Self {
            path,
            extension,
            modified,
            digest: OnceCell::new(),
        }
    }

    /// Stat a file on disk and build its record
    ///
    /// # Errors
    ///
    /// - [`AutorenameError::FileRead`] if the file cannot be stat'ed
    /// - [`AutorenameError::InvalidTarget`] if the path is not a regular file
    pub fn from_path(path: impl Into<PathBuf>, basis: TimeBasis) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)
            .map_err(|e| AutorenameError::file_read(&path, e))?;
        if !metadata.is_file() {
            return Err(AutorenameError::InvalidTarget(path));
        }
        let modified = metadata
            .modified()
            .map_err(|e| AutorenameError::file_read(&path, e))?;
        Ok(Self::new(path, basis.convert(modified)))
    }

    /// Preset the content digest instead of hashing the file
    pub fn with_digest(self, digest: impl Into<String>) -> Self {
        let digest_cell = OnceCell::new();
        let _ = digest_cell.set(digest.into());
        Self {
            digest: digest_cell,
            ..self
        }
    }

    /// Full path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the file
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// File name as UTF-8
    ///
    /// # Errors
    ///
    /// [`AutorenameError::InvalidFileName`] for paths without a name or with a
    /// name that is not valid UTF-8
    pub fn file_name(&self) -> Result<&str> {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AutorenameError::InvalidFileName(self.path.clone()))
    }

    /// Lowercased extension including the leading dot
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Modification time as wall-clock time
    pub fn modified(&self) -> &DateTime<FixedOffset> {
        &self.modified
    }

    /// Content digest, hashing the file the first time it is asked for
    pub fn digest<H: ContentHasher + ?Sized>(&self, hasher: &H) -> Result<&str> {
        if let Some(digest) = self.digest.get() {
            return Ok(digest);
        }
        let digest = hasher.hash_file(&self.path)?;
        Ok(self.digest.get_or_init(|| digest))
    }
}

/// Lowercased extension of a file name, including the leading dot
///
/// ```rust
/// use autorename::types::file_extension;
///
/// assert_eq!(file_extension("IMAGE-1 (2).JPG").as_deref(), Some(".jpg"));
/// assert_eq!(file_extension("README"), None);
/// ```
pub fn file_extension(file_name: &str) -> Option<String> {
    let (_, extension) = file_name.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some(format!(".{}", extension.to_lowercase()))
}

/// Why a file keeps its current name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Extension is not on the allow-list
    UnrecognizedExtension,
    /// The file already carries its canonical name
    AlreadyCanonical,
    /// The name starts with a manually written date and a description
    LooksAlreadyDated,
}

impl SkipReason {
    /// Stable identifier used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::UnrecognizedExtension => "unrecognized-extension",
            SkipReason::AlreadyCanonical => "already-canonical",
            SkipReason::LooksAlreadyDated => "looks-already-dated",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a file could not be given its canonical name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ConflictReason {
    /// A file with the target name already exists on disk
    TargetExists {
        /// Name that is taken
        target: String,
    },
    /// Other files in this batch computed the same target
    SharedTarget {
        /// Contested name
        target: String,
        /// The other claimants
        others: Vec<PathBuf>,
    },
    /// Other files in this batch have identical content and timestamp bucket
    DuplicateContent {
        /// Contested name
        target: String,
        /// The duplicates
        others: Vec<PathBuf>,
    },
    /// An earlier plan of this run already handed the target out
    ClaimedEarlier {
        /// Contested name
        target: String,
        /// File that holds the claim
        by: PathBuf,
    },
}

impl ConflictReason {
    /// The contested target name
    pub fn target(&self) -> &str {
        match self {
            ConflictReason::TargetExists { target }
            | ConflictReason::SharedTarget { target, .. }
            | ConflictReason::DuplicateContent { target, .. }
            | ConflictReason::ClaimedEarlier { target, .. } => target,
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::TargetExists { target } => {
                write!(f, "'{}' already exists", target)
            }
            ConflictReason::SharedTarget { target, others } => {
                write!(f, "'{}' is also the target of {}", target, display_paths(others))
            }
            ConflictReason::DuplicateContent { target, others } => {
                write!(f, "'{}' has identical content to {}", target, display_paths(others))
            }
            ConflictReason::ClaimedEarlier { target, by } => {
                write!(f, "'{}' was already claimed by {}", target, by.display())
            }
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// What should happen to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenameDecision {
    /// Leave the file alone
    Skip(SkipReason),
    /// Rename the file to this name within its directory
    Rename(String),
    /// The file is an OS marker file and should be removed
    Delete,
    /// The canonical name is contested; leave the file alone
    Conflict(ConflictReason),
}

impl RenameDecision {
    /// Target name for renames
    pub fn target(&self) -> Option<&str> {
        match self {
            RenameDecision::Rename(target) => Some(target),
            _ => None,
        }
    }

    /// True when the decision changes the filesystem
    pub fn is_mutation(&self) -> bool {
        matches!(self, RenameDecision::Rename(_) | RenameDecision::Delete)
    }
}

impl fmt::Display for RenameDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameDecision::Skip(reason) => write!(f, "skip ({})", reason),
            RenameDecision::Rename(target) => write!(f, "rename to {}", target),
            RenameDecision::Delete => f.write_str("delete"),
            RenameDecision::Conflict(reason) => write!(f, "conflict: {}", reason),
        }
    }
}

/// The planner's verdict for one source path
#[derive(Debug)]
pub struct PlannedFile {
    /// File the decision is about
    pub source: PathBuf,
    /// Decision, or the per-file error that prevented one
    pub decision: Result<RenameDecision>,
}

impl PlannedFile {
    /// A file with a decision
    pub fn decided(source: impl Into<PathBuf>, decision: RenameDecision) -> Self {
        Self {
            source: source.into(),
            decision: Ok(decision),
        }
    }

    /// A file that failed before a decision could be made
    pub fn failed(source: impl Into<PathBuf>, error: AutorenameError) -> Self {
        Self {
            source: source.into(),
            decision: Err(error),
        }
    }

    /// Full target path for renames
    pub fn target_path(&self) -> Option<PathBuf> {
        let target = self.decision.as_ref().ok()?.target()?;
        let parent = self.source.parent().unwrap_or_else(|| Path::new(""));
        Some(parent.join(target))
    }
}
