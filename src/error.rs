//! Error types for autorename
//!
//! Two layers of errors exist. [`ConfigError`] describes a broken directory
//! configuration file; it is `Clone` because one resolution failure is cached
//! and reported for every file of the subtree the file governs.
//! [`AutorenameError`] is the error type of everything else: per-file I/O
//! failures, traversal failures, and refusals to overwrite.
//!
//! Name collisions are not errors. They surface as
//! [`RenameDecision::Conflict`](crate::types::RenameDecision::Conflict) and are
//! collected in the run summary.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Type alias for Results in the autorename library
pub type Result<T> = std::result::Result<T, AutorenameError>;

/// Main error type for all autorename operations
#[derive(Debug, Error)]
pub enum AutorenameError {
    /// I/O errors not tied to a specific file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A file could not be read or stat'ed
    #[error("Failed to read {path:?}: {source}")]
    FileRead {
        /// Path of the unreadable file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The directory configuration governing a file is broken
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Errors during JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The rename target appeared on disk after planning
    #[error("Refusing to overwrite existing file: {0:?}")]
    TargetExists(PathBuf),

    /// A command-line target is neither a file nor a directory
    #[error("Not a file or directory: {0:?}")]
    InvalidTarget(PathBuf),

    /// The path has no file name that can be inspected
    #[error("Path has no usable file name: {0:?}")]
    InvalidFileName(PathBuf),
}

/// A malformed `.autorename.ini` file
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The file exists but is not valid INI
    #[error("Configuration file {path:?} could not be read: {message}")]
    Unreadable {
        /// Path of the configuration file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The `[autorename]` section is absent
    #[error("Configuration file {path:?} does not have the 'autorename' section")]
    MissingSection {
        /// Path of the configuration file
        path: PathBuf,
    },

    /// The `prefix_timestamp` option is absent
    #[error("Configuration file {path:?} does not have the 'prefix_timestamp' option")]
    MissingOption {
        /// Path of the configuration file
        path: PathBuf,
    },

    /// `prefix_timestamp` holds something other than `day` or `minute`
    #[error("Configuration file {path:?} has invalid 'prefix_timestamp' option: {value:?}")]
    InvalidValue {
        /// Path of the configuration file
        path: PathBuf,
        /// Offending value as written
        value: String,
    },
}

impl ConfigError {
    /// Path of the configuration file at fault
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Unreadable { path, .. }
            | ConfigError::MissingSection { path }
            | ConfigError::MissingOption { path }
            | ConfigError::InvalidValue { path, .. } => path,
        }
    }
}

impl AutorenameError {
    /// Wrap an I/O failure with the path that caused it
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AutorenameError::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Path associated with this error, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            AutorenameError::FileRead { path, .. }
            | AutorenameError::TargetExists(path)
            | AutorenameError::InvalidTarget(path)
            | AutorenameError::InvalidFileName(path) => Some(path),
            AutorenameError::Config(err) => Some(err.path()),
            AutorenameError::WalkDir(err) => err.path(),
            _ => None,
        }
    }

    /// Check if this error comes from a directory configuration file
    pub fn is_config(&self) -> bool {
        matches!(self, AutorenameError::Config(_))
    }
}
