//! Turning command-line targets into directory batches
//!
//! A target is a file or a directory. A file becomes a batch of one. A
//! directory is walked recursively (symlinks are not followed) and every
//! directory found, the root included, becomes a batch of its regular files.
//! Batches come out in sorted directory order with files sorted by name, so
//! runs are reproducible.
//!
//! Walk errors (an unreadable subdirectory, say) do not abort the walk; they
//! are returned next to the batches.

use crate::error::{AutorenameError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Regular files of one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBatch {
    /// Directory holding the files
    pub directory: PathBuf,
    /// Files, sorted by name
    pub files: Vec<PathBuf>,
}

/// Outcome of expanding one target
#[derive(Debug, Default)]
pub struct Traversal {
    /// Batches in processing order
    pub batches: Vec<DirectoryBatch>,
    /// Problems met along the way
    pub errors: Vec<AutorenameError>,
}

impl Traversal {
    /// Total number of files across all batches
    pub fn file_count(&self) -> usize {
        self.batches.iter().map(|b| b.files.len()).sum()
    }
}

/// Make a target absolute without resolving symlinks
pub fn absolute_target(target: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(target)?)
}

/// Expand one target into directory batches
///
/// # Errors
///
/// [`AutorenameError::InvalidTarget`] if the target is neither a file nor a
/// directory (including when it does not exist)
pub fn expand_target(target: &Path) -> Result<Traversal> {
    if target.is_file() {
        let directory = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        return Ok(Traversal {
            batches: vec![DirectoryBatch {
                directory,
                files: vec![target.to_path_buf()],
            }],
            errors: Vec::new(),
        });
    }

    if !target.is_dir() {
        return Err(AutorenameError::InvalidTarget(target.to_path_buf()));
    }

    let mut directories: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    let mut errors = Vec::new();
    for entry in WalkDir::new(target).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Walk error: {}", e);
                errors.push(AutorenameError::from(e));
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            directories.entry(entry.into_path()).or_default();
        } else if file_type.is_file() {
            let path = entry.into_path();
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            directories.entry(parent).or_default().push(path);
        }
    }

    let batches: Vec<DirectoryBatch> = directories
        .into_iter()
        .map(|(directory, files)| DirectoryBatch { directory, files })
        .collect();
    debug!("Expanded {:?} into {} directories", target, batches.len());

    Ok(Traversal { batches, errors })
}
