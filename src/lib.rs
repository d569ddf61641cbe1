//! # Autorename - sortable, content-addressed file names
//!
//! Renames files to names that sort by modification time and are unique by
//! content, e.g. `Copy of IMAGE-1 (2).JPG` becomes `2020-01-01-98ecf8427e.jpg`.
//!
//! ## Overview
//!
//! A canonical name has three parts:
//! - a timestamp prefix from the modification time, `YYYY-MM-DD` or
//!   `YYYY-MM-DD-HHMM` depending on the directory's granularity
//! - the first ten hex characters of the file's MD5 digest
//! - the lower-cased extension, with `.jpeg` written as `.jpg`
//!
//! Files are left alone when their extension is not on the allow-list, when
//! their name already starts with a date (a human picked it), or when they
//! already carry their canonical name. Finder and Explorer marker files
//! (`.DS_Store`, `Thumbs.db`) are deleted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autorename::{AutorenameBuilder, ExecutionMode, TimeBasis};
//!
//! let mut autorename = AutorenameBuilder::new()
//!     .mode(ExecutionMode::DryRun)
//!     .time_basis(TimeBasis::Utc)
//!     .build();
//!
//! let summary = autorename.run(&["./Pictures"]);
//! for rename in &summary.renamed {
//!     println!("{} -> {}", rename.from.display(), rename.to.display());
//! }
//! ```
//!
//! ## Directory configuration
//!
//! A `.autorename.ini` file switches a directory tree to minute granularity:
//!
//! ```ini
//! [autorename]
//! prefix_timestamp = minute
//! ```
//!
//! The nearest file up the directory hierarchy wins. See [`config`].
//!
//! ## Collisions
//!
//! Nothing is ever overwritten. Two files that would get the same name are
//! both reported as conflicts, whatever order they were found in. With
//! [`CollisionPolicy::ExtendDigest`] the digest segment is lengthened instead
//! until the names differ. See [`planner`].
//!
//! ## Module Organization
//!
//! - [`autorename`]: facade composing the pieces below
//! - [`config`]: per-directory granularity
//! - [`hasher`]: content digests
//! - [`naming`]: canonical name formatting
//! - [`skip`]: files that must not be renamed
//! - [`planner`]: rename decisions and collision handling
//! - [`traversal`]: expanding targets into directory batches
//! - [`executor`]: applying decisions, run summaries
//! - [`types`]: common types
//! - [`error`]: error types

pub mod autorename;
pub mod config;
pub mod error;
pub mod executor;
pub mod hasher;
pub mod naming;
pub mod planner;
pub mod skip;
pub mod traversal;
pub mod types;

// Re-export main types for convenience
pub use crate::autorename::{Autorename, AutorenameBuilder, RunPlan};
pub use crate::config::{ConfigResolver, ConfigSource, IniConfigSource};
pub use crate::error::{AutorenameError, ConfigError, Result};
pub use crate::executor::{Executor, RunSummary};
pub use crate::hasher::{ContentHasher, Md5Hasher};
pub use crate::naming::NameFormatter;
pub use crate::planner::{PlannerOptions, RenamePlanner};
pub use crate::types::*;
