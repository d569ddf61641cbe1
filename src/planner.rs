//! Rename planning
//!
//! The [`RenamePlanner`] turns candidate files into [`RenameDecision`]s. It
//! never touches the filesystem beyond reading: stat, hash, configuration
//! lookups, and existence checks for target names.
//!
//! ## Per-directory batches
//!
//! Files are grouped by directory and each group is planned as a whole:
//!
//! 1. Every file is checked on its own (marker, extension, date prefix,
//!    already canonical). Survivors become candidates with a target name.
//! 2. Candidates are grouped by target name. Every member of a group with more
//!    than one file is in conflict, as is a lone candidate whose target exists
//!    on disk or was handed to another file by an earlier plan.
//! 3. Whatever is left is renamed and its target is recorded as claimed.
//!
//! Because step 2 looks at whole groups, the outcome does not depend on the
//! order files are supplied in: two files that want the same name are both
//! reported, not just the second one.
//!
//! With [`CollisionPolicy::ExtendDigest`] step 2 lengthens the digest segment
//! of every file in a collision by one character and tries again, until the
//! names are unique or the digest is used up. Files with identical content in
//! the same timestamp bucket can never be told apart and always conflict.

use crate::config::{ConfigResolver, ConfigSource, IniConfigSource};
use crate::error::Result;
use crate::hasher::{ContentHasher, Md5Hasher};
use crate::naming::NameFormatter;
use crate::skip::{self, NameCheck};
use crate::types::{
    CollisionPolicy, ConflictReason, FileRecord, PlannedFile, RenameDecision, SkipReason, TimeBasis,
};
use chrono::{DateTime, FixedOffset};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Options that shape planning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlannerOptions {
    /// How name collisions are handled
    pub collision_policy: CollisionPolicy,
    /// Clock used to read modification times
    pub time_basis: TimeBasis,
}

/// Decides what happens to each candidate file
///
/// # Examples
///
/// ```rust
/// use autorename::planner::{PlannerOptions, RenamePlanner};
/// use autorename::types::{FileRecord, Granularity, RenameDecision};
/// use autorename::error::ConfigError;
/// use chrono::{FixedOffset, TimeZone};
/// use std::path::Path;
///
/// let config = |_: &Path| -> Result<Option<Granularity>, ConfigError> { Ok(None) };
/// let mut planner = RenamePlanner::new(config, PlannerOptions::default());
///
/// let modified = FixedOffset::east_opt(0).unwrap()
///     .with_ymd_and_hms(2020, 1, 1, 12, 34, 0).unwrap();
/// let record = FileRecord::new("/no/such/dir/Copy of IMAGE-1 (2).JPG", modified)
///     .with_digest("98ecf8427e5f0a1b2c3d");
///
/// let planned = planner.plan_records(vec![record]);
/// assert_eq!(
///     planned[0].decision.as_ref().unwrap(),
///     &RenameDecision::Rename("2020-01-01-98ecf8427e.jpg".to_string())
/// );
/// ```
#[derive(Debug)]
pub struct RenamePlanner<S = IniConfigSource, H = Md5Hasher> {
    resolver: ConfigResolver<S>,
    hasher: H,
    options: PlannerOptions,
    /// Targets handed out so far, per directory, with the file holding each
    claimed: HashMap<PathBuf, HashMap<String, PathBuf>>,
}

impl<S: ConfigSource> RenamePlanner<S, Md5Hasher> {
    /// Planner hashing with MD5
    pub fn new(source: S, options: PlannerOptions) -> Self {
        Self::with_hasher(source, Md5Hasher, options)
    }
}

impl<S: ConfigSource, H: ContentHasher> RenamePlanner<S, H> {
    /// Planner with a custom content hasher
    pub fn with_hasher(source: S, hasher: H, options: PlannerOptions) -> Self {
        Self {
            resolver: ConfigResolver::new(source),
            hasher,
            options,
            claimed: HashMap::new(),
        }
    }

    /// Options in effect
    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Configuration resolver and its cache
    pub fn resolver(&self) -> &ConfigResolver<S> {
        &self.resolver
    }

    /// File that holds the claim on `name` in `dir`, if any
    pub fn claim_holder(&self, dir: &Path, name: &str) -> Option<&Path> {
        self.claimed
            .get(dir)
            .and_then(|claims| claims.get(name))
            .map(PathBuf::as_path)
    }

    /// Stat and plan files given by path
    ///
    /// Paths that cannot be stat'ed come back as failed entries; the rest
    /// are planned normally.
    pub fn plan_paths<I, P>(&mut self, paths: I) -> Vec<PlannedFile>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut records = Vec::new();
        let mut failed = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match FileRecord::from_path(path, self.options.time_basis) {
                Ok(record) => records.push(record),
                Err(e) => failed.push(PlannedFile::failed(path, e)),
            }
        }

        let mut planned = self.plan_records(records);
        planned.extend(failed);
        planned
    }

    /// Plan records, one directory batch at a time
    pub fn plan_records(&mut self, records: Vec<FileRecord>) -> Vec<PlannedFile> {
        let mut batches: BTreeMap<PathBuf, Vec<FileRecord>> = BTreeMap::new();
        for record in records {
            batches
                .entry(record.directory().to_path_buf())
                .or_default()
                .push(record);
        }

        let mut planned = Vec::new();
        for (dir, batch) in batches {
            planned.extend(self.plan_batch(&dir, batch));
        }
        planned
    }

    fn plan_batch(&mut self, dir: &Path, mut records: Vec<FileRecord>) -> Vec<PlannedFile> {
        records.sort_by(|a, b| a.path().cmp(b.path()));
        records.dedup_by(|a, b| a.path() == b.path());

        let mut slots: Vec<Option<PlannedFile>> = Vec::with_capacity(records.len());
        let mut candidates = Vec::new();
        for record in &records {
            match self.evaluate(dir, record) {
                Ok(Evaluation::Decided(decision)) => {
                    trace!("{:?}: {}", record.path(), decision);
                    slots.push(Some(PlannedFile::decided(record.path(), decision)));
                }
                Ok(Evaluation::Candidate(mut candidate)) => {
                    candidate.slot = slots.len();
                    candidates.push(candidate);
                    slots.push(None);
                }
                Err(e) => slots.push(Some(PlannedFile::failed(record.path(), e))),
            }
        }

        let candidate_count = candidates.len();
        let extend = self.options.collision_policy == CollisionPolicy::ExtendDigest;
        let claims = self.claimed.entry(dir.to_path_buf()).or_default();
        for (slot, source, decision) in resolve_collisions(dir, candidates, claims, extend) {
            slots[slot] = Some(PlannedFile::decided(source, decision));
        }

        debug!(
            "Planned {} files in {:?} ({} rename candidates)",
            records.len(),
            dir,
            candidate_count
        );
        slots.into_iter().flatten().collect()
    }

    fn evaluate(&mut self, dir: &Path, record: &FileRecord) -> Result<Evaluation> {
        let file_name = record.file_name()?;
        let extension = match skip::check_name(file_name) {
            NameCheck::Marker => return Ok(Evaluation::Decided(RenameDecision::Delete)),
            NameCheck::Skip(reason) => return Ok(Evaluation::Decided(RenameDecision::Skip(reason))),
            NameCheck::Candidate(extension) => extension,
        };

        let granularity = self.resolver.resolve(dir)?;
        let formatter = NameFormatter::new(granularity);
        let digest = record.digest(&self.hasher)?;
        if formatter.is_canonical(file_name, record.modified(), digest, extension) {
            return Ok(Evaluation::Decided(RenameDecision::Skip(
                SkipReason::AlreadyCanonical,
            )));
        }

        Ok(Evaluation::Candidate(Candidate {
            slot: 0,
            source: record.path().to_path_buf(),
            formatter,
            modified: *record.modified(),
            digest: digest.to_string(),
            extension,
            digest_len: crate::naming::DIGEST_PREFIX_LEN,
        }))
    }
}

enum Evaluation {
    Decided(RenameDecision),
    Candidate(Candidate),
}

struct Candidate {
    slot: usize,
    source: PathBuf,
    formatter: NameFormatter,
    modified: DateTime<FixedOffset>,
    digest: String,
    extension: &'static str,
    digest_len: usize,
}

impl Candidate {
    fn name(&self) -> String {
        self.formatter
            .format(&self.modified, &self.digest, self.digest_len, self.extension)
    }

    fn full_name(&self) -> String {
        self.formatter
            .format(&self.modified, &self.digest, self.digest.len(), self.extension)
    }

    fn can_extend(&self) -> bool {
        self.digest_len < self.digest.len()
    }
}

/// Settle the final decision of every candidate in one directory
fn resolve_collisions(
    dir: &Path,
    mut candidates: Vec<Candidate>,
    claims: &mut HashMap<String, PathBuf>,
    extend: bool,
) -> Vec<(usize, PathBuf, RenameDecision)> {
    let mut decisions: Vec<Option<RenameDecision>> = vec![None; candidates.len()];

    let others = |candidates: &[Candidate], group: &[usize], me: usize| -> Vec<PathBuf> {
        group
            .iter()
            .filter(|&&other| other != me)
            .map(|&other| candidates[other].source.clone())
            .collect()
    };

    let mut by_full_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, candidate) in candidates.iter().enumerate() {
        by_full_name.entry(candidate.full_name()).or_default().push(index);
    }
    for group in by_full_name.values().filter(|group| group.len() > 1) {
        for &index in group {
            decisions[index] = Some(RenameDecision::Conflict(ConflictReason::DuplicateContent {
                target: candidates[index].name(),
                others: others(&candidates, group, index),
            }));
        }
    }

    loop {
        let mut by_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, candidate) in candidates.iter().enumerate() {
            if decisions[index].is_none() {
                by_name.entry(candidate.name()).or_default().push(index);
            }
        }

        let mut extended = false;
        for (name, group) in &by_name {
            if group.len() > 1 {
                for &index in group {
                    if extend && candidates[index].can_extend() {
                        candidates[index].digest_len += 1;
                        extended = true;
                    } else {
                        decisions[index] =
                            Some(RenameDecision::Conflict(ConflictReason::SharedTarget {
                                target: name.clone(),
                                others: others(&candidates, group, index),
                            }));
                    }
                }
                continue;
            }

            let index = group[0];
            let blocked = match claims.get(name) {
                Some(holder) if *holder != candidates[index].source => {
                    Some(ConflictReason::ClaimedEarlier {
                        target: name.clone(),
                        by: holder.clone(),
                    })
                }
                _ if fs::symlink_metadata(dir.join(name)).is_ok() => Some(ConflictReason::TargetExists {
                    target: name.clone(),
                }),
                _ => None,
            };
            if let Some(reason) = blocked {
                if extend && candidates[index].can_extend() {
                    candidates[index].digest_len += 1;
                    extended = true;
                } else {
                    decisions[index] = Some(RenameDecision::Conflict(reason));
                }
            }
        }

        if !extended {
            break;
        }
    }

    candidates
        .into_iter()
        .zip(decisions)
        .map(|(candidate, decision)| {
            let decision = decision.unwrap_or_else(|| {
                let name = candidate.name();
                if candidate.digest_len > crate::naming::DIGEST_PREFIX_LEN {
                    debug!(
                        "Extended digest of {:?} to {} characters",
                        candidate.source, candidate.digest_len
                    );
                }
                claims.insert(name.clone(), candidate.source.clone());
                RenameDecision::Rename(name)
            });
            (candidate.slot, candidate.source, decision)
        })
        .collect()
}
