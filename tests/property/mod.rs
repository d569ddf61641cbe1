//! Property-based testing for Autorename
//!
//! Uses proptest to check planner invariants over randomly generated
//! batches: determinism, idempotence, collision safety, and the date-prefix
//! heuristic.

use ::autorename::skip::{check_name, parse_dated_prefix, NameCheck};
use ::autorename::*;
use chrono::{DateTime, FixedOffset, TimeZone};
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const DIR: &str = "/nonexistent-autorename/property";

type Source = fn(&Path) -> std::result::Result<Option<Granularity>, ConfigError>;

fn day(_: &Path) -> std::result::Result<Option<Granularity>, ConfigError> {
    Ok(None)
}

fn minute(_: &Path) -> std::result::Result<Option<Granularity>, ConfigError> {
    Ok(Some(Granularity::Minute))
}

fn planner(source: Source, collision_policy: CollisionPolicy) -> RenamePlanner<Source> {
    RenamePlanner::new(
        source,
        PlannerOptions {
            collision_policy,
            time_basis: TimeBasis::Utc,
        },
    )
}

/// A file before planning
#[derive(Debug, Clone)]
struct Spec {
    name: String,
    modified: DateTime<FixedOffset>,
    digest: String,
}

impl Spec {
    fn record(&self) -> FileRecord {
        FileRecord::new(Path::new(DIR).join(&self.name), self.modified).with_digest(&self.digest)
    }
}

/// Names that are always rename candidates
fn name_strategy() -> impl Strategy<Value = String> {
    (
        "[a-zA-Z][a-zA-Z0-9 _()-]{0,12}",
        prop::sample::select(vec![".jpg", ".JPG", ".jpeg", ".png", ".pdf", ".mov", ".HEIC"]),
    )
        .prop_map(|(stem, ext)| format!("{}{}", stem, ext))
}

/// Digests drawn from a small pool of prefixes so collisions happen often
fn digest_strategy() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["98ecf8427e", "98ecf8427e", "0123456789", "abcdefabcd"]),
        "[0-9a-f]{22}",
    )
        .prop_map(|(prefix, rest)| format!("{}{}", prefix, rest))
}

/// Modification times within two days so buckets are shared
fn time_strategy() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (1u32..=2, 0u32..24, 0u32..60).prop_map(|(d, h, m)| {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2020, 1, d, h, m, 0)
            .unwrap()
    })
}

fn batch_strategy() -> impl Strategy<Value = Vec<Spec>> {
    prop::collection::vec(
        (name_strategy(), time_strategy(), digest_strategy()).prop_map(|(name, modified, digest)| Spec {
            name,
            modified,
            digest,
        }),
        0..12,
    )
    .prop_map(|specs| {
        // one file per name
        let mut seen = HashSet::new();
        specs
            .into_iter()
            .filter(|spec| seen.insert(spec.name.clone()))
            .collect()
    })
}

fn sorted_decisions(planned: &[PlannedFile]) -> Vec<(PathBuf, RenameDecision)> {
    let mut decisions: Vec<_> = planned
        .iter()
        .map(|p| (p.source.clone(), p.decision.as_ref().unwrap().clone()))
        .collect();
    decisions.sort_by(|a, b| a.0.cmp(&b.0));
    decisions
}

fn policies() -> impl Strategy<Value = CollisionPolicy> {
    prop_oneof![Just(CollisionPolicy::Report), Just(CollisionPolicy::ExtendDigest)]
}

fn sources() -> impl Strategy<Value = Source> {
    prop_oneof![Just(day as Source), Just(minute as Source)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_planning_is_deterministic(
        specs in batch_strategy(),
        source in sources(),
        policy in policies()
    ) {
        let records = || specs.iter().map(Spec::record).collect::<Vec<_>>();
        let first = planner(source, policy).plan_records(records());
        let mut reversed = records();
        reversed.reverse();
        let second = planner(source, policy).plan_records(reversed);
        prop_assert_eq!(sorted_decisions(&first), sorted_decisions(&second));
    }

    #[test]
    fn prop_targets_are_unique(
        specs in batch_strategy(),
        source in sources(),
        policy in policies()
    ) {
        let planned = planner(source, policy).plan_records(specs.iter().map(Spec::record).collect());
        prop_assert_eq!(planned.len(), specs.len());

        let mut targets = HashSet::new();
        for file in &planned {
            if let Ok(RenameDecision::Rename(target)) = &file.decision {
                prop_assert!(targets.insert(target.clone()), "{} handed out twice", target);
            }
        }
    }

    #[test]
    fn prop_renamed_files_are_stable(
        specs in batch_strategy(),
        source in sources(),
        policy in policies()
    ) {
        let planned = planner(source, policy).plan_records(specs.iter().map(Spec::record).collect());

        let renamed: Vec<Spec> = planned
            .iter()
            .filter_map(|file| match &file.decision {
                Ok(RenameDecision::Rename(target)) => {
                    let name = file.source.file_name()?.to_str()?;
                    let spec = specs.iter().find(|s| s.name == name)?;
                    Some(Spec { name: target.clone(), ..spec.clone() })
                }
                _ => None,
            })
            .collect();

        let again = planner(source, policy).plan_records(renamed.iter().map(Spec::record).collect());
        for file in &again {
            prop_assert_eq!(
                file.decision.as_ref().unwrap(),
                &RenameDecision::Skip(SkipReason::AlreadyCanonical),
                "{:?} is not stable", file.source
            );
        }
    }

    #[test]
    fn prop_manual_dates_are_skipped(
        year in 1900u32..2100,
        month in 1u32..=12,
        day in 1u32..=31,
        separator in prop::sample::select(vec![" ", "_"]),
        description in "[A-Za-z][A-Za-z0-9 ]{0,10}"
    ) {
        let name = format!("{:04}-{:02}-{:02}{}{}.jpg", year, month, day, separator, description);
        prop_assert_eq!(check_name(&name), NameCheck::Skip(SkipReason::LooksAlreadyDated));
    }

    #[test]
    fn prop_four_digits_alone_are_not_a_date(
        digits in "[0-9]{4}",
        rest in "[A-Za-z ][A-Za-z0-9 ]{0,10}"
    ) {
        let name = format!("{}{}.jpg", digits, rest);
        prop_assert!(parse_dated_prefix(&name).is_none());
        prop_assert_eq!(check_name(&name), NameCheck::Candidate(".jpg"));
    }

    #[test]
    fn prop_invalid_months_are_not_dates(
        year in 1900u32..2100,
        month in prop_oneof![Just(0u32), 13u32..100],
        day in 1u32..=28
    ) {
        let name = format!("{:04}-{:02}-{:02} party.jpg", year, month, day);
        prop_assert!(parse_dated_prefix(&name).is_none());
    }
}
