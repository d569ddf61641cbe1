//! # Autorename CLI
//!
//! Renames files below the given targets to `<timestamp>-<digest>.<ext>`.
//! Nothing is modified unless `--commit` is passed.
//!
//! ## Usage
//! ```bash
//! # See what would happen
//! autorename ~/Pictures/import
//!
//! # Do it
//! autorename --commit ~/Pictures/import
//!
//! # Lengthen digests instead of reporting collisions, print JSON
//! autorename --commit --extend-digest --json ~/Downloads/scan.pdf
//! ```

use autorename::{
    AutorenameBuilder, CollisionPolicy, ExecutionMode, Result, RunSummary, TimeBasis,
};
use clap::Parser;
use colored::*;
use humantime::format_duration;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Rename files to sortable names built from modification time and content hash
#[derive(Parser)]
#[command(name = "autorename")]
#[command(version)]
#[command(about = "Rename files to <timestamp>-<digest>.<ext>")]
#[command(long_about = None)]
struct Cli {
    /// Files or directories to process (directories recursively)
    #[arg(required = true, num_args = 1..)]
    targets: Vec<PathBuf>,

    /// Actually rename and delete files (default is a dry run)
    #[arg(long)]
    commit: bool,

    /// Lengthen the digest segment of colliding names instead of reporting them
    #[arg(long)]
    extend_digest: bool,

    /// Read modification times as UTC instead of local time
    #[arg(long)]
    utc: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(summary) if summary.has_problems() => std::process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<RunSummary> {
    let mode = if cli.commit {
        ExecutionMode::Commit
    } else {
        ExecutionMode::DryRun
    };
    let policy = if cli.extend_digest {
        CollisionPolicy::ExtendDigest
    } else {
        CollisionPolicy::Report
    };
    let basis = if cli.utc { TimeBasis::Utc } else { TimeBasis::Local };

    let mut autorename = AutorenameBuilder::new()
        .mode(mode)
        .collision_policy(policy)
        .time_basis(basis)
        .build();

    let start = Instant::now();
    let summary = autorename.run(&cli.targets);
    let duration = Duration::from_millis(start.elapsed().as_millis() as u64);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, duration);
    }

    Ok(summary)
}

fn print_summary(summary: &RunSummary, duration: Duration) {
    let heading = if summary.mode.is_dry_run() {
        "Dry run complete".blue().bold()
    } else {
        "Done".green().bold()
    };
    println!("{}", heading);

    for rename in &summary.renamed {
        let from = rename
            .from
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let to = rename
            .to
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  {} {} -> {}", "✓".green(), from, to.cyan());
    }
    for path in &summary.deleted {
        println!("  {} {}", "✗".yellow(), path.display());
    }
    for conflict in &summary.conflicts {
        println!(
            "  {} {}: {}",
            "!".red().bold(),
            conflict.path.display(),
            conflict.reason
        );
    }
    for error in &summary.errors {
        println!(
            "  {} {}: {}",
            "Error".red().bold(),
            error.path.display(),
            error.message
        );
    }

    println!();
    println!("  Renamed:   {}", summary.renamed.len().to_string().cyan());
    println!("  Deleted:   {}", summary.deleted.len().to_string().cyan());
    println!("  Skipped:   {}", summary.skipped.to_string().cyan());
    println!("  Conflicts: {}", summary.conflicts.len().to_string().yellow());
    println!("  Errors:    {}", summary.errors.len().to_string().red());
    println!("  Time:      {}", format_duration(duration).to_string().cyan());

    if summary.mode.is_dry_run() && summary.changed() > 0 {
        println!();
        println!("{}", "Run again with --commit to apply these changes".yellow());
    }
}
