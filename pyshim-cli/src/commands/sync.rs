//! `pyshim sync`: bring the wrapper directory in line with the search path.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use pyshim_sync::{pipeline, EntryOutcome, SkipReason, SyncReport};

use crate::exit_codes;

/// Arguments for `pyshim sync`.
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Show what would change without creating, writing or deleting anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<u8> {
        let config = super::load_config()?;
        let report = pipeline::run(&config, self.dry_run).with_context(|| {
            format!("sync failed for {}", config.wrapper_dir.display())
        })?;

        print_report(&report);
        Ok(exit_code(&report))
    }
}

fn exit_code(report: &SyncReport) -> u8 {
    if report.has_failures() {
        exit_codes::ENTRY_FAILURES
    } else {
        exit_codes::OK
    }
}

fn print_report(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };

    for outcome in &report.outcomes {
        if let Some(line) = outcome_line(outcome) {
            eprintln!("{prefix}{line}");
        }
    }
    for foreign in &report.foreign {
        let blocks = report
            .outcomes
            .iter()
            .any(|o| o.name().as_str() == foreign.name);
        if !blocks {
            eprintln!(
                "{prefix}{} {}: foreign file left alone ({})",
                "?".bright_black(),
                foreign.name,
                foreign.reason
            );
        }
    }

    let c = report.counts();
    eprintln!(
        "pyshim: {} created, {} updated, {} removed, {} unchanged, {} skipped, {} failed",
        c.created, c.updated, c.removed, c.unchanged, c.skipped, c.failed
    );
}

fn outcome_line(outcome: &EntryOutcome) -> Option<String> {
    let line = match outcome {
        EntryOutcome::Created { name, target } => {
            format!("{} {name} -> {}", "+".green(), target.display())
        }
        EntryOutcome::Updated {
            name, to, reason, ..
        } => format!("{} {name} -> {} ({reason})", "~".yellow(), to.display()),
        EntryOutcome::Removed { name, target } => {
            format!("{} {name} (was {})", "-".red(), target.display())
        }
        EntryOutcome::Unchanged { .. } => return None,
        EntryOutcome::Skipped {
            name,
            reason: SkipReason::ForeignConflict(reason),
        } => format!(
            "{} {name}: conflicts with foreign file ({reason}), skipped",
            "!".yellow()
        ),
        EntryOutcome::Skipped {
            name,
            reason: SkipReason::ChangedOnDisk(reason),
        } => format!(
            "{} {name}: changed on disk ({reason}), skipped",
            "!".yellow()
        ),
        EntryOutcome::Failed { name, error } => {
            format!("{} {name}: {error}", "x".red().bold())
        }
    };
    Some(line)
}
