//! Read-only per-name status for `pyshim status`.
//!
//! Built from the same plan a sync run would execute, so `status` and
//! `sync --dry-run` never disagree.

use std::path::PathBuf;

use serde::Serialize;

use pyshim_core::{Config, ExecutableName};

use crate::error::SyncError;
use crate::pipeline::{plan, PlanReport};
use crate::reconcile::Action;

/// State of one name across the search path and the wrapper directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WrapperState {
    /// Owned wrapper, up to date.
    Current,
    /// Executable without a wrapper.
    Missing,
    /// Owned wrapper that the next sync rewrites.
    Stale { detail: String },
    /// Owned wrapper whose executable is gone.
    Orphan,
    /// File pyshim did not write. `blocked` when it shadows an executable.
    Foreign { blocked: bool, reason: String },
}

impl WrapperState {
    pub fn label(&self) -> &'static str {
        match self {
            WrapperState::Current => "current",
            WrapperState::Missing => "missing",
            WrapperState::Stale { .. } => "stale",
            WrapperState::Orphan => "orphan",
            WrapperState::Foreign { .. } => "foreign",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub name: ExecutableName,
    /// Executable the name resolves to, or the wrapper's target for orphans.
    pub target: Option<PathBuf>,
    #[serde(flatten)]
    pub state: WrapperState,
}

/// Classify every name seen in the search path or the wrapper directory.
pub fn status(config: &Config) -> Result<Vec<StatusEntry>, SyncError> {
    Ok(entries_from(&plan(config)?))
}

fn entries_from(report: &PlanReport) -> Vec<StatusEntry> {
    let mut entries: Vec<StatusEntry> = report
        .plan
        .actions
        .iter()
        .map(|action| match action {
            Action::Unchanged { name, target } => StatusEntry {
                name: name.clone(),
                target: Some(target.clone()),
                state: WrapperState::Current,
            },
            Action::Create { name, target } => StatusEntry {
                name: name.clone(),
                target: Some(target.clone()),
                state: WrapperState::Missing,
            },
            Action::Update {
                name,
                from,
                to,
                reason,
            } => StatusEntry {
                name: name.clone(),
                target: Some(to.clone()),
                state: WrapperState::Stale {
                    detail: format!("{reason} (wrapper forwards to {})", from.display()),
                },
            },
            Action::Remove { name, target } => StatusEntry {
                name: name.clone(),
                target: Some(target.clone()),
                state: WrapperState::Orphan,
            },
            Action::Conflict {
                name,
                target,
                reason,
            } => StatusEntry {
                name: name.clone(),
                target: Some(target.clone()),
                state: WrapperState::Foreign {
                    blocked: true,
                    reason: reason.to_string(),
                },
            },
        })
        .collect();

    for foreign in &report.snapshot.foreign {
        let name = ExecutableName::from(foreign.name.as_str());
        if report.scan.executables.contains_key(&name) {
            continue;
        }
        entries.push(StatusEntry {
            name,
            target: None,
            state: WrapperState::Foreign {
                blocked: false,
                reason: foreign.reason.to_string(),
            },
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}
