//! `pyshim status`: per-name wrapper visibility.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use pyshim_sync::{status, StatusEntry, WrapperState};

use crate::exit_codes;

/// Arguments for `pyshim status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<u8> {
        let config = super::load_config()?;
        let entries = status(&config).with_context(|| {
            format!("status failed for {}", config.wrapper_dir.display())
        })?;

        if self.json {
            print_json(&config.wrapper_dir.display().to_string(), &entries)?;
        } else {
            print_table(&config.wrapper_dir.display().to_string(), entries);
        }
        Ok(exit_codes::OK)
    }
}

#[derive(Serialize)]
struct StatusReportJson<'a> {
    wrapper_dir: &'a str,
    summary: StatusSummaryJson,
    entries: &'a [StatusEntry],
}

#[derive(Serialize)]
struct StatusSummaryJson {
    names: usize,
    needs_sync: usize,
    foreign: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "target")]
    target: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn summarize(entries: &[StatusEntry]) -> StatusSummaryJson {
    StatusSummaryJson {
        names: entries.len(),
        needs_sync: entries.iter().filter(|e| needs_sync(&e.state)).count(),
        foreign: entries
            .iter()
            .filter(|e| matches!(e.state, WrapperState::Foreign { .. }))
            .count(),
    }
}

fn needs_sync(state: &WrapperState) -> bool {
    matches!(
        state,
        WrapperState::Missing | WrapperState::Stale { .. } | WrapperState::Orphan
    )
}

fn print_json(wrapper_dir: &str, entries: &[StatusEntry]) -> Result<()> {
    let payload = StatusReportJson {
        wrapper_dir,
        summary: summarize(entries),
        entries,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(wrapper_dir: &str, entries: Vec<StatusEntry>) {
    let summary = summarize(&entries);
    println!(
        "pyshim v{} | {wrapper_dir} | {} names | {} need sync | {} foreign",
        env!("CARGO_PKG_VERSION"),
        summary.names,
        summary.needs_sync,
        summary.foreign,
    );

    if entries.is_empty() {
        println!("No executables or wrappers found.");
        return;
    }

    let rows: Vec<StatusTableRow> = entries
        .into_iter()
        .map(|entry| StatusTableRow {
            status: state_label(&entry.state),
            detail: state_detail(&entry.state),
            name: entry.name.to_string(),
            target: entry
                .target
                .map(|t| t.display().to_string())
                .unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if summary.needs_sync > 0 {
        println!("Run 'pyshim sync' to update wrappers.");
    }
}

fn state_label(state: &WrapperState) -> String {
    match state {
        WrapperState::Foreign { blocked: true, .. } => "FOREIGN (blocking)".to_string(),
        other => other.label().to_uppercase(),
    }
}

fn state_detail(state: &WrapperState) -> String {
    match state {
        WrapperState::Current => "up to date".to_string(),
        WrapperState::Missing => "no wrapper yet".to_string(),
        WrapperState::Stale { detail } => detail.clone(),
        WrapperState::Orphan => "executable gone".to_string(),
        WrapperState::Foreign {
            blocked: true,
            reason,
        } => format!("blocks wrapper: {reason}"),
        WrapperState::Foreign { reason, .. } => reason.clone(),
    }
}
