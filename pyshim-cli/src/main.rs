//! pyshim: keep exposed wrapper scripts in line with the Python runtime.
//!
//! # Usage
//!
//! ```text
//! pyshim [sync] [--dry-run]
//! pyshim status [--json]
//! pyshim diff
//! ```
//!
//! Run with no subcommand after the runtime's executables are installed.

mod commands;
mod exit_codes;
mod logging;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "pyshim",
    version,
    about = "Generate forwarding wrappers for the Python runtime's executables",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create, update and remove wrappers (default).
    Sync(SyncArgs),

    /// Show per-name wrapper status without changing anything.
    Status(StatusArgs),

    /// Show unified diff of what sync would write or delete.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    let command = cli.command.unwrap_or(Commands::Sync(SyncArgs::default()));
    let result = match command {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("pyshim: error: {err:#}");
            ExitCode::from(exit_codes::FATAL)
        }
    }
}
