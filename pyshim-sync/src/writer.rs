//! Atomic wrapper writer.
//!
//! ## Create / update protocol
//!
//! 1. Render content (pure, no I/O).
//! 2. Create `.pyshim-<name>.<pid>.tmp` exclusively in the wrapper directory.
//! 3. fsync, then mode `0755`.
//! 4. Re-inspect the destination; bail out if it is now foreign.
//! 5. Rename over the destination (atomic on POSIX).
//!
//! The temp file is removed whenever a step after (2) fails.
//!
//! ## Remove protocol
//!
//! Re-inspect the wrapper immediately before unlinking it; a file that no
//! longer carries the marker is left alone and reported.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use pyshim_core::ExecutableName;
use pyshim_renderer::{ForeignReason, Ownership, Renderer};

use crate::error::{io_err, SyncError};
use crate::reconcile::{Action, Plan, UpdateReason};
use crate::store::{inspect, temp_path};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an entry was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A foreign file already holds the name.
    ForeignConflict(ForeignReason),
    /// The file changed under us between the snapshot and the write/delete.
    ChangedOnDisk(ForeignReason),
}

/// Result of applying one [`Action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Created {
        name: ExecutableName,
        target: PathBuf,
    },
    Updated {
        name: ExecutableName,
        from: PathBuf,
        to: PathBuf,
        reason: UpdateReason,
    },
    Removed {
        name: ExecutableName,
        target: PathBuf,
    },
    Unchanged {
        name: ExecutableName,
    },
    Skipped {
        name: ExecutableName,
        reason: SkipReason,
    },
    Failed {
        name: ExecutableName,
        error: String,
    },
}

impl EntryOutcome {
    pub fn name(&self) -> &ExecutableName {
        match self {
            EntryOutcome::Created { name, .. }
            | EntryOutcome::Updated { name, .. }
            | EntryOutcome::Removed { name, .. }
            | EntryOutcome::Unchanged { name }
            | EntryOutcome::Skipped { name, .. }
            | EntryOutcome::Failed { name, .. } => name,
        }
    }

    /// What applying `action` would report, without touching the disk.
    pub fn preview(action: &Action) -> Self {
        match action.clone() {
            Action::Create { name, target } => EntryOutcome::Created { name, target },
            Action::Update {
                name,
                from,
                to,
                reason,
            } => EntryOutcome::Updated {
                name,
                from,
                to,
                reason,
            },
            Action::Remove { name, target } => EntryOutcome::Removed { name, target },
            Action::Unchanged { name, .. } => EntryOutcome::Unchanged { name },
            Action::Conflict { name, reason, .. } => EntryOutcome::Skipped {
                name,
                reason: SkipReason::ForeignConflict(reason),
            },
        }
    }
}

enum Guarded {
    Done,
    Foreign(ForeignReason),
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Applies a [`Plan`] to one wrapper directory.
///
/// The caller holds the run lock for as long as the writer is used.
pub struct Writer<'a> {
    dir: &'a Path,
    renderer: &'a Renderer,
}

impl<'a> Writer<'a> {
    pub fn new(dir: &'a Path, renderer: &'a Renderer) -> Self {
        Self { dir, renderer }
    }

    /// Apply every action. Never stops early: a failing entry is recorded
    /// as [`EntryOutcome::Failed`] and the next entry is processed.
    pub fn apply(&self, plan: &Plan) -> Vec<EntryOutcome> {
        plan.actions.iter().map(|a| self.apply_one(a)).collect()
    }

    fn apply_one(&self, action: &Action) -> EntryOutcome {
        let name = action.name().clone();
        let result = match action {
            Action::Create { target, .. } | Action::Update { to: target, .. } => {
                self.write_wrapper(&name, target)
            }
            Action::Remove { .. } => self.remove_wrapper(&name),
            Action::Unchanged { .. } | Action::Conflict { .. } => {
                return EntryOutcome::preview(action);
            }
        };

        match result {
            Ok(Guarded::Done) => EntryOutcome::preview(action),
            Ok(Guarded::Foreign(reason)) => {
                tracing::warn!("{name}: changed on disk ({reason}); left untouched");
                EntryOutcome::Skipped {
                    name,
                    reason: SkipReason::ChangedOnDisk(reason),
                }
            }
            Err(err) => {
                tracing::warn!("{name}: {err}");
                EntryOutcome::Failed {
                    name,
                    error: err.to_string(),
                }
            }
        }
    }

    fn write_wrapper(&self, name: &ExecutableName, target: &Path) -> Result<Guarded, SyncError> {
        let content = self.renderer.render(target)?;
        let path = self.dir.join(name.as_str());
        let tmp = temp_path(self.dir, name.as_str());
        let written = atomic_write_with_tmp(&path, &content, &tmp)?;
        if matches!(written, Guarded::Done) {
            tracing::info!("wrote: {} -> {}", path.display(), target.display());
        }
        Ok(written)
    }

    fn remove_wrapper(&self, name: &ExecutableName) -> Result<Guarded, SyncError> {
        let path = self.dir.join(name.as_str());
        match inspect(&path) {
            Ok(Ownership::Owned(_)) => {}
            Ok(Ownership::Foreign(reason)) => return Ok(Guarded::Foreign(reason)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("already gone: {}", path.display());
                return Ok(Guarded::Done);
            }
            Err(err) => return Err(io_err(&path, err)),
        }
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(io_err(&path, err)),
        }
        tracing::info!("removed: {}", path.display());
        Ok(Guarded::Done)
    }
}

// ---------------------------------------------------------------------------
// atomic write
// ---------------------------------------------------------------------------

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<Guarded, SyncError> {
    if let Err(e) = write_executable(tmp, content) {
        // Whatever already sat at the temp name is not ours to delete.
        if e.kind() != ErrorKind::AlreadyExists {
            let _ = fs::remove_file(tmp);
        }
        return Err(io_err(tmp, e));
    }

    match inspect(path) {
        Ok(Ownership::Owned(_)) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Ok(Ownership::Foreign(reason)) => {
            let _ = fs::remove_file(tmp);
            return Ok(Guarded::Foreign(reason));
        }
        Err(err) => {
            let _ = fs::remove_file(tmp);
            return Err(io_err(path, err));
        }
    }

    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(Guarded::Done)
}

fn write_executable(tmp: &Path, content: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(tmp)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    set_executable(tmp)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
