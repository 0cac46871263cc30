//! Wrapper store: what is currently in the wrapper directory.
//!
//! Every entry is classified by content, never by name: a file is owned
//! only if it carries the pyshim marker and a parseable `exec` line.
//! Everything else is foreign and is reported but never touched.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};

use pyshim_core::{is_reserved_name, ExecutableName};
use pyshim_renderer::{classify, ForeignReason, Ownership, WrapperInfo};

use crate::error::{dir_err, SyncError};
use crate::lock::LOCK_FILE;
use crate::scanner::ScanWarning;

/// Generated wrappers are a few lines long; anything bigger is not ours.
pub const MAX_WRAPPER_SIZE: u64 = 64 * 1024;

const TEMP_PREFIX: &str = ".pyshim-";
const TEMP_SUFFIX: &str = ".tmp";

/// A file in the wrapper directory that pyshim did not generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignEntry {
    pub name: String,
    pub reason: ForeignReason,
}

/// Current state of the wrapper directory.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub owned: BTreeMap<ExecutableName, WrapperInfo>,
    pub foreign: Vec<ForeignEntry>,
    /// Temp files left behind by an interrupted run.
    pub stale_temps: Vec<PathBuf>,
    pub warnings: Vec<ScanWarning>,
}

impl StoreSnapshot {
    pub fn foreign_reason(&self, name: &str) -> Option<ForeignReason> {
        self.foreign
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.reason)
    }
}

/// Path of the temp file used while writing wrapper `name`.
pub fn temp_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!(
        "{TEMP_PREFIX}{name}.{}{TEMP_SUFFIX}",
        std::process::id()
    ))
}

fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

/// Classify a single path. `NotFound` is returned as an error so callers
/// can tell "vanished" apart from "foreign".
pub fn inspect(path: &Path) -> io::Result<Ownership> {
    let meta = fs::symlink_metadata(path)?;
    if !meta.file_type().is_file() {
        return Ok(Ownership::Foreign(ForeignReason::NotAFile));
    }
    if meta.len() > MAX_WRAPPER_SIZE {
        return Ok(Ownership::Foreign(ForeignReason::TooLarge));
    }
    let mut bytes = Vec::with_capacity(meta.len() as usize);
    fs::File::open(path)?
        .take(MAX_WRAPPER_SIZE + 1)
        .read_to_end(&mut bytes)?;
    if bytes.len() as u64 > MAX_WRAPPER_SIZE {
        return Ok(Ownership::Foreign(ForeignReason::TooLarge));
    }
    Ok(classify(&bytes))
}

/// Snapshot `dir`. A missing directory is an empty snapshot; a directory
/// that exists but cannot be listed is fatal.
pub fn snapshot(dir: &Path) -> Result<StoreSnapshot, SyncError> {
    let mut snap = StoreSnapshot::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(snap),
        Err(err) => return Err(dir_err(dir, err)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| dir_err(dir, e))?;
        names.push(entry.file_name());
    }
    names.sort();

    for raw in names {
        let path = dir.join(&raw);
        let name = match raw.into_string() {
            Ok(name) => name,
            Err(raw) => {
                snap.foreign.push(ForeignEntry {
                    name: raw.to_string_lossy().into_owned(),
                    reason: ForeignReason::NotUtf8,
                });
                continue;
            }
        };

        if is_reserved_name(&name) {
            if is_temp_name(&name) {
                snap.stale_temps.push(path);
            } else if name != LOCK_FILE {
                tracing::debug!("ignoring reserved entry {name}");
            }
            continue;
        }

        match inspect(&path) {
            Ok(Ownership::Owned(info)) => {
                tracing::debug!("owned: {name} -> {}", info.target.display());
                snap.owned.insert(ExecutableName::from(name), info);
            }
            Ok(Ownership::Foreign(reason)) => {
                tracing::debug!("foreign: {name} ({reason})");
                snap.foreign.push(ForeignEntry { name, reason });
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("vanished while listing: {name}");
            }
            Err(err) => {
                let warning = ScanWarning::UnreadableEntry {
                    path,
                    error: err.to_string(),
                };
                tracing::warn!("{warning}");
                snap.warnings.push(warning);
                snap.foreign.push(ForeignEntry {
                    name,
                    reason: ForeignReason::Unreadable,
                });
            }
        }
    }

    Ok(snap)
}

/// Delete temp files left by an interrupted run. Failures are logged only.
pub fn remove_stale_temps(snap: &StoreSnapshot) -> usize {
    let mut removed = 0;
    for path in &snap.stale_temps {
        match fs::remove_file(path) {
            Ok(()) => {
                tracing::info!("removed stale temp file {}", path.display());
                removed += 1;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => tracing::warn!("cannot remove {}: {err}", path.display()),
        }
    }
    removed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
