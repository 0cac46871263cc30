//! Scanner: resolve executable names across the search path.
//!
//! Directories are visited in search-path order and the first executable
//! seen for a name wins, the same way a shell resolves `PATH`. The wrapper
//! directory is never scanned, and entries resolving into it are skipped,
//! so a wrapper can never end up wrapping another wrapper.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pyshim_core::{contains_control, is_reserved_name, Config, Executable, ExecutableName};

/// A non-fatal problem met while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    RelativeDirectory { dir: PathBuf },
    UnreadableDirectory { dir: PathBuf, error: String },
    UnreadableEntry { path: PathBuf, error: String },
    NonUtf8Name { path: PathBuf },
    /// Name or directory with a line break or other control character;
    /// it cannot be embedded in a one-line `exec`.
    ControlCharacter { path: PathBuf },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::RelativeDirectory { dir } => {
                write!(f, "ignoring relative search directory {}", dir.display())
            }
            ScanWarning::UnreadableDirectory { dir, error } => {
                write!(f, "cannot list {}: {error}", dir.display())
            }
            ScanWarning::UnreadableEntry { path, error } => {
                write!(f, "cannot stat {}: {error}", path.display())
            }
            ScanWarning::NonUtf8Name { path } => {
                write!(f, "skipping non UTF-8 name {}", path.display())
            }
            ScanWarning::ControlCharacter { path } => {
                write!(f, "skipping name with control character {path:?}")
            }
        }
    }
}

/// Desired state: one executable per resolvable name.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub executables: BTreeMap<ExecutableName, Executable>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    fn warn(&mut self, warning: ScanWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Scan `config.search_path`, excluding `config.wrapper_dir`.
pub fn scan(config: &Config) -> ScanReport {
    let mut report = ScanReport::default();
    let wrapper_dir = canonical_or_self(&config.wrapper_dir);

    for dir in config.search_path.iter() {
        if !dir.is_absolute() {
            report.warn(ScanWarning::RelativeDirectory {
                dir: dir.to_path_buf(),
            });
            continue;
        }
        let Some(text) = dir.to_str() else {
            report.warn(ScanWarning::NonUtf8Name {
                path: dir.to_path_buf(),
            });
            continue;
        };
        if contains_control(text) {
            report.warn(ScanWarning::ControlCharacter {
                path: dir.to_path_buf(),
            });
            continue;
        }
        if canonical_or_self(dir) == wrapper_dir {
            tracing::debug!("not scanning wrapper directory {}", dir.display());
            continue;
        }
        scan_dir(dir, &wrapper_dir, config, &mut report);
    }

    tracing::debug!(
        "resolved {} executable(s) from {} search dir(s)",
        report.executables.len(),
        config.search_path.dirs().len()
    );
    report
}

fn scan_dir(dir: &Path, wrapper_dir: &Path, config: &Config, report: &mut ScanReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            report.warn(ScanWarning::UnreadableDirectory {
                dir: dir.to_path_buf(),
                error: err.to_string(),
            });
            return;
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => names.push(entry.file_name()),
            Err(err) => {
                report.warn(ScanWarning::UnreadableDirectory {
                    dir: dir.to_path_buf(),
                    error: err.to_string(),
                });
                return;
            }
        }
    }
    names.sort();

    for raw in names {
        let path = dir.join(&raw);
        let Ok(name) = raw.into_string() else {
            report.warn(ScanWarning::NonUtf8Name { path });
            continue;
        };
        if contains_control(&name) {
            report.warn(ScanWarning::ControlCharacter { path });
            continue;
        }
        if is_reserved_name(&name) || config.is_excluded(&name) {
            tracing::debug!("excluded: {name}");
            continue;
        }
        let key = ExecutableName::from(name);
        if report.executables.contains_key(&key) {
            tracing::debug!("shadowed: {}", path.display());
            continue;
        }

        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("dangling symlink: {}", path.display());
                continue;
            }
            Err(err) => {
                report.warn(ScanWarning::UnreadableEntry {
                    path,
                    error: err.to_string(),
                });
                continue;
            }
        };
        if !meta.is_file() || !is_executable(&meta) {
            continue;
        }
        if resolves_into(&path, wrapper_dir) {
            tracing::debug!("points into wrapper directory: {}", path.display());
            continue;
        }

        report
            .executables
            .insert(key.clone(), Executable::new(key, path));
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn resolves_into(path: &Path, dir: &Path) -> bool {
    fs::canonicalize(path)
        .map(|real| real.starts_with(dir))
        .unwrap_or(false)
}

#[cfg(unix)]
fn is_executable(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &Metadata) -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
