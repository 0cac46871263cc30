//! Domain types shared by the scanner, wrapper store and writer.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Prefix of entries in the wrapper directory that belong to pyshim itself
/// (the lock file and in-flight temp files). They are never wrappers.
pub const RESERVED_PREFIX: &str = ".pyshim";

/// `true` for names pyshim keeps for its own bookkeeping.
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// `true` if `text` holds a control character (line breaks included).
/// Such names and paths cannot be written onto a single wrapper line.
pub fn contains_control(text: &str) -> bool {
    text.chars().any(char::is_control)
}

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Base filename of an executable, and therefore of its wrapper.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExecutableName(pub String);

impl ExecutableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ExecutableName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExecutableName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Executable
// ---------------------------------------------------------------------------

/// An executable resolved from the search path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executable {
    pub name: ExecutableName,
    /// Absolute path as listed in its search directory.
    pub target: PathBuf,
}

impl Executable {
    pub fn new(name: impl Into<ExecutableName>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SearchPath
// ---------------------------------------------------------------------------

/// Ordered list of directories; earlier entries win on name collisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchPath(Vec<PathBuf>);

impl SearchPath {
    /// Build from an ordered list, dropping empty entries and later duplicates.
    ///
    /// Relative entries are kept here and rejected by the scanner, which
    /// reports them as warnings.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut out: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            let dir = dir.into();
            if dir.as_os_str().is_empty() || out.contains(&dir) {
                continue;
            }
            out.push(dir);
        }
        Self(out)
    }

    /// Parse a `PATH`-style value (`:`-separated on unix).
    pub fn parse(value: &OsStr) -> Self {
        Self::new(std::env::split_paths(value))
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
