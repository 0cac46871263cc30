//! Ownership marker and wrapper parsing.
//!
//! # Wrapper layout
//!
//! ```text
//! #!/system/bin/sh
//! # pyshim-wrapper v1: generated by pyshim, do not edit
//! exec '/data/adb/python/bin/pip3' "$@"
//! ```
//!
//! Line 2 carries the versioned marker. Every version listed in
//! [`KNOWN_VERSIONS`] is recognised so wrappers written by an older pyshim
//! are still owned (and therefore still replaceable and removable). A
//! marker with any other version is treated as foreign.

use std::fmt;
use std::path::PathBuf;

/// Fixed part of the marker line, up to the version number.
pub const MARKER_PREFIX: &str = "# pyshim-wrapper v";
/// Version written by this build.
pub const MARKER_VERSION: u32 = 1;
/// Versions this build can parse.
pub const KNOWN_VERSIONS: &[u32] = &[1];

const MARKER_SUFFIX: &str = ": generated by pyshim, do not edit";
const FORWARD_ARGS: &str = "\"$@\"";

/// Only this many leading bytes are inspected for binary content.
const BINARY_SNIFF_LEN: usize = 1024;

/// The marker line for [`MARKER_VERSION`].
pub fn marker_line() -> String {
    format!("{MARKER_PREFIX}{MARKER_VERSION}{MARKER_SUFFIX}")
}

/// What an owned wrapper currently says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperInfo {
    pub version: u32,
    pub shell: PathBuf,
    pub target: PathBuf,
}

/// Why a file was not recognised as a pyshim wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignReason {
    NotAFile,
    Unreadable,
    TooLarge,
    Binary,
    NotUtf8,
    NoMarker,
    UnknownVersion(u32),
    MalformedExec,
}

impl fmt::Display for ForeignReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignReason::NotAFile => f.write_str("not a regular file"),
            ForeignReason::Unreadable => f.write_str("unreadable"),
            ForeignReason::TooLarge => f.write_str("too large to be a wrapper"),
            ForeignReason::Binary => f.write_str("binary content"),
            ForeignReason::NotUtf8 => f.write_str("not UTF-8 text"),
            ForeignReason::NoMarker => f.write_str("no pyshim marker"),
            ForeignReason::UnknownVersion(v) => write!(f, "unknown marker version v{v}"),
            ForeignReason::MalformedExec => f.write_str("marker present but exec line malformed"),
        }
    }
}

/// Ownership verdict for a file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    Owned(WrapperInfo),
    Foreign(ForeignReason),
}

impl Ownership {
    pub fn is_owned(&self) -> bool {
        matches!(self, Ownership::Owned(_))
    }
}

/// Classify raw file bytes.
pub fn classify(bytes: &[u8]) -> Ownership {
    if is_binary(&bytes[..bytes.len().min(BINARY_SNIFF_LEN)]) {
        return Ownership::Foreign(ForeignReason::Binary);
    }
    let Ok(text) = std::str::from_utf8(bytes) else {
        return Ownership::Foreign(ForeignReason::NotUtf8);
    };
    match parse_wrapper(text) {
        Ok(info) => Ownership::Owned(info),
        Err(reason) => Ownership::Foreign(reason),
    }
}

/// `true` if `bytes` contain control characters other than the ones text
/// files use (`\a \b \t \n \f \r ESC`), or DEL.
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().any(|&b| {
        let text_control = matches!(b, 7 | 8 | 9 | 10 | 12 | 13 | 27);
        (b < 0x20 && !text_control) || b == 0x7f
    })
}

/// Parse wrapper text into [`WrapperInfo`].
pub fn parse_wrapper(content: &str) -> Result<WrapperInfo, ForeignReason> {
    let mut lines = content.lines();

    let shell = lines
        .next()
        .and_then(|l| l.strip_prefix("#!"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ForeignReason::NoMarker)?;

    let version = lines
        .next()
        .and_then(parse_marker)
        .ok_or(ForeignReason::NoMarker)?;
    if !KNOWN_VERSIONS.contains(&version) {
        return Err(ForeignReason::UnknownVersion(version));
    }

    let exec_line = lines
        .find(|l| !l.trim().is_empty())
        .ok_or(ForeignReason::MalformedExec)?;
    let target = parse_exec(exec_line).ok_or(ForeignReason::MalformedExec)?;

    Ok(WrapperInfo {
        version,
        shell: PathBuf::from(shell),
        target,
    })
}

/// Version number from a marker line, if the line is one.
fn parse_marker(line: &str) -> Option<u32> {
    let rest = line.trim_end().strip_prefix(MARKER_PREFIX)?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let tail = &rest[digits_end..];
    if !(tail.is_empty() || tail.starts_with(':')) {
        return None;
    }
    rest[..digits_end].parse().ok()
}

/// `exec '<target>' "$@"` → target.
fn parse_exec(line: &str) -> Option<PathBuf> {
    let rest = line.trim().strip_prefix("exec")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (word, tail) = unquote_word(rest.trim_start())?;
    if tail.trim() != FORWARD_ARGS {
        return None;
    }
    let target = PathBuf::from(word);
    target.is_absolute().then_some(target)
}

/// Read one shell word made of single-quoted runs and `\'` escapes.
/// Returns the decoded word and the unconsumed tail.
fn unquote_word(input: &str) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut chars = input.char_indices();
    let mut consumed_any = false;

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\'' => {
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '\'' {
                        closed = true;
                        break;
                    }
                    out.push(c);
                }
                if !closed {
                    return None;
                }
                consumed_any = true;
            }
            '\\' => {
                let (_, escaped) = chars.next()?;
                if escaped != '\'' {
                    return None;
                }
                out.push('\'');
                consumed_any = true;
            }
            c if c.is_whitespace() => {
                return consumed_any.then(|| (out, &input[i..]));
            }
            _ => return None,
        }
    }
    consumed_any.then(|| (out, ""))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
