//! Template context: the three substitution values of a wrapper script.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::marker;

/// Rendering payload for `wrapper.sh.tera`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperContext {
    /// Interpreter for the shebang line.
    pub shell: String,
    /// Ownership marker line, current version.
    pub marker: String,
    /// Target path, already shell-quoted.
    pub target: String,
}

impl WrapperContext {
    pub fn new(shell: &Path, target: &Path) -> Result<Self, RenderError> {
        Ok(Self {
            shell: absolute_utf8(shell)?.to_string(),
            marker: marker::marker_line(),
            target: shell_quote(absolute_utf8(target)?),
        })
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

fn absolute_utf8(path: &Path) -> Result<&str, RenderError> {
    if !path.is_absolute() {
        return Err(RenderError::RelativePath(path.to_path_buf()));
    }
    let text = path
        .to_str()
        .ok_or_else(|| RenderError::NonUtf8Path(path.to_path_buf()))?;
    if text.chars().any(char::is_control) {
        return Err(RenderError::ControlCharacter(path.to_path_buf()));
    }
    Ok(text)
}

/// Quote `value` for POSIX `sh` using single quotes.
///
/// Embedded single quotes become `'\''`.
pub fn shell_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}
