//! Error types for pyshim-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while rendering a wrapper.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Shell scripts are text; a path that is not UTF-8 cannot be embedded.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// Wrappers must point at absolute paths.
    #[error("path must be absolute: {}", .0.display())]
    RelativePath(PathBuf),

    /// Every wrapper field must stay on its own line.
    #[error("path contains a control character: {:?}", .0)]
    ControlCharacter(PathBuf),
}
