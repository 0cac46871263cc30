//! Error types for pyshim-sync.
//!
//! Only structural failures are errors. Per-entry problems are reported as
//! values ([`crate::ScanWarning`], [`crate::EntryOutcome::Failed`]) so the
//! run can continue with the remaining entries.

use std::path::PathBuf;

use thiserror::Error;

use pyshim_core::ConfigError;
use pyshim_renderer::RenderError;

/// All errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The wrapper directory cannot be created, listed or written.
    #[error("wrapper directory {path} is unusable: {source}")]
    WrapperDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The advisory lock could not be taken.
    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::WrapperDir`].
pub(crate) fn dir_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::WrapperDir {
        path: path.into(),
        source,
    }
}
