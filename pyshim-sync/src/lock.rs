//! Advisory run lock on `<wrapper dir>/.pyshim.lock`.
//!
//! Held for the whole locked section of a run so two invocations never
//! interleave creates and deletes on the same name. Released on drop.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::SyncError;

pub const LOCK_FILE: &str = ".pyshim.lock";

/// Exclusive lock guard.
#[derive(Debug)]
pub struct WrapperLock {
    file: File,
    path: PathBuf,
}

impl WrapperLock {
    /// Block until the lock on `dir` is ours.
    pub fn acquire(dir: &Path) -> Result<Self, SyncError> {
        let path = dir.join(LOCK_FILE);
        let lock_err = |source| SyncError::Lock {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(lock_err)?;

        if file.try_lock_exclusive().is_err() {
            tracing::info!("waiting for another pyshim run to finish ({})", path.display());
            file.lock_exclusive().map_err(lock_err)?;
        }
        tracing::debug!("locked {}", path.display());

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WrapperLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!("failed to unlock {}: {err}", self.path.display());
        }
    }
}
