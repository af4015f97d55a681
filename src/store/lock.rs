//! Cross-process exclusion for the data directory.

use crate::errors::{AppResult, LockError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive advisory lock held for as long as the value lives.
#[derive(Debug)]
pub struct DataDirLock {
    file: File,
    path: PathBuf,
}

impl DataDirLock {
    /// Takes the lock without blocking.
    ///
    /// # Errors
    ///
    /// `LockError::FileBusy` when another process holds it, and
    /// `LockError::AcquisitionFailed` when the lock file cannot be opened.
    pub fn acquire(path: &Path) -> AppResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| LockError::AcquisitionFailed {
                path: path.to_path_buf(),
                source,
            })?;

        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                LockError::FileBusy {
                    path: path.to_path_buf(),
                }
            } else {
                LockError::AcquisitionFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        debug!("Acquired lock {:?}", path);
        Ok(DataDirLock {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("Failed to release lock {:?}: {}", self.path, e);
        }
    }
}
