//! Directory of copied moon images.

use crate::errors::AppResult;
use crate::store::persistence::ensure_private_dir;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File operations the store needs for image lifecycle.
pub trait ImageFiles {
    /// Creates the image directory if it does not exist.
    fn ensure_dir(&self) -> AppResult<()>;
    /// Copies `source` into the directory as `file_name`, returning the new path.
    fn copy_in(&self, source: &Path, file_name: &str) -> AppResult<PathBuf>;
    /// Whether `file_name` already exists in the directory.
    fn contains(&self, file_name: &str) -> bool;
    /// Deletes a file previously returned by `copy_in`.
    fn delete(&self, path: &Path) -> AppResult<()>;
    /// Every regular file currently in the directory.
    fn list(&self) -> AppResult<Vec<PathBuf>>;
}

/// [`ImageFiles`] over a local directory.
#[derive(Debug, Clone)]
pub struct LocalImageDir {
    dir: PathBuf,
}

impl LocalImageDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalImageDir { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageFiles for LocalImageDir {
    fn ensure_dir(&self) -> AppResult<()> {
        ensure_private_dir(&self.dir)
    }

    fn copy_in(&self, source: &Path, file_name: &str) -> AppResult<PathBuf> {
        let destination = self.dir.join(file_name);
        fs::copy(source, &destination).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to copy {} into image directory: {}", source.display(), e),
            )
        })?;
        debug!("Copied {:?} to {:?}", source, destination);
        Ok(destination)
    }

    fn contains(&self, file_name: &str) -> bool {
        self.dir.join(file_name).exists()
    }

    fn delete(&self, path: &Path) -> AppResult<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    fn list(&self) -> AppResult<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let entry = entry.map_err(|e| {
                std::io::Error::other(format!("Failed to list image directory: {}", e))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}
