//! Durable key-value slot holding the serialized moon log.

use crate::errors::AppResult;
use std::fs::{self, Permissions};
use std::io::{ErrorKind, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A key-value slot the store serializes its whole log into.
pub trait LogPersistence {
    /// Returns the stored value, or `None` when the key was never written.
    fn load(&self, key: &str) -> AppResult<Option<String>>;
    /// Replaces the value under `key`.
    fn save(&self, key: &str, value: &str) -> AppResult<()>;
    /// Removes `key`; removing an absent key succeeds.
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary file in the same directory which is then renamed over
/// the target, so readers see either the old or the new log.
#[derive(Debug, Clone)]
pub struct FileKeyValue {
    dir: PathBuf,
}

impl FileKeyValue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileKeyValue { dir: dir.into() }
    }

    /// Path of the file backing `key`.
    ///
    /// Keys like `@lunar_log` are reduced to `[A-Za-z0-9_-]` so they are safe file
    /// names.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        let name = if name.is_empty() { "store" } else { &name };
        self.dir.join(format!("{}.json", name))
    }

    fn ensure_dir(&self) -> AppResult<()> {
        ensure_private_dir(&self.dir)
    }
}

/// Creates `dir` (and parents) if missing, restricting it to the owner on Unix.
pub(crate) fn ensure_private_dir(dir: &Path) -> AppResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to create directory {}: {}", dir.display(), e),
            )
        })?;

        #[cfg(unix)]
        {
            fs::set_permissions(
                dir,
                Permissions::from_mode(crate::constants::DEFAULT_DIR_PERMISSIONS),
            )?;
            debug!("Set 0o700 permissions on {:?}", dir);
        }
    }
    Ok(())
}

impl LogPersistence for FileKeyValue {
    fn load(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> AppResult<()> {
        self.ensure_dir()?;
        let path = self.path_for(key);

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(value.as_bytes())?;
        temp.as_file().sync_all()?;

        #[cfg(unix)]
        temp.as_file().set_permissions(Permissions::from_mode(
            crate::constants::DEFAULT_FILE_PERMISSIONS,
        ))?;

        temp.persist(&path).map_err(|e| e.error)?;
        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_key_is_none() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let kv = FileKeyValue::new(temp_dir.path());

        assert_eq!(kv.load("@lunar_log").unwrap(), None);
    }

    #[test]
    fn test_save_then_load_and_remove() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let kv = FileKeyValue::new(temp_dir.path().join("nested"));

        kv.save("@lunar_log", "{\"version\":1}").unwrap();
        assert_eq!(
            kv.load("@lunar_log").unwrap().as_deref(),
            Some("{\"version\":1}")
        );

        kv.save("@lunar_log", "{}").unwrap();
        assert_eq!(kv.load("@lunar_log").unwrap().as_deref(), Some("{}"));

        kv.remove("@lunar_log").unwrap();
        assert_eq!(kv.load("@lunar_log").unwrap(), None);
        // Removing again is fine
        kv.remove("@lunar_log").unwrap();
    }

    #[test]
    fn test_path_for_sanitizes_key() {
        let kv = FileKeyValue::new("/data");
        assert_eq!(kv.path_for("@lunar_log"), PathBuf::from("/data/lunar_log.json"));
        assert_eq!(kv.path_for("../x"), PathBuf::from("/data/x.json"));
        assert_eq!(kv.path_for("@@"), PathBuf::from("/data/store.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let kv = FileKeyValue::new(temp_dir.path());

        kv.save("@lunar_log", "{}").unwrap();

        let metadata = fs::metadata(kv.path_for("@lunar_log")).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }
}
