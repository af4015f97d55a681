//! Date-indexed persistent moon journal.
//!
//! [`EntryStore`] owns the map from calendar date to [`MoonEntry`]. It is built from
//! three injected collaborators:
//!
//! - [`LogPersistence`]: the key-value slot the whole log is serialized into
//! - [`ImageFiles`]: the directory copied images live in
//! - [`Clock`]: "now", for stamping today's entry and naming image files
//!
//! Every mutation rewrites the entire log. There is no incremental persistence;
//! a failure between mutation and write loses that one mutation.
//!
//! Writers are serialized by `&mut self`. Callers sharing a data directory across
//! processes hold a [`DataDirLock`] for the store's lifetime.
//!
//! # Example
//!
//! ```no_run
//! use lunar_log::store::{EntryPatch, EntryStore, FileKeyValue, LocalImageDir, SystemClock};
//! use std::path::Path;
//!
//! let mut store = EntryStore::new(
//!     Box::new(FileKeyValue::new("/data/lunar-log")),
//!     Box::new(LocalImageDir::new("/data/lunar-log/moon_images")),
//!     Box::new(SystemClock),
//! );
//! store.init()?;
//! let image = store.save_image(Path::new("/tmp/cropped.png"))?;
//! store.add_entry_for_today(EntryPatch::captured(image, 0.5))?;
//! # Ok::<(), lunar_log::AppError>(())
//! ```

pub mod clock;
pub mod entry;
pub mod images;
pub mod lock;
pub mod persistence;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entry::{DayStatus, EntryPatch, MoonEntry, MoonLog};
pub use images::{ImageFiles, LocalImageDir};
pub use lock::DataDirLock;
pub use persistence::{FileKeyValue, LogPersistence};

use crate::constants;
use crate::errors::{AppResult, StoreError};
use chrono::NaiveDate;
use entry::StoredLog;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct EntryStore {
    persistence: Box<dyn LogPersistence>,
    images: Box<dyn ImageFiles>,
    clock: Box<dyn Clock>,
    log: MoonLog,
    initialized: bool,
}

impl EntryStore {
    /// Creates an uninitialized store. Call [`EntryStore::init`] before use.
    pub fn new(
        persistence: Box<dyn LogPersistence>,
        images: Box<dyn ImageFiles>,
        clock: Box<dyn Clock>,
    ) -> Self {
        EntryStore {
            persistence,
            images,
            clock,
            log: MoonLog::default(),
            initialized: false,
        }
    }

    /// Ensures the image directory exists and loads the persisted log.
    ///
    /// Idempotent: later calls return immediately. An empty slot yields an empty
    /// version-1 log.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the directory or slot cannot be accessed and
    /// `StoreError::Corrupt` / `StoreError::InvalidDateKey` if the stored log
    /// cannot be read back.
    pub fn init(&mut self) -> AppResult<()> {
        if self.initialized {
            return Ok(());
        }

        self.images.ensure_dir()?;

        if let Some(raw) = self.persistence.load(constants::STORAGE_KEY)? {
            let stored: StoredLog =
                serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                    key: constants::STORAGE_KEY.to_string(),
                    source,
                })?;
            self.log = MoonLog::from_stored(stored)?;
        }

        self.initialized = true;
        info!("Loaded moon log with {} entries", self.log.entries.len());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> AppResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StoreError::NotInitialized.into())
        }
    }

    fn save(&self) -> AppResult<()> {
        let json =
            serde_json::to_string(&self.log.to_stored()).map_err(StoreError::Serialize)?;
        self.persistence.save(constants::STORAGE_KEY, &json)?;
        debug!("Persisted moon log ({} entries)", self.log.entries.len());
        Ok(())
    }

    pub fn get_entry(&self, date: NaiveDate) -> AppResult<Option<&MoonEntry>> {
        self.ensure_initialized()?;
        Ok(self.log.entries.get(&date))
    }

    /// Snapshot copy of every entry.
    pub fn all_entries(&self) -> AppResult<BTreeMap<NaiveDate, MoonEntry>> {
        Ok(self.entries()?.clone())
    }

    /// Borrowed view of every entry, for building a calendar without copying.
    pub fn entries(&self) -> AppResult<&BTreeMap<NaiveDate, MoonEntry>> {
        self.ensure_initialized()?;
        Ok(&self.log.entries)
    }

    pub fn version(&self) -> u32 {
        self.log.version
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn has_entry_for_today(&self) -> AppResult<bool> {
        Ok(self.get_entry(self.clock.today())?.is_some())
    }

    /// Merges `patch` into today's record, creating it if needed.
    pub fn add_entry_for_today(&mut self, patch: EntryPatch) -> AppResult<NaiveDate> {
        let today = self.clock.today();
        self.merge_into(today, patch)?;
        info!("Added entry for today ({})", today);
        Ok(today)
    }

    /// Merges `patch` into the entry for `date`.
    ///
    /// A missing entry is created from [`MoonEntry::empty`] first, so this never
    /// fails for lack of a record.
    pub fn update_entry(&mut self, date: NaiveDate, patch: EntryPatch) -> AppResult<MoonEntry> {
        let (updated, created) = self.merge_into(date, patch)?;
        if created {
            info!("Created entry for {}", date);
        } else {
            info!("Updated entry for {}", date);
        }
        Ok(updated)
    }

    /// Upserts `patch` onto the record for `date` and persists the log.
    /// Returns the merged record and whether it was newly created.
    fn merge_into(&mut self, date: NaiveDate, patch: EntryPatch) -> AppResult<(MoonEntry, bool)> {
        self.ensure_initialized()?;
        patch.validate()?;

        let previous = self.log.entries.get(&date).map(|e| e.status.clone());
        let created = previous.is_none();
        let entry = self
            .log
            .entries
            .entry(date)
            .or_insert_with(|| MoonEntry::empty(date));
        entry.apply(patch);
        let updated = entry.clone();
        self.release_replaced_image(previous, &updated.status);

        self.save()?;
        Ok((updated, created))
    }

    /// Removes the entry for `date` and best-effort deletes its image.
    ///
    /// A failed image deletion is logged and does not stop the record removal.
    pub fn delete_entry(&mut self, date: NaiveDate) -> AppResult<Option<MoonEntry>> {
        self.ensure_initialized()?;

        let removed = self.log.entries.remove(&date);
        if let Some(image) = removed.as_ref().and_then(|entry| entry.status.image()) {
            if let Err(e) = self.images.delete(image) {
                warn!("Failed to delete image file {:?}: {}", image, e);
            }
        }

        self.save()?;
        info!("Deleted entry for {}", date);
        Ok(removed)
    }

    /// Upserts a not-seen record with a zero phase.
    pub fn mark_as_not_seen(&mut self, date: NaiveDate) -> AppResult<()> {
        self.ensure_initialized()?;

        let previous = self.log.entries.insert(
            date,
            MoonEntry {
                date,
                status: DayStatus::NotSeen,
                moon: 0.0,
                missed: None,
            },
        );
        self.release_replaced_image(previous.map(|p| p.status), &DayStatus::NotSeen);

        self.save()?;
        info!("Marked {} as not seen", date);
        Ok(())
    }

    /// Best-effort deletes an image the record stopped referencing.
    fn release_replaced_image(&self, previous: Option<DayStatus>, current: &DayStatus) {
        let Some(DayStatus::Captured(old)) = previous else {
            return;
        };
        if current.image() == Some(&old) {
            return;
        }
        if let Err(e) = self.images.delete(&old) {
            warn!("Failed to delete replaced image file {:?}: {}", old, e);
        }
    }

    /// Best-effort deletes an image saved with [`EntryStore::save_image`] that no
    /// record ended up referencing.
    pub fn discard_image(&self, image: &Path) {
        if let Err(e) = self.images.delete(image) {
            warn!("Failed to delete orphaned image file {:?}: {}", image, e);
        }
    }

    /// Copies a transient image into the image directory and returns its durable path.
    ///
    /// Files are named `moon_<unix-millis>.<ext>`; a numeric suffix keeps names
    /// unique when two copies land in the same millisecond.
    pub fn save_image(&mut self, source: &Path) -> AppResult<PathBuf> {
        self.ensure_initialized()?;

        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(constants::DEFAULT_IMAGE_EXTENSION)
            .to_ascii_lowercase();
        let stamp = self.clock.now().timestamp_millis();

        let mut file_name = format!("{}{}.{}", constants::IMAGE_FILE_PREFIX, stamp, extension);
        let mut suffix = 1;
        while self.images.contains(&file_name) {
            file_name = format!(
                "{}{}_{}.{}",
                constants::IMAGE_FILE_PREFIX,
                stamp,
                suffix,
                extension
            );
            suffix += 1;
        }

        let destination = self.images.copy_in(source, &file_name)?;
        info!("Saved image as {}", file_name);
        Ok(destination)
    }

    /// Deletes the persisted log, resets to an empty log, and best-effort deletes
    /// every file in the image directory.
    pub fn clear(&mut self) -> AppResult<()> {
        self.ensure_initialized()?;

        self.persistence.remove(constants::STORAGE_KEY)?;
        self.log = MoonLog::default();

        match self.images.list() {
            Ok(files) => {
                for file in files {
                    if let Err(e) = self.images.delete(&file) {
                        warn!("Failed to delete image file {:?}: {}", file, e);
                    }
                }
            }
            Err(e) => warn!("Failed to list image directory: {}", e),
        }

        self.save()?;
        info!("Cleared moon log");
        Ok(())
    }
}
