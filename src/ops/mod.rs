//! High-level operations behind each command.
//!
//! Every operation works on a [`LockedStore`]: an initialized [`EntryStore`] over
//! the configured data directory, held together with the directory lock.

pub mod capture;
pub mod entries;

pub use capture::{capture_entry, CaptureOutcome, SourceSelection};
pub use entries::{
    clear_log, list_entries, mark_not_seen, remove_entry, render_calendar, show_entry,
    EntryReport,
};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::store::persistence::ensure_private_dir;
use crate::store::{DataDirLock, EntryStore, FileKeyValue, LocalImageDir, SystemClock};
use chrono::NaiveDate;
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// An initialized store plus the lock that keeps other processes out of its
/// directory. The store is dropped before the lock is released.
pub struct LockedStore {
    store: EntryStore,
    lock: DataDirLock,
}

impl LockedStore {
    pub fn lock(&self) -> &DataDirLock {
        &self.lock
    }
}

impl Deref for LockedStore {
    type Target = EntryStore;

    fn deref(&self) -> &EntryStore {
        &self.store
    }
}

impl DerefMut for LockedStore {
    fn deref_mut(&mut self) -> &mut EntryStore {
        &mut self.store
    }
}

/// Creates the data directory if needed, takes its lock and loads the log.
///
/// # Errors
///
/// `LockError::FileBusy` when another process has the directory open, and any
/// error from [`EntryStore::init`].
pub fn open_store(config: &Config) -> AppResult<LockedStore> {
    ensure_private_dir(&config.data_dir)?;
    let lock = DataDirLock::acquire(&config.lock_path())?;

    let mut store = EntryStore::new(
        Box::new(FileKeyValue::new(&config.data_dir)),
        Box::new(LocalImageDir::new(config.images_dir())),
        Box::new(SystemClock),
    );
    store.init()?;
    debug!("Opened store in {:?}", config.data_dir);

    Ok(LockedStore { store, lock })
}

/// Rejects dates after `today`; nothing can be recorded for them yet.
pub fn ensure_not_future(date: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if date > today {
        return Err(AppError::Journal(format!(
            "Cannot record {} yet: it is after today ({})",
            date, today
        )));
    }
    Ok(())
}
