//! Moon entry records and their persisted shape.
//!
//! The domain type [`MoonEntry`] carries a tagged [`DayStatus`], so a day is either
//! empty, captured with an image, or marked as not seen. The persisted JSON keeps the
//! flat `image` / `notSeen` fields of the original log format; conversion happens in
//! [`MoonLog::to_stored`] and [`MoonLog::from_stored`].

use crate::constants;
use crate::errors::StoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What was recorded for a day.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DayStatus {
    /// A record exists but carries neither photo nor not-seen mark.
    #[default]
    Empty,
    /// A photo was captured; the path points into the image directory.
    Captured(PathBuf),
    /// The user marked the moon as not seen that day.
    NotSeen,
}

impl DayStatus {
    /// Image path for a captured day.
    pub fn image(&self) -> Option<&PathBuf> {
        match self {
            DayStatus::Captured(path) => Some(path),
            _ => None,
        }
    }
}

/// One calendar day's recorded moon observation.
#[derive(Debug, Clone, PartialEq)]
pub struct MoonEntry {
    pub date: NaiveDate,
    pub status: DayStatus,
    /// Moon phase fraction, 0 = new, 0.5 = full.
    pub moon: f64,
    /// Free-text reason for a missed photo.
    pub missed: Option<String>,
}

impl MoonEntry {
    /// A fresh record used when a date has no entry yet.
    pub fn empty(date: NaiveDate) -> Self {
        MoonEntry {
            date,
            status: DayStatus::Empty,
            moon: 0.0,
            missed: None,
        }
    }

    /// Merges the fields present in `patch` into this entry; patch fields win.
    pub fn apply(&mut self, patch: EntryPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(moon) = patch.moon {
            self.moon = moon;
        }
        if let Some(missed) = patch.missed {
            self.missed = Some(missed);
        }
    }
}

/// Partial update of a [`MoonEntry`].
///
/// # Examples
///
/// ```
/// use lunar_log::store::{DayStatus, EntryPatch};
///
/// let patch = EntryPatch::captured("/data/moon_images/moon_1.jpg", 0.5);
/// assert_eq!(patch.moon, Some(0.5));
/// assert!(matches!(patch.status, Some(DayStatus::Captured(_))));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryPatch {
    pub status: Option<DayStatus>,
    pub moon: Option<f64>,
    pub missed: Option<String>,
}

impl EntryPatch {
    /// Patch recording a captured image with its moon phase.
    pub fn captured(image: impl Into<PathBuf>, moon: f64) -> Self {
        EntryPatch {
            status: Some(DayStatus::Captured(image.into())),
            moon: Some(moon),
            missed: None,
        }
    }

    /// Patch that only sets the moon phase.
    pub fn phase(moon: f64) -> Self {
        EntryPatch {
            moon: Some(moon),
            ..EntryPatch::default()
        }
    }

    /// Patch that only records a missed reason.
    pub fn missed(reason: impl Into<String>) -> Self {
        EntryPatch {
            missed: Some(reason.into()),
            ..EntryPatch::default()
        }
    }

    /// Rejects phases outside [0, 1] and non-finite values.
    pub fn validate(&self) -> Result<(), StoreError> {
        match self.moon {
            Some(moon) if !moon.is_finite() || !(0.0..=1.0).contains(&moon) => {
                Err(StoreError::InvalidPhase(moon))
            }
            _ => Ok(()),
        }
    }
}

/// The whole journal: every entry keyed by date plus a schema version.
#[derive(Debug, Clone, PartialEq)]
pub struct MoonLog {
    pub entries: BTreeMap<NaiveDate, MoonEntry>,
    pub version: u32,
}

impl Default for MoonLog {
    fn default() -> Self {
        MoonLog {
            entries: BTreeMap::new(),
            version: constants::LOG_VERSION,
        }
    }
}

/// Entry as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredEntry {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub moon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_seen: Option<bool>,
}

/// Log as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredLog {
    #[serde(default)]
    pub entries: BTreeMap<String, StoredEntry>,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    constants::LOG_VERSION
}

impl MoonLog {
    pub(crate) fn to_stored(&self) -> StoredLog {
        let entries = self
            .entries
            .iter()
            .map(|(date, entry)| {
                let key = date.format(constants::DATE_FORMAT_ISO).to_string();
                let (image, not_seen) = match &entry.status {
                    DayStatus::Empty => (None, None),
                    DayStatus::Captured(path) => {
                        (Some(path.to_string_lossy().into_owned()), Some(false))
                    }
                    DayStatus::NotSeen => (None, Some(true)),
                };
                let stored = StoredEntry {
                    date: key.clone(),
                    image,
                    moon: entry.moon,
                    missed: entry.missed.clone(),
                    not_seen,
                };
                (key, stored)
            })
            .collect();

        StoredLog {
            entries,
            version: self.version,
        }
    }

    /// Converts the persisted shape into the domain log.
    ///
    /// The map key is authoritative for the date. A legacy record carrying both an
    /// image and `notSeen: true` is read as not seen.
    pub(crate) fn from_stored(stored: StoredLog) -> Result<Self, StoreError> {
        let mut entries = BTreeMap::new();
        for (key, record) in stored.entries {
            let date = NaiveDate::parse_from_str(&key, constants::DATE_FORMAT_ISO)
                .map_err(|_| StoreError::InvalidDateKey(key.clone()))?;
            let status = match (record.not_seen, record.image) {
                (Some(true), _) => DayStatus::NotSeen,
                (_, Some(image)) if !image.is_empty() => {
                    DayStatus::Captured(PathBuf::from(image))
                }
                _ => DayStatus::Empty,
            };
            entries.insert(
                date,
                MoonEntry {
                    date,
                    status,
                    moon: record.moon,
                    missed: record.missed,
                },
            );
        }

        Ok(MoonLog {
            entries,
            version: stored.version,
        })
    }
}
