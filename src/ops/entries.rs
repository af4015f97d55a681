//! Record-level operations: not-seen marks, removal, inspection, listing.

use crate::calendar::{actions_for, CalendarView, DateAction};
use crate::constants::DATE_FORMAT_LONG;
use crate::errors::AppResult;
use crate::lunar;
use crate::ops::ensure_not_future;
use crate::store::{DayStatus, EntryStore, MoonEntry};
use chrono::NaiveDate;
use std::fmt;
use tracing::info;

pub fn mark_not_seen(store: &mut EntryStore, date: NaiveDate) -> AppResult<()> {
    ensure_not_future(date, store.today())?;
    store.mark_as_not_seen(date)
}

/// Removes the record for `date`, returning it if there was one.
pub fn remove_entry(store: &mut EntryStore, date: NaiveDate) -> AppResult<Option<MoonEntry>> {
    let removed = store.delete_entry(date)?;
    if removed.is_none() {
        info!("No entry for {} to remove", date);
    }
    Ok(removed)
}

/// What is known about one date and what can be done with it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryReport {
    pub date: NaiveDate,
    pub entry: Option<MoonEntry>,
    pub phase: f64,
    pub actions: Vec<DateAction>,
}

pub fn show_entry(store: &EntryStore, date: NaiveDate) -> AppResult<EntryReport> {
    let entry = store.get_entry(date)?.cloned();
    let actions = actions_for(date, store.today(), entry.as_ref());
    Ok(EntryReport {
        date,
        entry,
        phase: lunar::phase_fraction(date),
        actions,
    })
}

impl fmt::Display for EntryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.date.format(DATE_FORMAT_LONG))?;
        writeln!(
            f,
            "Moon: {} ({:.2})",
            lunar::phase_name(self.phase),
            self.phase
        )?;

        match &self.entry {
            None => writeln!(f, "No entry")?,
            Some(entry) => {
                writeln!(f, "Entry: {}", describe_status(&entry.status))?;
                if let Some(reason) = &entry.missed {
                    writeln!(f, "Missed: {}", reason)?;
                }
            }
        }

        if self.actions.is_empty() {
            write!(f, "Actions: none")
        } else {
            let labels: Vec<String> = self.actions.iter().map(|a| a.to_string()).collect();
            write!(f, "Actions: {}", labels.join(", "))
        }
    }
}

fn describe_status(status: &DayStatus) -> String {
    match status {
        DayStatus::Empty => "empty".to_string(),
        DayStatus::NotSeen => "not seen".to_string(),
        DayStatus::Captured(path) => format!("photo {}", path.display()),
    }
}

/// One line per entry, oldest first.
pub fn list_entries(store: &EntryStore) -> AppResult<Vec<String>> {
    Ok(store
        .entries()?
        .values()
        .map(|entry| {
            format!(
                "{}  {:<9} moon {:.2}  {}",
                entry.date,
                match entry.status {
                    DayStatus::Empty => "empty",
                    DayStatus::NotSeen => "not-seen",
                    DayStatus::Captured(_) => "captured",
                },
                entry.moon,
                entry
                    .status
                    .image()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default()
            )
            .trim_end()
            .to_string()
        })
        .collect())
}

pub fn render_calendar(store: &EntryStore, selected: Option<NaiveDate>) -> AppResult<CalendarView> {
    Ok(CalendarView::build(store.today(), selected, store.entries()?))
}

/// Removes every entry and stored image.
pub fn clear_log(store: &mut EntryStore) -> AppResult<()> {
    store.clear()
}
