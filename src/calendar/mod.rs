//! Calendar view model: weeks of day cells, split at month boundaries.
//!
//! The view is a pure function of `today`, an optional selected date and the
//! current entries. Weeks start on Sunday. The range runs from the week before the
//! earliest entry (or two weeks back when there are none) through today's week.

use crate::constants::{CALENDAR_LOOKBACK_WEEKS, DAYS_IN_WEEK};
use crate::store::{DayStatus, MoonEntry};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// What a day cell shows. The first matching rule wins: future, not seen,
/// photographed, then the plain day number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayState {
    Disabled,
    NotSeen,
    Thumbnail(PathBuf),
    DayNumber(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub state: DayState,
    pub is_today: bool,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Placeholder for a weekday slot that belongs to another row.
    Ghost,
    Day(DayCell),
}

impl Cell {
    pub fn day(&self) -> Option<&DayCell> {
        match self {
            Cell::Day(day) => Some(day),
            Cell::Ghost => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarRow {
    /// Seven slots indexed by weekday, Sunday first.
    Week([Cell; DAYS_IN_WEEK]),
    MonthSeparator { year: i32, month: u32 },
}

/// Start of the Sunday-based week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

fn range_start(today: NaiveDate, entries: &BTreeMap<NaiveDate, MoonEntry>) -> NaiveDate {
    // Entries after today never move the range
    match entries.keys().find(|date| **date <= today) {
        Some(earliest) => week_start(*earliest - Duration::days(DAYS_IN_WEEK as i64)),
        None => week_start(today - Duration::weeks(CALENDAR_LOOKBACK_WEEKS)),
    }
}

fn day_state(date: NaiveDate, today: NaiveDate, entry: Option<&MoonEntry>) -> DayState {
    if date > today {
        return DayState::Disabled;
    }
    match entry.map(|entry| &entry.status) {
        Some(DayStatus::NotSeen) => DayState::NotSeen,
        Some(DayStatus::Captured(path)) => DayState::Thumbnail(path.clone()),
        _ => DayState::DayNumber(date.day()),
    }
}

#[derive(Debug, Clone)]
pub struct CalendarView {
    today: NaiveDate,
    selected: Option<NaiveDate>,
    week_starts: Vec<NaiveDate>,
    rows: Vec<CalendarRow>,
}

impl CalendarView {
    pub fn build(
        today: NaiveDate,
        selected: Option<NaiveDate>,
        entries: &BTreeMap<NaiveDate, MoonEntry>,
    ) -> Self {
        let last_week = week_start(today);
        let mut week_starts = Vec::new();
        let mut cursor = range_start(today, entries);
        while cursor <= last_week {
            week_starts.push(cursor);
            cursor += Duration::weeks(1);
        }

        let mut rows = Vec::new();
        let mut last_month: Option<(i32, u32)> = None;
        let mut push_row = |rows: &mut Vec<CalendarRow>, month: (i32, u32), cells: [Cell; DAYS_IN_WEEK]| {
            if last_month.is_some_and(|previous| previous != month) {
                rows.push(CalendarRow::MonthSeparator {
                    year: month.0,
                    month: month.1,
                });
            }
            last_month = Some(month);
            rows.push(CalendarRow::Week(cells));
        };

        for start in &week_starts {
            let mut cells: [Cell; DAYS_IN_WEEK] = std::array::from_fn(|_| Cell::Ghost);
            let mut row_month = (start.year(), start.month());

            for offset in 0..DAYS_IN_WEEK {
                let date = *start + Duration::days(offset as i64);
                let month = (date.year(), date.month());
                if month != row_month {
                    let finished = std::mem::replace(&mut cells, std::array::from_fn(|_| Cell::Ghost));
                    push_row(&mut rows, row_month, finished);
                    row_month = month;
                }

                cells[offset] = Cell::Day(DayCell {
                    date,
                    state: day_state(date, today, entries.get(&date)),
                    is_today: date == today,
                    is_selected: selected == Some(date),
                });
            }
            push_row(&mut rows, row_month, cells);
        }

        CalendarView {
            today,
            selected,
            week_starts,
            rows,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn rows(&self) -> &[CalendarRow] {
        &self.rows
    }

    /// Sunday of every week in the range, oldest first.
    pub fn week_starts(&self) -> &[NaiveDate] {
        &self.week_starts
    }

    /// Every day cell in date order.
    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.rows.iter().flat_map(|row| match row {
            CalendarRow::Week(cells) => cells.iter().filter_map(Cell::day).collect::<Vec<_>>(),
            CalendarRow::MonthSeparator { .. } => Vec::new(),
        })
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        self.days().find(|day| day.date == date)
    }
}

const DAY_LABELS: [&str; DAYS_IN_WEEK] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn month_name(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{}-{:02}", year, month))
}

/// Text grid: `o` photographed, `x` not seen, `.` future. `*` marks today and `<`
/// the selected date.
impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in DAY_LABELS {
            write!(f, "{:>4}", label)?;
        }
        writeln!(f)?;

        for row in &self.rows {
            match row {
                CalendarRow::MonthSeparator { year, month } => {
                    writeln!(f, "---- {} ----", month_name(*year, *month))?;
                }
                CalendarRow::Week(cells) => {
                    for cell in cells {
                        match cell {
                            Cell::Ghost => write!(f, "    ")?,
                            Cell::Day(day) => {
                                let symbol = match &day.state {
                                    DayState::Disabled => ".".to_string(),
                                    DayState::NotSeen => "x".to_string(),
                                    DayState::Thumbnail(_) => "o".to_string(),
                                    DayState::DayNumber(number) => number.to_string(),
                                };
                                let marker = if day.is_today {
                                    '*'
                                } else if day.is_selected {
                                    '<'
                                } else {
                                    ' '
                                };
                                write!(f, "{:>3}{}", symbol, marker)?;
                            }
                        }
                    }
                    writeln!(f)?;
                }
            }
        }
        Ok(())
    }
}

/// Actions available for a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateAction {
    Remove,
    MarkNotSeen,
    PickFromGallery,
    TakePicture,
}

impl fmt::Display for DateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DateAction::Remove => "remove",
            DateAction::MarkNotSeen => "not-seen",
            DateAction::PickFromGallery => "capture --gallery",
            DateAction::TakePicture => "capture --camera",
        };
        write!(f, "{}", label)
    }
}

pub fn actions_for(date: NaiveDate, today: NaiveDate, entry: Option<&MoonEntry>) -> Vec<DateAction> {
    if entry.is_some() {
        vec![DateAction::Remove]
    } else if date > today {
        Vec::new()
    } else {
        vec![
            DateAction::MarkNotSeen,
            DateAction::PickFromGallery,
            DateAction::TakePicture,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week_rows(view: &CalendarView) -> Vec<&[Cell; DAYS_IN_WEEK]> {
        view.rows()
            .iter()
            .filter_map(|row| match row {
                CalendarRow::Week(cells) => Some(cells),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_week_start_is_sunday() {
        assert_eq!(week_start(date(2024, 3, 5)), date(2024, 3, 3));
        assert_eq!(week_start(date(2024, 3, 3)), date(2024, 3, 3));
        assert_eq!(week_start(date(2024, 3, 9)), date(2024, 3, 3));
    }

    #[test]
    fn test_empty_log_looks_back_two_weeks() {
        let view = CalendarView::build(date(2024, 3, 5), None, &BTreeMap::new());

        assert_eq!(
            view.week_starts(),
            &[date(2024, 2, 18), date(2024, 2, 25), date(2024, 3, 3)]
        );
    }

    #[test]
    fn test_old_entry_extends_range() {
        let mut entries = BTreeMap::new();
        entries.insert(date(2024, 1, 10), MoonEntry::empty(date(2024, 1, 10)));

        let view = CalendarView::build(date(2024, 3, 5), None, &entries);

        // Jan 3 is a Wednesday, its week starts Dec 31
        assert_eq!(view.week_starts()[0], date(2023, 12, 31));
        assert_eq!(*view.week_starts().last().unwrap(), date(2024, 3, 3));
    }

    #[test]
    fn test_future_entry_does_not_move_range() {
        let mut entries = BTreeMap::new();
        entries.insert(date(2024, 4, 10), MoonEntry::empty(date(2024, 4, 10)));

        let view = CalendarView::build(date(2024, 3, 5), None, &entries);

        assert_eq!(view.week_starts().len(), 3);
    }

    #[test]
    fn test_month_boundary_splits_week() {
        let view = CalendarView::build(date(2024, 3, 5), None, &BTreeMap::new());

        // Feb 18, Feb 25-29, separator, Mar 1-2, Mar 3-9
        assert_eq!(view.rows().len(), 5);
        assert_eq!(
            view.rows()[2],
            CalendarRow::MonthSeparator {
                year: 2024,
                month: 3
            }
        );

        let weeks = week_rows(&view);
        assert!(weeks[1][4].day().is_some());
        assert_eq!(weeks[1][5], Cell::Ghost);
        assert_eq!(weeks[2][4], Cell::Ghost);
        assert_eq!(weeks[2][5].day().unwrap().date, date(2024, 3, 1));
    }

    #[test]
    fn test_week_starting_on_first_gets_separator_without_split() {
        // Sep 1 2024 is a Sunday
        let view = CalendarView::build(date(2024, 9, 3), None, &BTreeMap::new());

        let separators = view
            .rows()
            .iter()
            .filter(|row| matches!(row, CalendarRow::MonthSeparator { .. }))
            .count();
        assert_eq!(separators, 1);
        assert_eq!(week_rows(&view).len(), 3);
    }

    #[test]
    fn test_day_states() {
        let today = date(2024, 3, 5);
        let mut entries = BTreeMap::new();
        let mut captured = MoonEntry::empty(date(2024, 3, 1));
        captured.status = DayStatus::Captured(PathBuf::from("a.jpg"));
        entries.insert(captured.date, captured);
        let mut missed = MoonEntry::empty(date(2024, 3, 2));
        missed.status = DayStatus::NotSeen;
        entries.insert(missed.date, missed);

        let view = CalendarView::build(today, Some(date(2024, 3, 4)), &entries);

        assert_eq!(
            view.cell(date(2024, 3, 1)).unwrap().state,
            DayState::Thumbnail(PathBuf::from("a.jpg"))
        );
        assert_eq!(view.cell(date(2024, 3, 2)).unwrap().state, DayState::NotSeen);
        assert_eq!(view.cell(date(2024, 3, 3)).unwrap().state, DayState::DayNumber(3));
        assert!(view.cell(date(2024, 3, 4)).unwrap().is_selected);
        assert!(view.cell(date(2024, 3, 5)).unwrap().is_today);
        assert_eq!(view.cell(date(2024, 3, 6)).unwrap().state, DayState::Disabled);
        assert!(view.cell(date(2024, 3, 10)).is_none());
    }

    #[test]
    fn test_every_day_appears_once() {
        let view = CalendarView::build(date(2024, 3, 5), None, &BTreeMap::new());

        let dates: Vec<NaiveDate> = view.days().map(|day| day.date).collect();
        assert_eq!(dates.len(), 21);
        assert!(dates.windows(2).all(|pair| pair[1] == pair[0] + Duration::days(1)));
    }

    #[test]
    fn test_display_marks_today_and_separator() {
        let view = CalendarView::build(date(2024, 3, 5), None, &BTreeMap::new());

        let text = view.to_string();

        assert!(text.starts_with(" Sun Mon"));
        assert!(text.contains("---- March 2024 ----"));
        assert!(text.contains("  5*"));
    }

    #[test]
    fn test_actions_for_date() {
        let today = date(2024, 3, 5);
        let entry = MoonEntry::empty(today);

        assert_eq!(actions_for(today, today, Some(&entry)), vec![DateAction::Remove]);
        assert_eq!(actions_for(today, today, None).len(), 3);
        assert!(actions_for(date(2024, 3, 6), today, None).is_empty());
    }
}
