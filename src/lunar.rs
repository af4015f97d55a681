//! Approximate moon phase for a calendar date.

use crate::constants::SYNODIC_MONTH_DAYS;
use chrono::{NaiveDate, NaiveDateTime};

/// Reference new moon: 2000-01-06 18:14 UTC.
fn reference_new_moon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 6)
        .and_then(|d| d.and_hms_opt(18, 14, 0))
        .unwrap_or_default()
}

/// Phase fraction in [0, 1) at noon on `date`: 0 is new moon, 0.5 is full moon.
///
/// Uses the mean synodic month, so the result can be off by up to about a day
/// from the true phase.
///
/// # Examples
///
/// ```
/// use lunar_log::lunar::phase_fraction;
/// use chrono::NaiveDate;
///
/// // Full moon on 2024-03-25
/// let phase = phase_fraction(NaiveDate::from_ymd_opt(2024, 3, 25).unwrap());
/// assert!((phase - 0.5).abs() < 0.05);
/// ```
pub fn phase_fraction(date: NaiveDate) -> f64 {
    let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
    let elapsed = noon.signed_duration_since(reference_new_moon());
    let days = elapsed.num_seconds() as f64 / 86_400.0;
    let phase = (days / SYNODIC_MONTH_DAYS).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if phase >= 1.0 {
        0.0
    } else {
        phase
    }
}

/// Human name of the phase bucket, for display.
pub fn phase_name(phase: f64) -> &'static str {
    let eighth = (phase.rem_euclid(1.0) * 8.0 + 0.5).floor() as u32 % 8;
    match eighth {
        0 => "new moon",
        1 => "waxing crescent",
        2 => "first quarter",
        3 => "waxing gibbous",
        4 => "full moon",
        5 => "waning gibbous",
        6 => "last quarter",
        _ => "waning crescent",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_known_new_moons_are_near_zero() {
        for day in [date(2024, 1, 11), date(2024, 4, 8), date(1999, 12, 7)] {
            let phase = phase_fraction(day);
            let distance = phase.min(1.0 - phase);
            assert!(distance < 0.05, "{} gave phase {}", day, phase);
        }
    }

    #[test]
    fn test_known_full_moon_is_near_half() {
        let phase = phase_fraction(date(2023, 8, 31));
        assert!((phase - 0.5).abs() < 0.05, "got {}", phase);
    }

    #[test]
    fn test_phase_is_in_unit_range() {
        let mut day = date(1990, 1, 1);
        while day < date(1992, 1, 1) {
            let phase = phase_fraction(day);
            assert!((0.0..1.0).contains(&phase));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(phase_name(0.0), "new moon");
        assert_eq!(phase_name(0.98), "new moon");
        assert_eq!(phase_name(0.25), "first quarter");
        assert_eq!(phase_name(0.5), "full moon");
        assert_eq!(phase_name(0.75), "last quarter");
    }
}
