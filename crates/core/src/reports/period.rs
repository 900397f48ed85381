//! Period key resolution for reports.
//!
//! A period key is a textual label identifying an inclusive date range:
//! `"month"`, `"quarter"`, `"year"`, or a specific `"YYYY-MM"` month.
//! Anything else falls back to the current month with a warning.

use chrono::{Datelike, NaiveDate};
use tracing::warn;

/// An inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    /// First day of the period.
    pub start: NaiveDate,
    /// Last day of the period.
    pub end: NaiveDate,
}

/// Resolves a period key to an inclusive date range relative to `today`.
#[must_use]
pub fn resolve_period(period: &str, today: NaiveDate) -> PeriodRange {
    match period {
        "month" => month_range(today.year(), today.month()),
        "quarter" => {
            let quarter_start_month = (today.month() - 1) / 3 * 3 + 1;
            let start = first_of_month(today.year(), quarter_start_month);
            let end = add_months(start, 3).pred_opt().unwrap_or(start);
            PeriodRange { start, end }
        }
        "year" => PeriodRange {
            start: first_of_month(today.year(), 1),
            end: NaiveDate::from_ymd_opt(today.year(), 12, 31)
                .unwrap_or(today),
        },
        other => match parse_year_month(other) {
            Some((year, month)) => month_range(year, month),
            None => {
                warn!(period = other, "unknown period, defaulting to current month");
                month_range(today.year(), today.month())
            }
        },
    }
}

/// Parses a `"YYYY-MM"` label into a (year, month) pair.
fn parse_year_month(label: &str) -> Option<(i32, u32)> {
    let (year, month) = label.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

fn month_range(year: i32, month: u32) -> PeriodRange {
    let start = first_of_month(year, month);
    let end = add_months(start, 1).pred_opt().unwrap_or(start);
    PeriodRange { start, end }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
}

/// Adds whole months to a first-of-month date, rolling the year over.
fn add_months(first_of_month: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = first_of_month.month() - 1 + months;
    let year = first_of_month.year() + (zero_based / 12) as i32;
    let month = zero_based % 12 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(first_of_month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_resolves_to_calendar_month() {
        let range = resolve_period("month", day(2026, 2, 14));
        assert_eq!(range.start, day(2026, 2, 1));
        assert_eq!(range.end, day(2026, 2, 28));
    }

    #[test]
    fn month_handles_leap_february() {
        let range = resolve_period("month", day(2028, 2, 10));
        assert_eq!(range.end, day(2028, 2, 29));
    }

    #[test]
    fn quarter_boundaries() {
        // Q1
        let q1 = resolve_period("quarter", day(2026, 2, 14));
        assert_eq!(q1.start, day(2026, 1, 1));
        assert_eq!(q1.end, day(2026, 3, 31));

        // Q2
        let q2 = resolve_period("quarter", day(2026, 4, 1));
        assert_eq!(q2.start, day(2026, 4, 1));
        assert_eq!(q2.end, day(2026, 6, 30));

        // Q4 rolls into the year end.
        let q4 = resolve_period("quarter", day(2026, 12, 31));
        assert_eq!(q4.start, day(2026, 10, 1));
        assert_eq!(q4.end, day(2026, 12, 31));
    }

    #[test]
    fn year_spans_jan_to_dec() {
        let range = resolve_period("year", day(2026, 7, 4));
        assert_eq!(range.start, day(2026, 1, 1));
        assert_eq!(range.end, day(2026, 12, 31));
    }

    #[test]
    fn specific_month_label() {
        let range = resolve_period("2026-02", day(2026, 7, 4));
        assert_eq!(range.start, day(2026, 2, 1));
        assert_eq!(range.end, day(2026, 2, 28));

        // December rolls the year for the end calculation.
        let dec = resolve_period("2025-12", day(2026, 7, 4));
        assert_eq!(dec.start, day(2025, 12, 1));
        assert_eq!(dec.end, day(2025, 12, 31));
    }

    #[test]
    fn garbage_defaults_to_current_month() {
        for junk in ["fortnight", "2026-13", "2026-2", "20-02", ""] {
            let range = resolve_period(junk, day(2026, 5, 20));
            assert_eq!(range.start, day(2026, 5, 1));
            assert_eq!(range.end, day(2026, 5, 31));
        }
    }

    proptest! {
        #[test]
        fn named_periods_always_contain_today(
            year in 2000i32..2100,
            ordinal in 1u32..366,
        ) {
            let Some(today) = NaiveDate::from_yo_opt(year, ordinal) else {
                return Ok(());
            };
            for key in ["month", "quarter", "year"] {
                let range = resolve_period(key, today);
                prop_assert!(range.start <= today && today <= range.end);
            }
        }

        #[test]
        fn quarter_start_month_is_1_4_7_or_10(
            year in 2000i32..2100,
            ordinal in 1u32..366,
        ) {
            let Some(today) = NaiveDate::from_yo_opt(year, ordinal) else {
                return Ok(());
            };
            let range = resolve_period("quarter", today);
            prop_assert!(matches!(range.start.month(), 1 | 4 | 7 | 10));
            prop_assert_eq!(range.start.day(), 1);
        }
    }
}
