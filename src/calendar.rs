// ABOUTME: Canonical date-range resolution for billing retrievals
// ABOUTME: Computes current/prior month boundaries and approximate lookback/lookahead windows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Date Range Resolution
//!
//! Pure functions mapping a reference date to the canonical windows the
//! retrieval operations query. Two of them are deliberate approximations:
//!
//! - [`months_back`] steps back `32 * n` days from the first of the
//!   reference month and truncates to the first of the month it lands in.
//!   32 days always overshoots into the prior month regardless of month
//!   length, so the result is a clean month boundary.
//! - [`months_ahead`] adds `30 * n` linear days to the reference date.
//!
//! Downstream formatted ranges depend on these exact results; do not
//! replace them with exact calendar-month arithmetic.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::DateRange;

/// First day of the month containing `date`
fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// First day of the month after the one containing `date`, rolling the
/// year at December
fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap_or(date)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).unwrap_or(date)
    }
}

/// The calendar month containing the reference date, as `[first, first of next)`
#[must_use]
pub fn current_month(reference: NaiveDate) -> DateRange {
    DateRange::new(first_of_month(reference), first_of_next_month(reference))
}

/// The window covering the `n` whole months before the reference month.
///
/// `end` is the first of the reference month; `start` steps back `32 * n`
/// days from `end` and truncates to the first of the resulting month.
/// `n == 0` degenerates to an empty range; callers never request it.
#[must_use]
pub fn months_back(reference: NaiveDate, n: u32) -> DateRange {
    let end = first_of_month(reference);
    let start = first_of_month(end - Duration::days(32 * i64::from(n)));
    DateRange::new(start, end)
}

/// A forward window of `30 * n` linear days starting at the reference date
#[must_use]
pub fn months_ahead(reference: NaiveDate, n: u32) -> DateRange {
    DateRange::new(reference, reference + Duration::days(30 * i64::from(n)))
}

/// The single calendar month immediately preceding the reference month.
///
/// Exact month arithmetic, not the 32-day window: the comparison
/// baselines built from this range are asserted to be precisely one
/// month wide, while [`months_back`] deliberately over-covers.
#[must_use]
pub fn prior_month(reference: NaiveDate) -> DateRange {
    let end = first_of_month(reference);
    let start = if reference.month() == 1 {
        NaiveDate::from_ymd_opt(reference.year() - 1, 12, 1).unwrap_or(reference)
    } else {
        NaiveDate::from_ymd_opt(reference.year(), reference.month() - 1, 1).unwrap_or(reference)
    };
    DateRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_current_month_contains_reference() {
        for reference in [date(2025, 7, 15), date(2025, 1, 1), date(2024, 2, 29)] {
            let range = current_month(reference);
            assert!(range.start <= reference && reference < range.end);
        }
    }

    #[test]
    fn test_current_month_rolls_year_in_december() {
        let range = current_month(date(2025, 12, 31));
        assert_eq!(range.start, date(2025, 12, 1));
        assert_eq!(range.end, date(2026, 1, 1));
    }

    #[test]
    fn test_months_back_end_is_current_month_start() {
        for n in 0..=6 {
            let reference = date(2025, 7, 15);
            assert_eq!(months_back(reference, n).end, current_month(reference).start);
        }
    }

    #[test]
    fn test_months_back_overshoot_truncation() {
        // 32*3 = 96 days before 2025-07-01 is 2025-03-27; truncated to 03-01.
        let range = months_back(date(2025, 7, 15), 3);
        assert_eq!(range.start, date(2025, 3, 1));
        assert_eq!(range.end, date(2025, 7, 1));
    }

    #[test]
    fn test_months_back_one_overshoots_into_second_prior_month() {
        // 2025-07-01 minus 32 days is 2025-05-30: "1 month back" opens
        // at May, one month earlier than prior_month. Both behaviors are
        // intentional and asserted separately.
        let range = months_back(date(2025, 7, 15), 1);
        assert_eq!(range.start, date(2025, 5, 1));
        assert_eq!(range.end, date(2025, 7, 1));
    }

    #[test]
    fn test_months_back_crosses_year_boundary() {
        // 32 days before 2025-01-01 is 2024-11-30: the overshoot labels
        // a two-month window as "1 month back". Preserved behavior.
        let range = months_back(date(2025, 1, 10), 1);
        assert_eq!(range.start, date(2024, 11, 1));
        assert_eq!(range.end, date(2025, 1, 1));
    }

    #[test]
    fn test_months_ahead_linear_days() {
        let range = months_ahead(date(2025, 7, 15), 3);
        assert_eq!(range.start, date(2025, 7, 15));
        assert_eq!(range.end, date(2025, 7, 15) + Duration::days(90));
    }

    #[test]
    fn test_prior_month_matches_scenario_dates() {
        let range = prior_month(date(2025, 7, 15));
        assert_eq!(range.start_str(), "2025-06-01");
        assert_eq!(range.end_str(), "2025-07-01");
    }

    #[test]
    fn test_prior_month_of_january_is_december() {
        let range = prior_month(date(2025, 1, 3));
        assert_eq!(range.start, date(2024, 12, 1));
        assert_eq!(range.end, date(2025, 1, 1));
    }
}
