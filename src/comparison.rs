// ABOUTME: Cost-delta aggregation engine reconciling two billing periods
// ABOUTME: Produces per-dimension deltas and a ranked top-drivers view
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Comparison Engine
//!
//! Reconciles two already-fetched per-dimension cost maps into a ranked
//! sequence of [`ComparisonRow`]s. Ranking is by descending `|delta|`, not
//! raw amount, so consequential decreases surface alongside increases.
//!
//! The driver view ([`top_drivers`]) is the same ranked sequence with the
//! noise floor applied; it performs no independent causal attribution.
//! That is a known limitation carried over deliberately: a "driver" here
//! is a large absolute change, nothing more.

use std::collections::{BTreeMap, BTreeSet};

use crate::constants::limits;
use crate::models::ComparisonRow;

/// Compare two per-dimension cost maps.
///
/// Forms the union of keys, computes delta and percent change for each,
/// and sorts by descending absolute delta. Keys are visited in `BTreeMap`
/// order, so equal-magnitude rows tie-break alphabetically and repeated
/// invocations over identical inputs yield identical sequences.
///
/// Negative amounts (credits) flow through unmodified.
#[must_use]
pub fn compare(
    baseline: &BTreeMap<String, f64>,
    comparison: &BTreeMap<String, f64>,
) -> Vec<ComparisonRow> {
    let keys: BTreeSet<&String> = baseline.keys().chain(comparison.keys()).collect();

    let mut rows: Vec<ComparisonRow> = keys
        .into_iter()
        .map(|key| {
            let base = baseline.get(key).copied().unwrap_or(0.0);
            let comp = comparison.get(key).copied().unwrap_or(0.0);
            let delta = comp - base;
            let percent_change = if base > 0.0 {
                (delta / base) * 100.0
            } else if comp > 0.0 {
                100.0
            } else if base == 0.0 {
                0.0
            } else {
                // Negative baseline (credit period): scale against its
                // magnitude so the sign of the change stays meaningful.
                (delta / base) * 100.0
            };
            ComparisonRow {
                key: key.clone(),
                baseline: base,
                comparison: comp,
                delta,
                percent_change,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.delta.abs().total_cmp(&a.delta.abs()));
    rows
}

/// The ranked rows surfaced as "drivers": noise-filtered and capped.
///
/// Rows with `|delta|` at or below [`limits::COMPARISON_NOISE_THRESHOLD`]
/// are suppressed; at most [`limits::COMPARISON_ROWS`] survive. The full
/// sorted sequence from [`compare`] is left untouched for callers that
/// need it.
#[must_use]
pub fn top_drivers(rows: &[ComparisonRow]) -> Vec<&ComparisonRow> {
    rows.iter()
        .take(limits::COMPARISON_ROWS)
        .filter(|row| row.delta.abs() > limits::COMPARISON_NOISE_THRESHOLD)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
    }

    #[test]
    fn test_compare_empty_maps() {
        assert!(compare(&BTreeMap::new(), &BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_compare_baseline_only_key() {
        let rows = compare(&map(&[("A", 10.0)]), &BTreeMap::new());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.key, "A");
        assert!((row.baseline - 10.0).abs() < f64::EPSILON);
        assert!(row.comparison.abs() < f64::EPSILON);
        assert!((row.delta + 10.0).abs() < f64::EPSILON);
        assert!((row.percent_change + 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compare_comparison_only_key() {
        let rows = compare(&BTreeMap::new(), &map(&[("A", 10.0)]));
        let row = &rows[0];
        assert!((row.delta - 10.0).abs() < f64::EPSILON);
        assert!((row.percent_change - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compare_both_zero_is_zero_percent() {
        let rows = compare(&map(&[("A", 0.0)]), &map(&[("A", 0.0)]));
        assert!(rows[0].percent_change.abs() < f64::EPSILON);
        assert!(rows[0].delta.abs() < f64::EPSILON);
    }

    #[test]
    fn test_sorting_by_absolute_delta() {
        let rows = compare(
            &map(&[("EC2", 120.50), ("S3", 4.00), ("RDS", 30.0)]),
            &map(&[("EC2", 80.00), ("S3", 4.00), ("RDS", 90.0)]),
        );
        // RDS +60 outranks EC2 -40.50 outranks S3 0.
        assert_eq!(rows[0].key, "RDS");
        assert_eq!(rows[1].key, "EC2");
        assert_eq!(rows[2].key, "S3");
    }

    #[test]
    fn test_top_drivers_filters_noise() {
        let rows = compare(
            &map(&[("EC2", 120.50), ("S3", 4.00)]),
            &map(&[("EC2", 80.00), ("S3", 4.00)]),
        );
        let drivers = top_drivers(&rows);
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].key, "EC2");
        assert!((drivers[0].delta + 40.50).abs() < 1e-9);
        assert!((drivers[0].percent_change + 33.609_958_506_224_07).abs() < 1e-9);
        // The full sequence keeps the filtered row.
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_compare_is_idempotent() {
        let baseline = map(&[("A", 5.0), ("B", 7.5), ("C", 0.0)]);
        let comparison = map(&[("B", 2.5), ("C", 9.0), ("D", 1.0)]);
        assert_eq!(compare(&baseline, &comparison), compare(&baseline, &comparison));
    }

    #[test]
    fn test_negative_credit_amounts_are_tolerated() {
        let rows = compare(&map(&[("Credit", -25.0)]), &map(&[("Credit", -5.0)]));
        let row = &rows[0];
        assert!((row.delta - 20.0).abs() < f64::EPSILON);
        assert!(row.percent_change.is_finite());
    }
}
