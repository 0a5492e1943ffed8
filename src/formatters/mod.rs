// ABOUTME: Pure text rendering of billing retrieval results
// ABOUTME: Produces the fixed-marker Korean answer blocks consumed by users and the summarizer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Response Formatting
//!
//! Pure functions turning retrieval results into UTF-8 text blocks. The
//! same blocks serve as the final answer in retrieval-only mode and as
//! model-input context for the summarizer, so markers and numeric formats
//! are fixed contracts:
//!
//! - costs render as `$<amount>` with two decimals; usage quantities as
//!   `<amount> <unit>` with no currency prefix
//! - ranked listings truncate to 10 (service/driver), 15 (detail), or
//!   20 (dimension values) entries with an explicit trailer naming the
//!   remainder; regional listings are untruncated
//! - section markers (`📅 기간:`, `📊 주요 변화 (절대값 기준):`, ...)
//!   are byte-stable

use chrono::{Datelike, NaiveDateTime};
use std::fmt::Write as _;

use crate::calendar;
use crate::constants::limits;
use crate::errors::AppResult;
use crate::models::{
    metrics, ComparisonRow, CostAndUsageResponse, DateRange, DimensionValuesResponse,
    ForecastResponse, Granularity, ResultByTime,
};

/// Ranked `(name, amount, unit)` rows of one time bucket for a metric:
/// positive amounts only, descending by amount.
///
/// # Errors
///
/// Returns `InvalidFormat` when the billing API emits a non-numeric amount.
pub fn ranked_groups(bucket: &ResultByTime, metric: &str) -> AppResult<Vec<(String, f64, String)>> {
    let mut rows = Vec::with_capacity(bucket.groups.len());
    for group in &bucket.groups {
        if let Some(value) = group.metrics.get(metric) {
            let amount = value.amount_f64()?;
            if amount > 0.0 {
                rows.push((group.primary_key().to_owned(), amount, value.unit.clone()));
            }
        }
    }
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(rows)
}

/// Append ranked cost lines with the given icon, truncating to `limit`
/// entries with an explicit remainder trailer. `None` renders every row.
fn push_ranked_lines(
    out: &mut String,
    rows: &[(String, f64, String)],
    icon: &str,
    limit: Option<usize>,
    with_unit: bool,
    usage: bool,
) {
    let shown = limit.map_or(rows.len(), |cap| rows.len().min(cap));
    for (name, amount, unit) in &rows[..shown] {
        if usage {
            let _ = writeln!(out, "  {icon} {name}: {amount:.2} {unit}");
        } else if with_unit {
            let _ = writeln!(out, "  {icon} {name}: ${amount:.2} {unit}");
        } else {
            let _ = writeln!(out, "  {icon} {name}: ${amount:.2}");
        }
    }
    if rows.len() > shown {
        let _ = writeln!(out, "  ... 외 {}개 항목", rows.len() - shown);
    }
}

/// Render the current-month total cost line.
///
/// # Errors
///
/// Returns `InvalidFormat` when the total amount cannot be parsed.
pub fn format_current_month(
    range: &DateRange,
    response: &CostAndUsageResponse,
    metric: &str,
) -> AppResult<String> {
    let Some(total) = response
        .results_by_time
        .first()
        .and_then(|bucket| bucket.total.get(metric))
    else {
        return Ok("현재 월 비용 데이터를 찾을 수 없습니다.".to_owned());
    };
    let amount = total.amount_f64()?;
    Ok(format!(
        "현재 월({} ~ {}) 총 비용: ${amount:.2} {}",
        range.start_str(),
        range.end_str(),
        total.unit
    ))
}

/// Render a grouped cost breakdown (service or regional view): one block
/// per time bucket with ranked line items.
///
/// # Errors
///
/// Returns `InvalidFormat` when a group amount cannot be parsed.
pub fn format_grouped_costs(
    title: &str,
    range: &DateRange,
    response: &CostAndUsageResponse,
    metric: &str,
    icon: &str,
    limit: Option<usize>,
) -> AppResult<String> {
    let mut out = format!("{title} ({} ~ {}):\n\n", range.start_str(), range.end_str());
    for bucket in &response.results_by_time {
        let _ = writeln!(
            out,
            "📅 기간: {} ~ {}",
            bucket.time_period.start, bucket.time_period.end
        );
        let rows = ranked_groups(bucket, metric)?;
        push_ranked_lines(&mut out, &rows, icon, limit, false, false);
        out.push('\n');
    }
    Ok(out)
}

/// Render the cost forecast: one line per forecast bucket plus the total.
///
/// # Errors
///
/// Returns `InvalidFormat` when a forecast mean cannot be parsed.
pub fn format_forecast(range: &DateRange, response: &ForecastResponse) -> AppResult<String> {
    let mut out = format!(
        "비용 예측 ({} ~ {}):\n\n",
        range.start_str(),
        range.end_str()
    );
    let mut total = 0.0;
    for bucket in &response.forecast_results_by_time {
        let mean = bucket.mean_f64()?;
        total += mean;
        let _ = writeln!(
            out,
            "📈 {} ~ {}: ${mean:.2} (예상)",
            bucket.time_period.start, bucket.time_period.end
        );
    }
    let _ = write!(out, "\n💡 총 예상 비용: ${total:.2}");
    Ok(out)
}

/// Render the detailed cost-and-usage view. Grouped buckets show ranked
/// entries (15 at most); ungrouped buckets show the flat total. Usage
/// metrics render without a currency prefix.
///
/// # Errors
///
/// Returns `InvalidFormat` when an amount cannot be parsed.
pub fn format_cost_and_usage(
    range: &DateRange,
    response: &CostAndUsageResponse,
    metric: &str,
    group_by: &str,
    granularity: Granularity,
) -> AppResult<String> {
    let usage = metrics::is_usage(metric);
    let mut out = format!(
        "상세 비용 및 사용량 데이터 ({} ~ {}):\n메트릭: {metric}, 그룹화: {group_by}, 세분화: {granularity}\n\n",
        range.start_str(),
        range.end_str()
    );
    for bucket in &response.results_by_time {
        let _ = writeln!(
            out,
            "📅 기간: {} ~ {}",
            bucket.time_period.start, bucket.time_period.end
        );
        if bucket.groups.is_empty() {
            if let Some(total) = bucket.total.get(metric) {
                let amount = total.amount_f64()?;
                if usage {
                    let _ = writeln!(out, "  📊 총 사용량: {amount:.2} {}", total.unit);
                } else {
                    let _ = writeln!(out, "  💰 총 비용: ${amount:.2} {}", total.unit);
                }
            }
        } else {
            let rows = ranked_groups(bucket, metric)?;
            let icon = if usage { "📊" } else { "💰" };
            push_ranked_lines(
                &mut out,
                &rows,
                icon,
                Some(limits::DETAIL_BREAKDOWN),
                true,
                usage,
            );
        }
        out.push('\n');
    }
    Ok(out)
}

/// The ranked comparison rows section shared by the comparison and driver
/// views: noise-filtered, capped, signed deltas and percentages.
#[must_use]
pub fn comparison_rows_section(rows: &[ComparisonRow]) -> String {
    let mut out = String::new();
    for row in crate::comparison::top_drivers(rows) {
        let _ = writeln!(out, "  {}:", row.key);
        let _ = writeln!(
            out,
            "    기준: ${:.2} → 비교: ${:.2}",
            row.baseline, row.comparison
        );
        let _ = writeln!(
            out,
            "    변화: ${:+.2} ({:+.1}%)\n",
            row.delta, row.percent_change
        );
    }
    out
}

/// Render the two-period comparison analysis block.
#[must_use]
pub fn format_comparisons(
    baseline: &DateRange,
    comparison: &DateRange,
    rows: &[ComparisonRow],
) -> String {
    format!(
        "비용 비교 분석:\n기준 기간: {} ~ {}\n비교 기간: {} ~ {}\n\n📊 주요 변화 (절대값 기준):\n{}",
        baseline.start_str(),
        baseline.end_str(),
        comparison.start_str(),
        comparison.end_str(),
        comparison_rows_section(rows)
    )
}

/// Render the driver analysis block: the same ranked rows as the
/// comparison view, relabeled. No independent attribution happens here.
#[must_use]
pub fn format_drivers(
    baseline: &DateRange,
    comparison: &DateRange,
    rows: &[ComparisonRow],
) -> String {
    let section = comparison_rows_section(rows);
    let body = if section.is_empty() {
        "데이터를 분석할 수 없습니다.".to_owned()
    } else {
        section
    };
    format!(
        "비용 변화 주요 원인 분석:\n기준 기간: {} ~ {}\n비교 기간: {} ~ {}\n\n💡 주요 비용 변화 동인:\n{body}",
        baseline.start_str(),
        baseline.end_str(),
        comparison.start_str(),
        comparison.end_str(),
    )
}

/// Render a dimension-value listing: numbered top-20 with attribute
/// sub-lines and a "top 20 of N" trailer when more exist.
#[must_use]
pub fn format_dimension_values(
    dimension: &str,
    range: &DateRange,
    response: &DimensionValuesResponse,
) -> String {
    let mut out = format!(
        "사용 가능한 {dimension} 값들 ({} ~ {}):\n\n",
        range.start_str(),
        range.end_str()
    );
    if response.dimension_values.is_empty() {
        out.push_str("사용 가능한 값이 없습니다.");
        return out;
    }
    let total = response.dimension_values.len();
    for (index, entry) in response
        .dimension_values
        .iter()
        .take(limits::DIMENSION_VALUES)
        .enumerate()
    {
        let _ = writeln!(out, "{:2}. {}", index + 1, entry.value);
        for (key, value) in &entry.attributes {
            let _ = writeln!(out, "     {key}: {value}");
        }
    }
    if total > limits::DIMENSION_VALUES {
        let _ = write!(
            out,
            "\n... 총 {total}개 중 상위 {}개만 표시",
            limits::DIMENSION_VALUES
        );
    }
    out
}

/// Render the current-date information block with analysis-ready ranges.
#[must_use]
pub fn format_today_date(now: NaiveDateTime) -> String {
    let today = now.date();
    let current = calendar::current_month(today);
    let prior = calendar::prior_month(today);
    let mut out = String::from("현재 날짜 정보:\n");
    let _ = writeln!(out, "📅 날짜: {}", today.format("%Y-%m-%d"));
    let _ = writeln!(out, "🕐 시간: {}", now.format("%H:%M:%S"));
    let _ = writeln!(out, "📆 요일: {}", today.format("%A"));
    let _ = writeln!(out, "📊 월: {}월", today.month());
    let _ = writeln!(out, "📈 년도: {}년", today.year());
    out.push_str("\n💡 비용 분석용 날짜 범위:\n");
    let _ = writeln!(out, "   현재 월 시작: {}", current.start_str());
    let _ = writeln!(out, "   지난 월: {} ~ {}", prior.start_str(), prior.end_str());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, MetricValue, TimePeriod};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn bucket(entries: &[(&str, f64)]) -> ResultByTime {
        ResultByTime {
            time_period: TimePeriod {
                start: "2025-07-01".to_owned(),
                end: "2025-08-01".to_owned(),
            },
            total: HashMap::new(),
            groups: entries
                .iter()
                .map(|(name, amount)| Group {
                    keys: vec![(*name).to_owned()],
                    metrics: HashMap::from([(
                        "BlendedCost".to_owned(),
                        MetricValue {
                            amount: amount.to_string(),
                            unit: "USD".to_owned(),
                        },
                    )]),
                })
                .collect(),
            estimated: false,
        }
    }

    #[test]
    fn test_ranked_groups_filters_and_sorts() {
        let rows =
            ranked_groups(&bucket(&[("S3", 4.0), ("EC2", 120.5), ("Free", 0.0)]), "BlendedCost")
                .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "EC2");
        assert_eq!(rows[1].0, "S3");
    }

    #[test]
    fn test_service_truncation_to_ten_with_trailer() {
        let entries: Vec<(String, f64)> =
            (0..12).map(|i| (format!("svc-{i:02}"), f64::from(100 - i))).collect();
        let borrowed: Vec<(&str, f64)> =
            entries.iter().map(|(n, a)| (n.as_str(), *a)).collect();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        );
        let response = CostAndUsageResponse {
            results_by_time: vec![bucket(&borrowed)],
        };
        let text = format_grouped_costs(
            "서비스별 비용",
            &range,
            &response,
            "BlendedCost",
            "💰",
            Some(10),
        )
        .unwrap();
        assert_eq!(text.matches("💰").count(), 10);
        assert!(text.contains("... 외 2개 항목"));
    }

    #[test]
    fn test_usage_metric_renders_without_currency() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        );
        let mut b = bucket(&[]);
        b.groups = vec![Group {
            keys: vec!["Amazon EC2".to_owned()],
            metrics: HashMap::from([(
                "UsageQuantity".to_owned(),
                MetricValue {
                    amount: "731.5".to_owned(),
                    unit: "Hrs".to_owned(),
                },
            )]),
        }];
        let response = CostAndUsageResponse {
            results_by_time: vec![b],
        };
        let text = format_cost_and_usage(
            &range,
            &response,
            "UsageQuantity",
            "SERVICE",
            Granularity::Monthly,
        )
        .unwrap();
        assert!(text.contains("📊 Amazon EC2: 731.50 Hrs"));
        assert!(!text.contains("$731.50"));
    }

    #[test]
    fn test_dimension_listing_trailer() {
        let response = DimensionValuesResponse {
            dimension_values: (0..25)
                .map(|i| crate::models::DimensionValueEntry {
                    value: format!("value-{i}"),
                    attributes: std::collections::BTreeMap::new(),
                })
                .collect(),
        };
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 4, 16).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
        );
        let text = format_dimension_values("SERVICE", &range, &response);
        assert!(text.contains(" 1. value-0"));
        assert!(text.contains("20. value-19"));
        assert!(!text.contains("value-20"));
        assert!(text.contains("... 총 25개 중 상위 20개만 표시"));
    }

    #[test]
    fn test_comparison_row_rendering_signs() {
        let rows = vec![ComparisonRow {
            key: "EC2".to_owned(),
            baseline: 120.5,
            comparison: 80.0,
            delta: -40.5,
            percent_change: -33.609_958,
        }];
        let section = comparison_rows_section(&rows);
        assert!(section.contains("기준: $120.50 → 비교: $80.00"));
        assert!(section.contains("변화: $-40.50 (-33.6%)"));
    }

    #[test]
    fn test_drivers_relabels_same_rows() {
        let baseline = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        );
        let comparison = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
        );
        let rows = vec![ComparisonRow {
            key: "RDS".to_owned(),
            baseline: 10.0,
            comparison: 70.0,
            delta: 60.0,
            percent_change: 600.0,
        }];
        let compare_text = format_comparisons(&baseline, &comparison, &rows);
        let driver_text = format_drivers(&baseline, &comparison, &rows);
        assert!(compare_text.contains("📊 주요 변화 (절대값 기준):"));
        assert!(driver_text.contains("💡 주요 비용 변화 동인:"));
        assert!(driver_text.contains(&comparison_rows_section(&rows)));
    }

    #[test]
    fn test_today_date_block() {
        let now = NaiveDate::from_ymd_opt(2025, 7, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let text = format_today_date(now);
        assert!(text.contains("📅 날짜: 2025-07-15"));
        assert!(text.contains("📆 요일: Tuesday"));
        assert!(text.contains("현재 월 시작: 2025-07-01"));
        assert!(text.contains("지난 월: 2025-06-01 ~ 2025-07-01"));
    }
}
