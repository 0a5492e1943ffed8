// ABOUTME: Cost data gateway - the nine retrieval operations behind one boundary
// ABOUTME: Resolves defaults, fetches from the billing provider, and converts failures to text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Cost Data Gateway
//!
//! One struct exposes the nine retrieval operations as methods plus a
//! [`CostDataGateway::dispatch`] entry point that executes a routed
//! [`Intent`]. Operation defaults, date-window resolution, and
//! failure-to-text conversion are enforced here - once - instead of at
//! every call site.
//!
//! Every method returns a rendered `String`. Billing failures never
//! escape as errors: they become the operation's localized error message
//! carrying the root cause, and flow through summarization like any other
//! retrieval result.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::calendar;
use crate::comparison;
use crate::constants::{limits, windows};
use crate::errors::{AppError, AppResult};
use crate::formatters;
use crate::models::{
    dimensions, metrics, CostAndUsageResponse, DateRange, Granularity,
};
use crate::providers::{BillingProvider, CostAndUsageQuery, DimensionValuesQuery, ForecastQuery};
use crate::routing::{Intent, Operation};

/// Forecast metric wire name (upper-snake, unlike the cost metrics)
const FORECAST_METRIC: &str = "BLENDED_COST";

/// Executes routed intents against a billing provider
pub struct CostDataGateway {
    provider: Arc<dyn BillingProvider>,
}

impl CostDataGateway {
    /// Create a gateway over the given billing provider
    #[must_use]
    pub fn new(provider: Arc<dyn BillingProvider>) -> Self {
        Self { provider }
    }

    /// Execute a routed intent. `now` supplies the reference date for
    /// operations whose default windows are relative to today.
    pub async fn dispatch(&self, intent: &Intent, now: NaiveDateTime) -> String {
        let today = now.date();
        let args = &intent.arguments;
        info!(operation = %intent.operation, provider = self.provider.name(), "dispatching retrieval");

        match intent.operation {
            Operation::GetCurrentMonthCost => self.current_month_cost(today).await,
            Operation::GetServiceCosts => {
                let months_back =
                    arg_u32(args, "months_back").unwrap_or(windows::SERVICE_MONTHS_BACK);
                self.service_costs(today, months_back).await
            }
            Operation::GetRegionalCosts => {
                let months_back =
                    arg_u32(args, "months_back").unwrap_or(windows::REGION_MONTHS_BACK);
                self.regional_costs(today, months_back).await
            }
            Operation::GetCostForecast => {
                let months_ahead =
                    arg_u32(args, "months_ahead").unwrap_or(windows::FORECAST_MONTHS_AHEAD);
                self.cost_forecast(today, months_ahead).await
            }
            Operation::GetCostAndUsage => {
                self.cost_and_usage(
                    today,
                    arg_str(args, "start_date"),
                    arg_str(args, "end_date"),
                    Granularity::from_str_param(arg_str(args, "granularity").unwrap_or("MONTHLY")),
                    arg_str(args, "group_by").unwrap_or(dimensions::SERVICE),
                    arg_str(args, "metric").unwrap_or(metrics::UNBLENDED_COST),
                )
                .await
            }
            Operation::GetCostComparisons => {
                self.cost_comparisons(
                    arg_str(args, "baseline_start"),
                    arg_str(args, "baseline_end"),
                    arg_str(args, "comparison_start"),
                    arg_str(args, "comparison_end"),
                    arg_str(args, "group_by").unwrap_or(dimensions::SERVICE),
                )
                .await
            }
            Operation::GetCostDrivers => {
                self.cost_drivers(
                    arg_str(args, "baseline_start"),
                    arg_str(args, "baseline_end"),
                    arg_str(args, "comparison_start"),
                    arg_str(args, "comparison_end"),
                    arg_str(args, "group_by").unwrap_or(dimensions::SERVICE),
                )
                .await
            }
            Operation::GetDimensionValues => {
                self.dimension_values(
                    today,
                    arg_str(args, "dimension").unwrap_or(dimensions::SERVICE),
                    arg_str(args, "start_date"),
                    arg_str(args, "end_date"),
                )
                .await
            }
            Operation::GetTodayDate => Self::today_date(now),
        }
    }

    /// Total cost of the current calendar month
    pub async fn current_month_cost(&self, today: NaiveDate) -> String {
        self.try_current_month_cost(today)
            .await
            .unwrap_or_else(|e| fail("비용 조회", &e))
    }

    /// Per-service cost breakdown over the trailing window
    pub async fn service_costs(&self, today: NaiveDate, months_back: u32) -> String {
        self.try_grouped_costs(
            today,
            months_back,
            dimensions::SERVICE,
            "서비스별 비용",
            "💰",
            Some(limits::SERVICE_BREAKDOWN),
        )
        .await
        .unwrap_or_else(|e| fail("서비스별 비용 조회", &e))
    }

    /// Per-region cost breakdown over the trailing window
    pub async fn regional_costs(&self, today: NaiveDate, months_back: u32) -> String {
        self.try_grouped_costs(today, months_back, dimensions::REGION, "리전별 비용", "🌍", None)
            .await
            .unwrap_or_else(|e| fail("리전별 비용 조회", &e))
    }

    /// Forecast cost over the forward window
    pub async fn cost_forecast(&self, today: NaiveDate, months_ahead: u32) -> String {
        self.try_cost_forecast(today, months_ahead)
            .await
            .unwrap_or_else(|e| fail("비용 예측 조회", &e))
    }

    /// Detailed cost and usage with explicit range/granularity/grouping
    pub async fn cost_and_usage(
        &self,
        today: NaiveDate,
        start_date: Option<&str>,
        end_date: Option<&str>,
        granularity: Granularity,
        group_by: &str,
        metric: &str,
    ) -> String {
        self.try_cost_and_usage(today, start_date, end_date, granularity, group_by, metric)
            .await
            .unwrap_or_else(|e| fail("상세 비용 및 사용량 조회", &e))
    }

    /// Two-period per-dimension cost comparison
    pub async fn cost_comparisons(
        &self,
        baseline_start: Option<&str>,
        baseline_end: Option<&str>,
        comparison_start: Option<&str>,
        comparison_end: Option<&str>,
        group_by: &str,
    ) -> String {
        self.try_comparison_rows(
            baseline_start,
            baseline_end,
            comparison_start,
            comparison_end,
            group_by,
        )
        .await
        .map(|(baseline, comparison, rows)| {
            formatters::format_comparisons(&baseline, &comparison, &rows)
        })
        .unwrap_or_else(|e| fail("비용 비교 분석", &e))
    }

    /// Ranked drivers of a two-period cost change. This is the comparison
    /// result under driver labeling - no independent causal analysis.
    pub async fn cost_drivers(
        &self,
        baseline_start: Option<&str>,
        baseline_end: Option<&str>,
        comparison_start: Option<&str>,
        comparison_end: Option<&str>,
        group_by: &str,
    ) -> String {
        self.try_comparison_rows(
            baseline_start,
            baseline_end,
            comparison_start,
            comparison_end,
            group_by,
        )
        .await
        .map(|(baseline, comparison, rows)| {
            formatters::format_drivers(&baseline, &comparison, &rows)
        })
        .unwrap_or_else(|e| fail("비용 변화 원인 분석", &e))
    }

    /// Observed values of a grouping dimension
    pub async fn dimension_values(
        &self,
        today: NaiveDate,
        dimension: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> String {
        self.try_dimension_values(today, dimension, start_date, end_date)
            .await
            .unwrap_or_else(|e| fail("차원 값 조회", &e))
    }

    /// Current date information with analysis-ready ranges
    #[must_use]
    pub fn today_date(now: NaiveDateTime) -> String {
        formatters::format_today_date(now)
    }

    // ------------------------------------------------------------------
    // Fallible bodies; the public methods above own error-to-text
    // ------------------------------------------------------------------

    async fn try_current_month_cost(&self, today: NaiveDate) -> AppResult<String> {
        let range = calendar::current_month(today);
        let response = self
            .provider
            .cost_and_usage(&CostAndUsageQuery {
                period: range,
                granularity: Granularity::Monthly,
                metrics: vec![metrics::BLENDED_COST.to_owned()],
                group_by: None,
            })
            .await?;
        formatters::format_current_month(&range, &response, metrics::BLENDED_COST)
    }

    async fn try_grouped_costs(
        &self,
        today: NaiveDate,
        months_back: u32,
        dimension: &str,
        title: &str,
        icon: &str,
        limit: Option<usize>,
    ) -> AppResult<String> {
        let range = calendar::months_back(today, months_back);
        let response = self
            .provider
            .cost_and_usage(&CostAndUsageQuery {
                period: range,
                granularity: Granularity::Monthly,
                metrics: vec![metrics::BLENDED_COST.to_owned()],
                group_by: Some(dimension.to_owned()),
            })
            .await?;
        formatters::format_grouped_costs(title, &range, &response, metrics::BLENDED_COST, icon, limit)
    }

    async fn try_cost_forecast(&self, today: NaiveDate, months_ahead: u32) -> AppResult<String> {
        let range = calendar::months_ahead(today, months_ahead);
        let response = self
            .provider
            .cost_forecast(&ForecastQuery {
                period: range,
                metric: FORECAST_METRIC.to_owned(),
                granularity: Granularity::Monthly,
            })
            .await?;
        formatters::format_forecast(&range, &response)
    }

    async fn try_cost_and_usage(
        &self,
        today: NaiveDate,
        start_date: Option<&str>,
        end_date: Option<&str>,
        granularity: Granularity,
        group_by: &str,
        metric: &str,
    ) -> AppResult<String> {
        // Missing ends of the range default independently: the window
        // closes at the current month boundary and opens two months back.
        let end = match end_date {
            Some(raw) => parse_date(raw)?,
            None => calendar::current_month(today).start,
        };
        let start = match start_date {
            Some(raw) => parse_date(raw)?,
            None => calendar::months_back(today, windows::DETAIL_MONTHS_BACK).start,
        };
        let range = DateRange::new(start, end);
        let response = self
            .provider
            .cost_and_usage(&CostAndUsageQuery {
                period: range,
                granularity,
                metrics: vec![metric.to_owned()],
                group_by: normalized_grouping(group_by),
            })
            .await?;
        formatters::format_cost_and_usage(&range, &response, metric, group_by, granularity)
    }

    async fn try_comparison_rows(
        &self,
        baseline_start: Option<&str>,
        baseline_end: Option<&str>,
        comparison_start: Option<&str>,
        comparison_end: Option<&str>,
        group_by: &str,
    ) -> AppResult<(DateRange, DateRange, Vec<crate::models::ComparisonRow>)> {
        let baseline = required_range(baseline_start, baseline_end, "baseline")?;
        let comparison = required_range(comparison_start, comparison_end, "comparison")?;

        let fetch = |period: DateRange| {
            let query = CostAndUsageQuery {
                period,
                granularity: Granularity::Monthly,
                metrics: vec![metrics::UNBLENDED_COST.to_owned()],
                group_by: Some(group_by.to_owned()),
            };
            async move { self.provider.cost_and_usage(&query).await }
        };

        let baseline_response = fetch(baseline).await?;
        let comparison_response = fetch(comparison).await?;

        let baseline_costs = dimension_cost_map(&baseline_response, metrics::UNBLENDED_COST)?;
        let comparison_costs = dimension_cost_map(&comparison_response, metrics::UNBLENDED_COST)?;
        let rows = comparison::compare(&baseline_costs, &comparison_costs);
        Ok((baseline, comparison, rows))
    }

    async fn try_dimension_values(
        &self,
        today: NaiveDate,
        dimension: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> AppResult<String> {
        // Either bound missing collapses both to the trailing-90-days
        // observation window.
        let range = match (start_date, end_date) {
            (Some(start), Some(end)) => DateRange::new(parse_date(start)?, parse_date(end)?),
            _ => DateRange::new(today - Duration::days(windows::DIMENSION_LOOKBACK_DAYS), today),
        };
        let response = self
            .provider
            .dimension_values(&DimensionValuesQuery {
                period: range,
                dimension: dimension.to_owned(),
            })
            .await?;
        Ok(formatters::format_dimension_values(dimension, &range, &response))
    }
}

// ============================================================================
// Argument and response helpers
// ============================================================================

/// Localized failure text: `<operation> 중 오류가 발생했습니다: <cause>`
fn fail(operation_label: &str, error: &AppError) -> String {
    warn!(%error, "retrieval failed: {operation_label}");
    format!("{operation_label} 중 오류가 발생했습니다: {error}")
}

fn arg_u32(args: &Map<String, Value>, key: &str) -> Option<u32> {
    args.get(key).and_then(Value::as_u64).and_then(|n| u32::try_from(n).ok())
}

fn arg_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| AppError::invalid_format(format!("malformed date {raw:?}: {e}")))
}

fn required_range(
    start: Option<&str>,
    end: Option<&str>,
    label: &str,
) -> AppResult<DateRange> {
    let start = start.ok_or_else(|| AppError::missing_field(format!("{label}_start")))?;
    let end = end.ok_or_else(|| AppError::missing_field(format!("{label}_end")))?;
    Ok(DateRange::new(parse_date(start)?, parse_date(end)?))
}

/// Grouping dimension for the detail query; empty or `NONE` suppresses it
fn normalized_grouping(group_by: &str) -> Option<String> {
    if group_by.is_empty() || group_by.eq_ignore_ascii_case(dimensions::NONE) {
        None
    } else {
        Some(group_by.to_uppercase())
    }
}

/// Per-dimension amounts of the first time bucket. Comparison windows are
/// single-month, so the first bucket is the whole story; zero and negative
/// amounts are kept.
fn dimension_cost_map(
    response: &CostAndUsageResponse,
    metric: &str,
) -> AppResult<BTreeMap<String, f64>> {
    let mut costs = BTreeMap::new();
    if let Some(bucket) = response.results_by_time.first() {
        for group in &bucket.groups {
            if let Some(value) = group.metrics.get(metric) {
                costs.insert(group.primary_key().to_owned(), value.amount_f64()?);
            }
        }
    }
    Ok(costs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_grouping() {
        assert_eq!(normalized_grouping("SERVICE"), Some("SERVICE".to_owned()));
        assert_eq!(normalized_grouping("region"), Some("REGION".to_owned()));
        assert_eq!(normalized_grouping("NONE"), None);
        assert_eq!(normalized_grouping(""), None);
    }

    #[test]
    fn test_required_range_reports_missing_field() {
        let error = required_range(Some("2025-06-01"), None, "baseline").unwrap_err();
        assert!(error.message.contains("baseline_end"));
    }

    #[test]
    fn test_parse_date_rejects_malformed_input() {
        assert!(parse_date("2025-06-01").is_ok());
        assert!(parse_date("June 1st").is_err());
    }
}
