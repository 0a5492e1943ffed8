// ABOUTME: Intent router mapping free-text billing questions to named retrieval operations
// ABOUTME: Evaluates an ordered table of keyword predicate rules, first match wins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Intent Routing
//!
//! Classifies a raw user query into an [`Intent`]: one of nine named
//! retrieval operations plus a sparse argument map. Classification is an
//! ordered, first-match-wins evaluation of [`ROUTE_RULES`], a fixed table
//! of predicate + builder pairs over the case-normalized query text.
//!
//! The table order is a contract, not an implementation detail: the
//! keyword sets overlap (a query can carry both a current-period marker
//! and a date marker), and which rule fires is defined solely by its
//! position. Each rule is independently testable by name.
//!
//! Queries use Korean domain markers (현재, 서비스, 리전, 예측, ...);
//! date arguments embedded by the comparison rules are resolved against
//! the caller-supplied reference date, so identical `(query, today)`
//! inputs always produce identical intents.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

use crate::calendar;
use crate::models::dimensions;

// ============================================================================
// Operations
// ============================================================================

/// The nine named retrieval operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Total cost of the current calendar month
    GetCurrentMonthCost,
    /// Per-service cost breakdown over a trailing window
    GetServiceCosts,
    /// Per-region cost breakdown over a trailing window
    GetRegionalCosts,
    /// Forecast cost over a forward window
    GetCostForecast,
    /// Detailed cost and usage with explicit range/granularity/grouping
    GetCostAndUsage,
    /// Two-period per-dimension cost comparison
    GetCostComparisons,
    /// Ranked drivers of a two-period cost change
    GetCostDrivers,
    /// Available values of a grouping dimension
    GetDimensionValues,
    /// Current date information and analysis-ready ranges
    GetTodayDate,
}

impl Operation {
    /// Wire name of the operation, as used in intent dispatch
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::GetCurrentMonthCost => "get_current_month_cost",
            Self::GetServiceCosts => "get_service_costs",
            Self::GetRegionalCosts => "get_regional_costs",
            Self::GetCostForecast => "get_cost_forecast",
            Self::GetCostAndUsage => "get_cost_and_usage",
            Self::GetCostComparisons => "get_cost_comparisons",
            Self::GetCostDrivers => "get_cost_drivers",
            Self::GetDimensionValues => "get_dimension_values",
            Self::GetTodayDate => "get_today_date",
        }
    }

    /// All operations, in dispatch-table order
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::GetCurrentMonthCost,
            Self::GetServiceCosts,
            Self::GetRegionalCosts,
            Self::GetCostForecast,
            Self::GetCostAndUsage,
            Self::GetCostComparisons,
            Self::GetCostDrivers,
            Self::GetDimensionValues,
            Self::GetTodayDate,
        ]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// A routed query: operation plus sparse arguments.
///
/// Absent argument keys take operation-specific defaults inside the
/// gateway; the router only records what the query itself pinned down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// The retrieval operation to execute
    pub operation: Operation,
    /// Sparse argument map, keys per the operation's schema
    pub arguments: Map<String, Value>,
}

impl Intent {
    /// An intent with no arguments
    #[must_use]
    pub fn bare(operation: Operation) -> Self {
        Self {
            operation,
            arguments: Map::new(),
        }
    }

    /// An intent carrying the given arguments
    #[must_use]
    pub const fn with_args(operation: Operation, arguments: Map<String, Value>) -> Self {
        Self {
            operation,
            arguments,
        }
    }
}

// ============================================================================
// Query Text
// ============================================================================

/// Shared regex for the `<N>개월` / `<N>월` month-count suffix. The
/// pattern is a literal; `None` is unreachable in practice and simply
/// disables month-count extraction.
fn month_count_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)개?월").ok()).as_ref()
}

/// Case-normalized view of a query with the marker predicates the route
/// rules test. Construction is cheap; one instance lives per classify call.
#[derive(Debug)]
pub struct QueryText {
    normalized: String,
}

impl QueryText {
    /// Normalize a raw query for rule evaluation
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self {
            normalized: raw.to_lowercase(),
        }
    }

    /// Raw substring test against the normalized text
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.normalized.contains(needle)
    }

    /// Current-period marker: 현재 or 이번 달
    #[must_use]
    pub fn has_current_marker(&self) -> bool {
        self.contains("현재") || self.contains("이번 달")
    }

    /// Comparison marker: 비교
    #[must_use]
    pub fn has_comparison_marker(&self) -> bool {
        self.contains("비교")
    }

    /// Change marker: 변화
    #[must_use]
    pub fn has_change_marker(&self) -> bool {
        self.contains("변화")
    }

    /// Causal marker: 원인 or 왜
    #[must_use]
    pub fn has_causal_marker(&self) -> bool {
        self.contains("원인") || self.contains("왜")
    }

    /// Analysis marker: 분석
    #[must_use]
    pub fn has_analysis_marker(&self) -> bool {
        self.contains("분석")
    }

    /// Service-dimension marker: 서비스
    #[must_use]
    pub fn has_service_marker(&self) -> bool {
        self.contains("서비스")
    }

    /// Region-dimension marker: 리전
    #[must_use]
    pub fn has_region_marker(&self) -> bool {
        self.contains("리전")
    }

    /// Forecast marker: 예측 or 전망
    #[must_use]
    pub fn has_forecast_marker(&self) -> bool {
        self.contains("예측") || self.contains("전망")
    }

    /// Detail marker: 상세 or 자세
    #[must_use]
    pub fn has_detail_marker(&self) -> bool {
        self.contains("상세") || self.contains("자세")
    }

    /// Daily-granularity marker: 일별
    #[must_use]
    pub fn has_daily_marker(&self) -> bool {
        self.contains("일별")
    }

    /// Date marker: 날짜
    #[must_use]
    pub fn has_date_marker(&self) -> bool {
        self.contains("날짜")
    }

    /// List-qualifier marker for "which services/regions": 어떤 or 목록
    #[must_use]
    pub fn has_list_qualifier(&self) -> bool {
        self.contains("어떤") || self.contains("목록")
    }

    /// Extract an embedded month count from a `<N>개월` suffix, if any
    #[must_use]
    pub fn month_count(&self) -> Option<u32> {
        month_count_regex()?
            .captures(&self.normalized)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    }
}

// ============================================================================
// Route Rules
// ============================================================================

/// One entry of the routing priority table
struct RouteRule {
    /// Stable identifier for logs and per-rule tests
    name: &'static str,
    /// Whether the rule applies to the query
    matches: fn(&QueryText) -> bool,
    /// Build the intent once the rule has matched
    build: fn(&QueryText, NaiveDate) -> Intent,
}

/// Baseline/comparison date arguments shared by the comparison and
/// driver operations: prior month vs current month of the reference date.
fn month_over_month_args(today: NaiveDate) -> Map<String, Value> {
    let baseline = calendar::prior_month(today);
    let comparison = calendar::current_month(today);
    let mut args = Map::new();
    args.insert("baseline_start".into(), Value::String(baseline.start_str()));
    args.insert("baseline_end".into(), Value::String(baseline.end_str()));
    args.insert(
        "comparison_start".into(),
        Value::String(comparison.start_str()),
    );
    args.insert("comparison_end".into(), Value::String(comparison.end_str()));
    args
}

fn build_current_month(_q: &QueryText, _today: NaiveDate) -> Intent {
    Intent::bare(Operation::GetCurrentMonthCost)
}

fn build_comparisons(_q: &QueryText, today: NaiveDate) -> Intent {
    Intent::with_args(Operation::GetCostComparisons, month_over_month_args(today))
}

fn build_drivers(_q: &QueryText, today: NaiveDate) -> Intent {
    Intent::with_args(Operation::GetCostDrivers, month_over_month_args(today))
}

fn build_service_costs(q: &QueryText, _today: NaiveDate) -> Intent {
    if q.has_list_qualifier() {
        let mut args = Map::new();
        args.insert("dimension".into(), Value::String(dimensions::SERVICE.into()));
        return Intent::with_args(Operation::GetDimensionValues, args);
    }
    let mut args = Map::new();
    if let Some(n) = q.month_count() {
        args.insert("months_back".into(), Value::Number(n.into()));
    }
    Intent::with_args(Operation::GetServiceCosts, args)
}

fn build_regional_costs(q: &QueryText, _today: NaiveDate) -> Intent {
    if q.has_list_qualifier() {
        let mut args = Map::new();
        args.insert("dimension".into(), Value::String(dimensions::REGION.into()));
        return Intent::with_args(Operation::GetDimensionValues, args);
    }
    Intent::bare(Operation::GetRegionalCosts)
}

fn build_forecast(_q: &QueryText, _today: NaiveDate) -> Intent {
    Intent::bare(Operation::GetCostForecast)
}

fn build_cost_and_usage(q: &QueryText, _today: NaiveDate) -> Intent {
    let mut args = Map::new();
    // Two literal month markers pin the historical June-July window; a
    // daily marker only adjusts granularity. Mirrors the legacy matcher.
    if q.contains("6월") && q.contains("7월") {
        args.insert("start_date".into(), Value::String("2025-06-01".into()));
        args.insert("end_date".into(), Value::String("2025-08-01".into()));
    } else if q.has_daily_marker() {
        args.insert("granularity".into(), Value::String("DAILY".into()));
    }
    Intent::with_args(Operation::GetCostAndUsage, args)
}

fn build_today_date(_q: &QueryText, _today: NaiveDate) -> Intent {
    Intent::bare(Operation::GetTodayDate)
}

/// The routing priority table. Order is contractual: the first satisfied
/// rule wins, and several predicates deliberately shadow later ones
/// (e.g. `current_month_cost` shadows the 현재 arm of `today_date`).
static ROUTE_RULES: &[RouteRule] = &[
    RouteRule {
        name: "current_month_cost",
        matches: QueryText::has_current_marker,
        build: build_current_month,
    },
    RouteRule {
        name: "service_cost_comparison",
        matches: |q| q.has_service_marker() && (q.has_comparison_marker() || q.has_change_marker()),
        build: build_comparisons,
    },
    RouteRule {
        name: "cost_drivers",
        matches: |q| q.has_causal_marker() || (q.has_change_marker() && q.has_analysis_marker()),
        build: build_drivers,
    },
    RouteRule {
        name: "service_costs",
        matches: QueryText::has_service_marker,
        build: build_service_costs,
    },
    RouteRule {
        name: "regional_costs",
        matches: QueryText::has_region_marker,
        build: build_regional_costs,
    },
    RouteRule {
        name: "cost_forecast",
        matches: QueryText::has_forecast_marker,
        build: build_forecast,
    },
    RouteRule {
        name: "cost_and_usage",
        matches: QueryText::has_detail_marker,
        build: build_cost_and_usage,
    },
    RouteRule {
        name: "today_date",
        matches: |q| q.has_date_marker() || q.has_current_marker(),
        build: build_today_date,
    },
];

/// Classify a raw query into an intent against the given reference date.
///
/// Falls back to `get_current_month_cost` with no arguments when no rule
/// matches; routing never fails.
#[must_use]
pub fn classify(query: &str, today: NaiveDate) -> Intent {
    let text = QueryText::new(query);
    for rule in ROUTE_RULES {
        if (rule.matches)(&text) {
            let intent = (rule.build)(&text, today);
            debug!(rule = rule.name, operation = %intent.operation, "routed query");
            return intent;
        }
    }
    debug!("no rule matched, defaulting to current month cost");
    Intent::bare(Operation::GetCurrentMonthCost)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
    }

    #[test]
    fn test_month_count_extraction() {
        assert_eq!(QueryText::new("지난 3개월간 서비스별 비용").month_count(), Some(3));
        assert_eq!(QueryText::new("지난 12개월 추이").month_count(), Some(12));
        assert_eq!(QueryText::new("서비스별 비용").month_count(), None);
    }

    #[test]
    fn test_rule_order_is_stable() {
        let names: Vec<&str> = ROUTE_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            [
                "current_month_cost",
                "service_cost_comparison",
                "cost_drivers",
                "service_costs",
                "regional_costs",
                "cost_forecast",
                "cost_and_usage",
                "today_date",
            ]
        );
    }

    #[test]
    fn test_current_marker_shadows_date_rule() {
        // 현재 appears in both the first and the last rule's predicate;
        // the first wins by table order.
        let intent = classify("현재 날짜 기준 비용", today());
        assert_eq!(intent.operation, Operation::GetCurrentMonthCost);
    }

    #[test]
    fn test_comparison_beats_plain_service_rule() {
        let intent = classify("서비스 비용 비교해주세요", today());
        assert_eq!(intent.operation, Operation::GetCostComparisons);
        assert_eq!(
            intent.arguments.get("baseline_start"),
            Some(&Value::String("2025-06-01".into()))
        );
    }

    #[test]
    fn test_list_qualifier_routes_to_dimension_values() {
        let intent = classify("어떤 서비스를 쓰고 있나요", today());
        assert_eq!(intent.operation, Operation::GetDimensionValues);
        assert_eq!(
            intent.arguments.get("dimension"),
            Some(&Value::String("SERVICE".into()))
        );

        let intent = classify("리전 목록 보여주세요", today());
        assert_eq!(intent.operation, Operation::GetDimensionValues);
        assert_eq!(
            intent.arguments.get("dimension"),
            Some(&Value::String("REGION".into()))
        );
    }

    #[test]
    fn test_daily_marker_sets_granularity() {
        let intent = classify("일별 상세 비용을 보여주세요", today());
        assert_eq!(intent.operation, Operation::GetCostAndUsage);
        assert_eq!(
            intent.arguments.get("granularity"),
            Some(&Value::String("DAILY".into()))
        );
    }

    #[test]
    fn test_literal_month_pair_sets_explicit_range() {
        let intent = classify("6월과 7월 상세 비용", today());
        assert_eq!(intent.operation, Operation::GetCostAndUsage);
        assert_eq!(
            intent.arguments.get("start_date"),
            Some(&Value::String("2025-06-01".into()))
        );
        assert_eq!(
            intent.arguments.get("end_date"),
            Some(&Value::String("2025-08-01".into()))
        );
    }

    #[test]
    fn test_unmatched_query_falls_back_to_current_month() {
        let intent = classify("안녕하세요", today());
        assert_eq!(intent.operation, Operation::GetCurrentMonthCost);
        assert!(intent.arguments.is_empty());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let a = classify("지난 3개월간 서비스별 비용", today());
        let b = classify("지난 3개월간 서비스별 비용", today());
        assert_eq!(a, b);
    }
}
