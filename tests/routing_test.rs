// ABOUTME: Integration tests for query-to-intent routing
// ABOUTME: Exercises every rule arm, the priority contracts, and router determinism
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::NaiveDate;
use costwise::routing::{classify, Operation};
use serde_json::{json, Map, Value};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
}

fn args(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

#[test]
fn test_current_month_query_routes_with_empty_arguments() {
    let intent = classify("이번 달 AWS 비용이 얼마나 나왔나요?", today());
    assert_eq!(intent.operation, Operation::GetCurrentMonthCost);
    assert!(intent.arguments.is_empty());
}

#[test]
fn test_service_window_query_extracts_months_back() {
    let intent = classify("지난 3개월간 서비스별 비용", today());
    assert_eq!(intent.operation, Operation::GetServiceCosts);
    assert_eq!(intent.arguments, args(&[("months_back", json!(3))]));
}

#[test]
fn test_causal_query_routes_to_drivers_with_month_over_month_dates() {
    let intent = classify("서비스 비용이 왜 늘었는지 원인을 분석해주세요", today());
    assert_eq!(intent.operation, Operation::GetCostDrivers);
    assert_eq!(
        intent.arguments,
        args(&[
            ("baseline_start", json!("2025-06-01")),
            ("baseline_end", json!("2025-07-01")),
            ("comparison_start", json!("2025-07-01")),
            ("comparison_end", json!("2025-08-01")),
        ])
    );
}

#[test]
fn test_comparison_query_carries_same_window_arguments() {
    let intent = classify("6월과 7월 서비스 비용 변화를 비교해주세요", today());
    assert_eq!(intent.operation, Operation::GetCostComparisons);
    assert_eq!(
        intent.arguments.get("comparison_end"),
        Some(&json!("2025-08-01"))
    );
}

#[test]
fn test_plain_service_query_takes_operation_default_window() {
    let intent = classify("서비스별 비용을 보여주세요", today());
    assert_eq!(intent.operation, Operation::GetServiceCosts);
    assert!(intent.arguments.is_empty());
}

#[test]
fn test_service_list_question_routes_to_dimension_values() {
    let intent = classify("어떤 서비스를 사용하고 있나요?", today());
    assert_eq!(intent.operation, Operation::GetDimensionValues);
    assert_eq!(intent.arguments, args(&[("dimension", json!("SERVICE"))]));
}

#[test]
fn test_region_queries() {
    let costs = classify("리전별 비용 분포를 알려주세요", today());
    assert_eq!(costs.operation, Operation::GetRegionalCosts);
    assert!(costs.arguments.is_empty());

    let listing = classify("리전 목록이 궁금해요", today());
    assert_eq!(listing.operation, Operation::GetDimensionValues);
    assert_eq!(listing.arguments, args(&[("dimension", json!("REGION"))]));
}

#[test]
fn test_forecast_markers() {
    for query in ["다음 분기 비용 예측 부탁해요", "비용 전망이 어떤가요"] {
        let intent = classify(query, today());
        assert_eq!(intent.operation, Operation::GetCostForecast, "query {query:?}");
        assert!(intent.arguments.is_empty());
    }
}

#[test]
fn test_detail_queries() {
    let plain = classify("상세 비용 내역 보여주세요", today());
    assert_eq!(plain.operation, Operation::GetCostAndUsage);
    assert!(plain.arguments.is_empty());

    let daily = classify("일별로 자세하게 보여주세요", today());
    assert_eq!(daily.operation, Operation::GetCostAndUsage);
    assert_eq!(daily.arguments, args(&[("granularity", json!("DAILY"))]));

    let literal = classify("6월과 7월 상세 내역", today());
    assert_eq!(
        literal.arguments,
        args(&[
            ("start_date", json!("2025-06-01")),
            ("end_date", json!("2025-08-01")),
        ])
    );
}

#[test]
fn test_date_query_routes_to_today_date() {
    let intent = classify("오늘 날짜 알려주세요", today());
    assert_eq!(intent.operation, Operation::GetTodayDate);
    assert!(intent.arguments.is_empty());
}

#[test]
fn test_priority_current_beats_date_marker() {
    // Both the current-period and date markers appear; the first rule in
    // the table wins.
    let intent = classify("현재 날짜와 비용", today());
    assert_eq!(intent.operation, Operation::GetCurrentMonthCost);
}

#[test]
fn test_priority_comparison_beats_service_listing() {
    let intent = classify("어떤 서비스 비용이 변화했나요", today());
    assert_eq!(intent.operation, Operation::GetCostComparisons);
}

#[test]
fn test_fallback_is_current_month_cost() {
    let intent = classify("도와주세요", today());
    assert_eq!(intent.operation, Operation::GetCurrentMonthCost);
    assert!(intent.arguments.is_empty());
}

#[test]
fn test_routing_is_deterministic_across_invocations() {
    let queries = [
        "이번 달 AWS 비용이 얼마나 나왔나요?",
        "지난 3개월간 서비스별 비용",
        "서비스 비용이 왜 늘었는지 원인을 분석해주세요",
        "리전별 비용",
        "비용 예측",
    ];
    for query in queries {
        let first = classify(query, today());
        for _ in 0..5 {
            assert_eq!(classify(query, today()), first, "query {query:?}");
        }
    }
}

#[test]
fn test_comparison_dates_roll_year_at_january() {
    let january = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
    let intent = classify("서비스 비용 비교", january);
    assert_eq!(intent.arguments.get("baseline_start"), Some(&json!("2025-12-01")));
    assert_eq!(intent.arguments.get("baseline_end"), Some(&json!("2026-01-01")));
    assert_eq!(intent.arguments.get("comparison_start"), Some(&json!("2026-01-01")));
    assert_eq!(intent.arguments.get("comparison_end"), Some(&json!("2026-02-01")));
}
