// ABOUTME: Synthetic billing provider serving deterministic in-memory fixtures
// ABOUTME: Supports month injection and failure injection for development and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Synthetic Billing Provider
//!
//! A production-ready synthetic provider for development, testing, and
//! demonstration. Unlike the HTTP provider it:
//!
//! - requires no endpoint or credentials
//! - serves deterministic data derived from injected monthly fixtures
//! - can simulate billing-source failures on demand
//!
//! ## Thread Safety
//!
//! Fixture access is guarded by `RwLock` so one instance can back
//! concurrent conversations; lock poisoning degrades to an internal error
//! rather than a panic.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{BillingProvider, CostAndUsageQuery, DimensionValuesQuery, ForecastQuery};
use crate::calendar;
use crate::errors::{AppError, AppResult};
use crate::models::{
    dimensions, metrics, CostAndUsageResponse, DateRange, DimensionValueEntry,
    DimensionValuesResponse, ForecastResponse, ForecastResult, Group, MetricValue, ResultByTime,
    TimePeriod,
};

/// One month of synthetic billing data
#[derive(Debug, Clone)]
pub struct MonthlyCosts {
    /// First day of the month this fixture covers
    pub month_start: NaiveDate,
    /// Cost per service name
    pub by_service: BTreeMap<String, f64>,
    /// Cost per region code
    pub by_region: BTreeMap<String, f64>,
}

impl MonthlyCosts {
    /// Total cost across all services
    #[must_use]
    pub fn total(&self) -> f64 {
        self.by_service.values().sum()
    }
}

/// Internal fixture state
#[derive(Debug, Default)]
struct Fixtures {
    months: Vec<MonthlyCosts>,
    /// When set, every call fails with this message
    failure: Option<String>,
}

/// Synthetic billing provider for development and testing
pub struct SyntheticBillingProvider {
    fixtures: RwLock<Fixtures>,
}

impl SyntheticBillingProvider {
    /// Create a provider with the given monthly fixtures
    #[must_use]
    pub fn with_months(months: Vec<MonthlyCosts>) -> Self {
        Self {
            fixtures: RwLock::new(Fixtures {
                months,
                failure: None,
            }),
        }
    }

    /// Create a provider whose every call fails with `message`.
    /// Used to exercise the gateway's failure-to-text boundary.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fixtures: RwLock::new(Fixtures {
                months: Vec::new(),
                failure: Some(message.into()),
            }),
        }
    }

    /// Demo fixtures: two adjacent months around the given reference date
    /// with a visible cost swing on the compute line.
    #[must_use]
    pub fn demo(reference: NaiveDate) -> Self {
        let current = calendar::current_month(reference);
        let prior = calendar::prior_month(reference);
        let service_month = |ec2: f64, s3: f64, rds: f64| {
            BTreeMap::from([
                ("Amazon Elastic Compute Cloud - Compute".to_owned(), ec2),
                ("Amazon Simple Storage Service".to_owned(), s3),
                ("Amazon Relational Database Service".to_owned(), rds),
            ])
        };
        let region_month = |virginia: f64, seoul: f64| {
            BTreeMap::from([
                ("us-east-1".to_owned(), virginia),
                ("ap-northeast-2".to_owned(), seoul),
            ])
        };
        Self::with_months(vec![
            MonthlyCosts {
                month_start: prior.start,
                by_service: service_month(812.40, 95.12, 240.00),
                by_region: region_month(900.00, 247.52),
            },
            MonthlyCosts {
                month_start: current.start,
                by_service: service_month(1204.88, 98.30, 241.10),
                by_region: region_month(1290.00, 254.28),
            },
        ])
    }

    /// Inject an additional fixture month
    pub fn add_month(&self, month: MonthlyCosts) {
        if let Ok(mut fixtures) = self.fixtures.write() {
            fixtures.months.push(month);
        }
    }

    /// Run `f` over the fixtures unless a failure is injected or the lock
    /// is poisoned.
    fn with_fixtures<T>(&self, f: impl FnOnce(&[MonthlyCosts]) -> T) -> AppResult<T> {
        let fixtures = self
            .fixtures
            .read()
            .map_err(|_| AppError::internal("synthetic fixture lock poisoned"))?;
        if let Some(message) = &fixtures.failure {
            return Err(AppError::external_service("billing", message.clone()));
        }
        Ok(f(&fixtures.months))
    }

    /// The dimension map of one fixture month
    fn dimension_map<'a>(month: &'a MonthlyCosts, dimension: &str) -> &'a BTreeMap<String, f64> {
        if dimension == dimensions::REGION {
            &month.by_region
        } else {
            &month.by_service
        }
    }

    /// Unit string for a metric name
    fn unit_for(metric: &str) -> &'static str {
        if metrics::is_usage(metric) {
            "Hrs"
        } else {
            "USD"
        }
    }

    fn bucket_for(month: &MonthlyCosts, query: &CostAndUsageQuery) -> ResultByTime {
        let period = TimePeriod::from_range(&DateRange::new(
            month.month_start,
            calendar::current_month(month.month_start).end,
        ));
        let metric_value = |amount: f64, metric: &str| MetricValue {
            amount: format!("{amount}"),
            unit: Self::unit_for(metric).to_owned(),
        };

        match &query.group_by {
            Some(dimension) => {
                let groups = Self::dimension_map(month, dimension)
                    .iter()
                    .map(|(name, amount)| Group {
                        keys: vec![name.clone()],
                        metrics: query
                            .metrics
                            .iter()
                            .map(|m| (m.clone(), metric_value(*amount, m)))
                            .collect(),
                    })
                    .collect();
                ResultByTime {
                    time_period: period,
                    total: std::collections::HashMap::new(),
                    groups,
                    estimated: false,
                }
            }
            None => ResultByTime {
                time_period: period,
                total: query
                    .metrics
                    .iter()
                    .map(|m| (m.clone(), metric_value(month.total(), m)))
                    .collect(),
                groups: Vec::new(),
                estimated: false,
            },
        }
    }
}

#[async_trait]
impl BillingProvider for SyntheticBillingProvider {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn cost_and_usage(&self, query: &CostAndUsageQuery) -> AppResult<CostAndUsageResponse> {
        self.with_fixtures(|months| {
            let mut buckets: Vec<ResultByTime> = months
                .iter()
                .filter(|m| m.month_start >= query.period.start && m.month_start < query.period.end)
                .map(|m| Self::bucket_for(m, query))
                .collect();
            buckets.sort_by_key(|b| b.time_period.start.clone());
            CostAndUsageResponse {
                results_by_time: buckets,
            }
        })
    }

    async fn cost_forecast(&self, query: &ForecastQuery) -> AppResult<ForecastResponse> {
        self.with_fixtures(|months| {
            // Project the latest fixture month's total forward, one bucket
            // per 30-day span of the requested window.
            let latest_total = months
                .iter()
                .max_by_key(|m| m.month_start)
                .map_or(0.0, MonthlyCosts::total);
            let mut buckets = Vec::new();
            let mut cursor = query.period.start;
            while cursor < query.period.end {
                let next = (cursor + Duration::days(30)).min(query.period.end);
                buckets.push(ForecastResult {
                    time_period: TimePeriod::from_range(&DateRange::new(cursor, next)),
                    mean_value: format!("{latest_total:.2}"),
                });
                cursor = next;
            }
            ForecastResponse {
                forecast_results_by_time: buckets,
            }
        })
    }

    async fn dimension_values(
        &self,
        query: &DimensionValuesQuery,
    ) -> AppResult<DimensionValuesResponse> {
        self.with_fixtures(|months| {
            let mut values: Vec<String> = months
                .iter()
                .filter(|m| {
                    // Months overlapping the requested observation window.
                    m.month_start < query.period.end
                        && calendar::current_month(m.month_start).end > query.period.start
                })
                .flat_map(|m| Self::dimension_map(m, &query.dimension).keys().cloned())
                .collect();
            values.sort();
            values.dedup();
            DimensionValuesResponse {
                dimension_values: values
                    .into_iter()
                    .map(|value| DimensionValueEntry {
                        value,
                        attributes: BTreeMap::new(),
                    })
                    .collect(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Granularity;

    fn provider() -> SyntheticBillingProvider {
        SyntheticBillingProvider::demo(NaiveDate::from_ymd_opt(2025, 7, 15).unwrap())
    }

    fn service_query(start: (i32, u32, u32), end: (i32, u32, u32)) -> CostAndUsageQuery {
        CostAndUsageQuery {
            period: DateRange::new(
                NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
                NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            ),
            granularity: Granularity::Monthly,
            metrics: vec!["BlendedCost".to_owned()],
            group_by: Some("SERVICE".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_grouped_buckets_cover_requested_window() {
        let response = provider()
            .cost_and_usage(&service_query((2025, 6, 1), (2025, 8, 1)))
            .await
            .unwrap();
        assert_eq!(response.results_by_time.len(), 2);
        assert_eq!(response.results_by_time[0].time_period.start, "2025-06-01");
        assert!(!response.results_by_time[0].groups.is_empty());
    }

    #[tokio::test]
    async fn test_ungrouped_query_returns_totals() {
        let mut query = service_query((2025, 7, 1), (2025, 8, 1));
        query.group_by = None;
        let response = provider().cost_and_usage(&query).await.unwrap();
        assert_eq!(response.results_by_time.len(), 1);
        let bucket = &response.results_by_time[0];
        assert!(bucket.groups.is_empty());
        assert!(bucket.total.contains_key("BlendedCost"));
    }

    #[tokio::test]
    async fn test_failure_injection_fails_every_call() {
        let provider = SyntheticBillingProvider::failing("simulated outage");
        let error = provider
            .cost_and_usage(&service_query((2025, 7, 1), (2025, 8, 1)))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("simulated outage"));
    }

    #[tokio::test]
    async fn test_forecast_buckets_span_window() {
        let response = provider()
            .cost_forecast(&ForecastQuery {
                period: DateRange::new(
                    NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
                    NaiveDate::from_ymd_opt(2025, 10, 13).unwrap(),
                ),
                metric: "BLENDED_COST".to_owned(),
                granularity: Granularity::Monthly,
            })
            .await
            .unwrap();
        assert_eq!(response.forecast_results_by_time.len(), 3);
        assert_eq!(response.forecast_results_by_time[0].time_period.start, "2025-07-15");
    }

    #[tokio::test]
    async fn test_dimension_values_are_sorted_and_deduped() {
        let response = provider()
            .dimension_values(&DimensionValuesQuery {
                period: DateRange::new(
                    NaiveDate::from_ymd_opt(2025, 4, 16).unwrap(),
                    NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
                ),
                dimension: "SERVICE".to_owned(),
            })
            .await
            .unwrap();
        let values: Vec<&str> = response
            .dimension_values
            .iter()
            .map(|v| v.value.as_str())
            .collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(values, sorted);
        assert_eq!(values.len(), 3);
    }
}
