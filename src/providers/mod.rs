// ABOUTME: Billing provider SPI - the contract for fetching cost data from a billing source
// ABOUTME: Defines the BillingProvider trait and the shared query parameter types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Billing Provider Architecture
//!
//! The billing source is reached through the [`BillingProvider`] trait: the
//! three upstream calls every retrieval operation is composed from. The
//! gateway owns the nine user-facing operations; providers only move bytes.
//!
//! Two implementations ship:
//!
//! - [`http::HttpBillingProvider`] speaks the Cost Explorer wire format
//!   against a configurable endpoint
//! - [`synthetic::SyntheticBillingProvider`] serves in-memory fixtures for
//!   development, CI, and demonstrations - no credentials needed
//!
//! All providers return [`AppResult`]; failure-to-text conversion happens
//! once at the gateway boundary, never here.

pub mod http;
pub mod synthetic;

pub use http::HttpBillingProvider;
pub use synthetic::SyntheticBillingProvider;

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{
    CostAndUsageResponse, DateRange, DimensionValuesResponse, ForecastResponse, Granularity,
};

/// Parameters of a cost-and-usage retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostAndUsageQuery {
    /// Half-open period to query
    pub period: DateRange,
    /// Bucket size
    pub granularity: Granularity,
    /// Metric names to fetch (e.g. `BlendedCost`)
    pub metrics: Vec<String>,
    /// Grouping dimension; `None` requests flat totals
    pub group_by: Option<String>,
}

/// Parameters of a cost-forecast retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    /// Forward period to forecast
    pub period: DateRange,
    /// Forecast metric (upper-snake wire form, e.g. `BLENDED_COST`)
    pub metric: String,
    /// Bucket size
    pub granularity: Granularity,
}

/// Parameters of a dimension-values retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionValuesQuery {
    /// Period the values must have been observed in
    pub period: DateRange,
    /// Dimension to enumerate (e.g. `SERVICE`, `REGION`)
    pub dimension: String,
}

/// The contract every billing source implements.
///
/// Implementations are `Send + Sync` so one provider instance can back
/// concurrent conversations. All three calls are read-only against the
/// billing source; none mutate provider state.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Short identifier for logging (`http`, `synthetic`, ...)
    fn name(&self) -> &'static str;

    /// Fetch time-bucketed, optionally grouped cost/usage records.
    ///
    /// # Errors
    ///
    /// Returns an error when the billing source is unreachable, rejects
    /// the request, or emits a malformed response.
    async fn cost_and_usage(&self, query: &CostAndUsageQuery) -> AppResult<CostAndUsageResponse>;

    /// Fetch a cost forecast over a forward window.
    ///
    /// # Errors
    ///
    /// Returns an error when the billing source is unreachable, rejects
    /// the request, or emits a malformed response.
    async fn cost_forecast(&self, query: &ForecastQuery) -> AppResult<ForecastResponse>;

    /// Enumerate the observed values of a grouping dimension.
    ///
    /// # Errors
    ///
    /// Returns an error when the billing source is unreachable, rejects
    /// the request, or emits a malformed response.
    async fn dimension_values(
        &self,
        query: &DimensionValuesQuery,
    ) -> AppResult<DimensionValuesResponse>;
}
