// ABOUTME: HTTP billing provider speaking the Cost Explorer x-amz-json-1.1 wire format
// ABOUTME: Posts target-addressed JSON requests to a configurable endpoint with bearer auth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # HTTP Billing Provider
//!
//! Speaks the Cost Explorer protocol: a single POST endpoint, the action
//! selected by the `X-Amz-Target` header, request and response bodies in
//! `application/x-amz-json-1.1` with PascalCase field names.
//!
//! The provider authenticates with a static bearer token and therefore
//! targets CE-compatible endpoints (gateways, proxies, emulators) rather
//! than the signed AWS endpoint directly; request signing is transport
//! plumbing that lives outside this crate.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::{BillingProvider, CostAndUsageQuery, DimensionValuesQuery, ForecastQuery};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{
    CostAndUsageResponse, DimensionValuesResponse, ForecastResponse, TimePeriod,
};

/// Service name used in error messages
const SERVICE: &str = "billing";

/// `X-Amz-Target` values for the three upstream actions
const TARGET_COST_AND_USAGE: &str = "AWSInsightsIndexService.GetCostAndUsage";
const TARGET_COST_FORECAST: &str = "AWSInsightsIndexService.GetCostForecast";
const TARGET_DIMENSION_VALUES: &str = "AWSInsightsIndexService.GetDimensionValues";

/// Content type of the CE wire protocol
const AMZ_JSON: &str = "application/x-amz-json-1.1";

// ============================================================================
// Wire Request Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GroupDefinition {
    #[serde(rename = "Type")]
    group_type: &'static str,
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Serialize)]
struct CostAndUsageRequest {
    #[serde(rename = "TimePeriod")]
    time_period: TimePeriod,
    #[serde(rename = "Granularity")]
    granularity: &'static str,
    #[serde(rename = "Metrics")]
    metrics: Vec<String>,
    #[serde(rename = "GroupBy", skip_serializing_if = "Vec::is_empty")]
    group_by: Vec<GroupDefinition>,
}

#[derive(Debug, Serialize)]
struct ForecastRequest {
    #[serde(rename = "TimePeriod")]
    time_period: TimePeriod,
    #[serde(rename = "Metric")]
    metric: String,
    #[serde(rename = "Granularity")]
    granularity: &'static str,
}

#[derive(Debug, Serialize)]
struct DimensionValuesRequest {
    #[serde(rename = "TimePeriod")]
    time_period: TimePeriod,
    #[serde(rename = "Dimension")]
    dimension: String,
}

// ============================================================================
// Provider
// ============================================================================

/// Billing provider backed by a CE-compatible HTTP endpoint
pub struct HttpBillingProvider {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpBillingProvider {
    /// Create a provider against the given endpoint with an optional
    /// static bearer token.
    #[must_use]
    pub fn new(endpoint: Url, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            token,
        }
    }

    /// Issue one target-addressed call and decode the response body.
    async fn call<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        target: &str,
        body: &B,
    ) -> AppResult<R> {
        debug!(target, endpoint = %self.endpoint, "billing API call");
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("X-Amz-Target", target)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::external_unavailable(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(target, %status, "billing API call failed");
            return Err(Self::status_error(status, &detail));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| AppError::invalid_format(format!("{SERVICE} response: {e}")))
    }

    /// Map an HTTP failure status to the error taxonomy
    fn status_error(status: StatusCode, detail: &str) -> AppError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AppError::external_auth(SERVICE, format!("{status}: {detail}"))
            }
            StatusCode::TOO_MANY_REQUESTS => AppError::new(
                ErrorCode::ExternalRateLimited,
                format!("{SERVICE}: {status}: {detail}"),
            ),
            s if s.is_server_error() => {
                AppError::external_unavailable(SERVICE, format!("{status}: {detail}"))
            }
            _ => AppError::external_service(SERVICE, format!("{status}: {detail}")),
        }
    }
}

#[async_trait]
impl BillingProvider for HttpBillingProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn cost_and_usage(&self, query: &CostAndUsageQuery) -> AppResult<CostAndUsageResponse> {
        let request = CostAndUsageRequest {
            time_period: TimePeriod::from_range(&query.period),
            granularity: query.granularity.as_str(),
            metrics: query.metrics.clone(),
            group_by: query
                .group_by
                .iter()
                .map(|key| GroupDefinition {
                    group_type: "DIMENSION",
                    key: key.clone(),
                })
                .collect(),
        };
        self.call(TARGET_COST_AND_USAGE, &request).await
    }

    async fn cost_forecast(&self, query: &ForecastQuery) -> AppResult<ForecastResponse> {
        let request = ForecastRequest {
            time_period: TimePeriod::from_range(&query.period),
            metric: query.metric.clone(),
            granularity: query.granularity.as_str(),
        };
        self.call(TARGET_COST_FORECAST, &request).await
    }

    async fn dimension_values(
        &self,
        query: &DimensionValuesQuery,
    ) -> AppResult<DimensionValuesResponse> {
        let request = DimensionValuesRequest {
            time_period: TimePeriod::from_range(&query.period),
            dimension: query.dimension.clone(),
        };
        self.call(TARGET_DIMENSION_VALUES, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, Granularity};
    use chrono::NaiveDate;

    #[test]
    fn test_cost_and_usage_request_wire_shape() {
        let query = CostAndUsageQuery {
            period: DateRange::new(
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            ),
            granularity: Granularity::Monthly,
            metrics: vec!["BlendedCost".to_owned()],
            group_by: Some("SERVICE".to_owned()),
        };
        let request = CostAndUsageRequest {
            time_period: TimePeriod::from_range(&query.period),
            granularity: query.granularity.as_str(),
            metrics: query.metrics.clone(),
            group_by: vec![GroupDefinition {
                group_type: "DIMENSION",
                key: "SERVICE".to_owned(),
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["TimePeriod"]["Start"], "2025-06-01");
        assert_eq!(value["Granularity"], "MONTHLY");
        assert_eq!(value["GroupBy"][0]["Type"], "DIMENSION");
        assert_eq!(value["GroupBy"][0]["Key"], "SERVICE");
    }

    #[test]
    fn test_ungrouped_request_omits_group_by() {
        let request = CostAndUsageRequest {
            time_period: TimePeriod {
                start: "2025-07-01".to_owned(),
                end: "2025-08-01".to_owned(),
            },
            granularity: "MONTHLY",
            metrics: vec!["BlendedCost".to_owned()],
            group_by: Vec::new(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("GroupBy").is_none());
    }

    #[test]
    fn test_status_error_classification() {
        let auth = HttpBillingProvider::status_error(StatusCode::FORBIDDEN, "denied");
        assert_eq!(auth.code, ErrorCode::ExternalAuthFailed);
        let rate = HttpBillingProvider::status_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(rate.code, ErrorCode::ExternalRateLimited);
        let down = HttpBillingProvider::status_error(StatusCode::BAD_GATEWAY, "");
        assert_eq!(down.code, ErrorCode::ExternalServiceUnavailable);
    }
}
