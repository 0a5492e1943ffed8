// ABOUTME: Core data models for the Costwise assistant
// ABOUTME: Defines DateRange, ComparisonRow, ConversationTurn and the Cost Explorer wire types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Core Data Models
//!
//! Two families of types live here:
//!
//! - **Domain types** used across the crate: [`DateRange`], [`ComparisonRow`],
//!   [`ConversationTurn`], [`Granularity`].
//! - **Wire types** mirroring the Cost Explorer API response shapes. Field
//!   names are serialized PascalCase exactly as the billing API emits them
//!   (`ResultsByTime`, `Groups`, `Keys`, `Metrics`, `Amount`, `Unit`, ...);
//!   renaming any of them breaks wire compatibility.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::errors::{AppError, AppResult};

// ============================================================================
// Domain Types
// ============================================================================

/// A half-open calendar interval `[start, end)`.
///
/// Rendered as `YYYY-MM-DD` on both ends. `start < end` holds for every
/// range the resolver produces from a router intent; `months_back(d, 0)`
/// is the one degenerate case (empty range) and is never routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Inclusive first day
    pub start: NaiveDate,
    /// Exclusive end day
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a new date range
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Start date formatted as `YYYY-MM-DD`
    #[must_use]
    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// End date formatted as `YYYY-MM-DD`
    #[must_use]
    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ~ {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Time bucket size for billing results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    /// One bucket per calendar month
    #[default]
    Monthly,
    /// One bucket per day
    Daily,
}

impl Granularity {
    /// Wire representation expected by the billing API
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "MONTHLY",
            Self::Daily => "DAILY",
        }
    }

    /// Parse from a (case-insensitive) request parameter, defaulting to monthly
    #[must_use]
    pub fn from_str_param(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DAILY" => Self::Daily,
            _ => Self::Monthly,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Well-known metric identifiers. The billing API accepts others; these are
/// the ones the router and formatters treat specially.
pub mod metrics {
    /// Amortized cost metric used by default in detail queries
    pub const UNBLENDED_COST: &str = "UnblendedCost";
    /// Blended cost metric used by the fixed-window retrievals
    pub const BLENDED_COST: &str = "BlendedCost";
    /// Usage quantity metric, rendered without a currency prefix
    pub const USAGE_QUANTITY: &str = "UsageQuantity";

    /// Whether a metric is a usage quantity rather than a monetary amount
    #[must_use]
    pub fn is_usage(metric: &str) -> bool {
        metric == USAGE_QUANTITY
    }
}

/// Well-known grouping dimensions
pub mod dimensions {
    /// Group by service name
    pub const SERVICE: &str = "SERVICE";
    /// Group by region
    pub const REGION: &str = "REGION";
    /// Sentinel that suppresses grouping entirely
    pub const NONE: &str = "NONE";
}

/// One per-dimension row of a two-period cost comparison.
///
/// Invariants (enforced by the comparison engine):
/// - `delta == comparison - baseline`
/// - `percent_change == 100` when `baseline == 0 && comparison > 0`
/// - `percent_change == 0` when both periods are zero
/// - otherwise `percent_change == 100 * delta / baseline`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// Dimension value this row describes (service name, region, ...)
    pub key: String,
    /// Cost in the baseline period
    pub baseline: f64,
    /// Cost in the comparison period
    pub comparison: f64,
    /// `comparison - baseline`
    pub delta: f64,
    /// Percentage change relative to the baseline
    pub percent_change: f64,
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// End-user query
    User,
    /// Assistant answer
    Assistant,
}

impl TurnRole {
    /// String form used when assembling summarizer requests
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single turn of the rolling conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who produced the content
    pub role: TurnRole,
    /// Plain-text content of the turn
    pub content: String,
}

impl ConversationTurn {
    /// Create a user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// Billing API Wire Types
// ============================================================================
// Field names below are the upstream billing API contract, preserved
// bit-for-bit. Amounts arrive as decimal strings, not numbers.

/// Wire-format time period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    /// Inclusive start date, `YYYY-MM-DD`
    #[serde(rename = "Start")]
    pub start: String,
    /// Exclusive end date, `YYYY-MM-DD`
    #[serde(rename = "End")]
    pub end: String,
}

impl TimePeriod {
    /// Build a wire period from a resolved date range
    #[must_use]
    pub fn from_range(range: &DateRange) -> Self {
        Self {
            start: range.start_str(),
            end: range.end_str(),
        }
    }
}

/// A metric amount with its unit, as the billing API emits it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Decimal amount as a string; may be negative for credits
    #[serde(rename = "Amount")]
    pub amount: String,
    /// Unit, typically `USD` for cost metrics
    #[serde(rename = "Unit")]
    pub unit: String,
}

impl MetricValue {
    /// Parse the amount into a float.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` when the billing API emits a non-numeric
    /// amount string.
    pub fn amount_f64(&self) -> AppResult<f64> {
        self.amount
            .parse::<f64>()
            .map_err(|e| AppError::invalid_format(format!("unparseable amount {:?}: {e}", self.amount)))
    }
}

/// One grouped entry inside a time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Dimension values identifying the group (one entry per group-by key)
    #[serde(rename = "Keys", default)]
    pub keys: Vec<String>,
    /// Metric name to amount/unit
    #[serde(rename = "Metrics", default)]
    pub metrics: HashMap<String, MetricValue>,
}

impl Group {
    /// First key, or `Unknown` when the bucket carries none
    #[must_use]
    pub fn primary_key(&self) -> &str {
        self.keys.first().map_or("Unknown", String::as_str)
    }
}

/// One time bucket of a cost-and-usage result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultByTime {
    /// The bucket's period
    #[serde(rename = "TimePeriod")]
    pub time_period: TimePeriod,
    /// Flat totals by metric; empty when the result is grouped
    #[serde(rename = "Total", default)]
    pub total: HashMap<String, MetricValue>,
    /// Grouped entries; empty when the result is ungrouped
    #[serde(rename = "Groups", default)]
    pub groups: Vec<Group>,
    /// Whether the bucket contains estimated (in-progress) data
    #[serde(rename = "Estimated", default)]
    pub estimated: bool,
}

/// Response shape of a cost-and-usage retrieval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostAndUsageResponse {
    /// One entry per time bucket, oldest first
    #[serde(rename = "ResultsByTime", default)]
    pub results_by_time: Vec<ResultByTime>,
}

/// One forecast bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// The bucket's period
    #[serde(rename = "TimePeriod")]
    pub time_period: TimePeriod,
    /// Forecast mean as a decimal string
    #[serde(rename = "MeanValue")]
    pub mean_value: String,
}

impl ForecastResult {
    /// Parse the forecast mean into a float.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` for a non-numeric mean value.
    pub fn mean_f64(&self) -> AppResult<f64> {
        self.mean_value
            .parse::<f64>()
            .map_err(|e| AppError::invalid_format(format!("unparseable forecast mean {:?}: {e}", self.mean_value)))
    }
}

/// Response shape of a cost-forecast retrieval
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResponse {
    /// One entry per forecast bucket
    #[serde(rename = "ForecastResultsByTime", default)]
    pub forecast_results_by_time: Vec<ForecastResult>,
}

/// One dimension value with optional attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValueEntry {
    /// The value itself (service name, region code, ...)
    #[serde(rename = "Value", default)]
    pub value: String,
    /// Free-form attributes attached by the billing source; ordered map
    /// so rendered attribute lines are deterministic
    #[serde(rename = "Attributes", default)]
    pub attributes: BTreeMap<String, String>,
}

/// Response shape of a dimension-values retrieval
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValuesResponse {
    /// All known values for the requested dimension
    #[serde(rename = "DimensionValues", default)]
    pub dimension_values: Vec<DimensionValueEntry>,
}
