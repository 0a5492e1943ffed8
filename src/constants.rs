// ABOUTME: System-wide constants organized by domain for the Costwise assistant
// ABOUTME: Contains environment variable names, default lookback windows, and rendering limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants module
//!
//! Application constants grouped by domain. Values that callers may tune at
//! runtime live in `env_vars` and are read through `config::environment`;
//! everything else is a fixed contract of the retrieval/rendering pipeline.

/// Environment variable names recognized by `AssistantConfig::from_env`
pub mod env_vars {
    /// Billing API endpoint (Cost Explorer compatible)
    pub const BILLING_ENDPOINT: &str = "COSTWISE_BILLING_ENDPOINT";
    /// Billing API region
    pub const BILLING_REGION: &str = "COSTWISE_BILLING_REGION";
    /// Static bearer token for the billing endpoint
    pub const BILLING_TOKEN: &str = "COSTWISE_BILLING_TOKEN";
    /// Anthropic API key for the summarizer
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    /// Summarizer model identifier
    pub const SUMMARIZER_MODEL: &str = "COSTWISE_SUMMARIZER_MODEL";
    /// Maximum retained conversation turns
    pub const HISTORY_CAP: &str = "COSTWISE_HISTORY_CAP";
    /// Log level (error|warn|info|debug|trace)
    pub const LOG_LEVEL: &str = "COSTWISE_LOG_LEVEL";
}

/// Default values applied when the environment leaves a setting unset
pub mod defaults {
    /// Billing API region
    pub const BILLING_REGION: &str = "us-east-1";
    /// Summarizer model identifier
    pub const SUMMARIZER_MODEL: &str = "claude-3-5-sonnet-20241022";
    /// Anthropic Messages API base URL
    pub const SUMMARIZER_BASE_URL: &str = "https://api.anthropic.com";
    /// Token budget for a single summary
    pub const SUMMARIZER_MAX_TOKENS: u32 = 2000;
    /// Sampling temperature for summaries
    pub const SUMMARIZER_TEMPERATURE: f32 = 0.1;
    /// Maximum retained conversation turns
    pub const HISTORY_CAP: usize = 10;
    /// Prior turns forwarded to the summarizer as context
    pub const CONTEXT_TURNS: usize = 5;
}

/// Default retrieval windows, in months unless noted
pub mod windows {
    /// `get_service_costs` lookback
    pub const SERVICE_MONTHS_BACK: u32 = 3;
    /// `get_regional_costs` lookback
    pub const REGION_MONTHS_BACK: u32 = 1;
    /// `get_cost_forecast` horizon
    pub const FORECAST_MONTHS_AHEAD: u32 = 3;
    /// `get_cost_and_usage` lookback when no explicit range is given
    pub const DETAIL_MONTHS_BACK: u32 = 2;
    /// `get_dimension_values` lookback, in days
    pub const DIMENSION_LOOKBACK_DAYS: i64 = 90;
}

/// Rendering limits. These counts are part of the output contract and are
/// asserted by the formatter tests; do not change them casually.
pub mod limits {
    /// Ranked entries shown per bucket in service breakdowns
    pub const SERVICE_BREAKDOWN: usize = 10;
    /// Ranked entries shown per bucket in detail (cost-and-usage) breakdowns
    pub const DETAIL_BREAKDOWN: usize = 15;
    /// Entries shown in dimension-value listings
    pub const DIMENSION_VALUES: usize = 20;
    /// Rows shown in comparison / driver sections
    pub const COMPARISON_ROWS: usize = 10;
    /// Deltas at or below this magnitude are suppressed from driver views
    pub const COMPARISON_NOISE_THRESHOLD: f64 = 0.01;
}
