// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into the typed AssistantConfig with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Environment-based configuration management
//!
//! `AssistantConfig::from_env()` reads the `COSTWISE_*` variables (and
//! `ANTHROPIC_API_KEY`), applies the defaults from [`crate::constants`],
//! and `validate()` reports configuration issues without aborting - a
//! missing summarizer key, for example, only demotes the assistant to
//! retrieval-only mode.

use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

use crate::constants::{defaults, env_vars};

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational and above
    #[default]
    Info,
    /// Debug and above
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback to `Info`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Which billing provider implementation to wire up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingProviderMode {
    /// CE-compatible HTTP endpoint
    Http,
    /// In-memory synthetic fixtures
    Synthetic,
}

/// Billing source settings
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Provider selection; `Http` requires an endpoint
    pub mode: BillingProviderMode,
    /// CE-compatible endpoint URL
    pub endpoint: Option<Url>,
    /// Billing API region label (informational)
    pub region: String,
    /// Static bearer token for the endpoint
    pub token: Option<String>,
}

/// Summarizer settings
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Anthropic API key; absent means retrieval-only mode
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
}

/// Conversation settings
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Maximum retained conversation turns
    pub history_cap: usize,
}

/// Complete runtime configuration of the assistant
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Log verbosity
    pub log_level: LogLevel,
    /// Billing source settings
    pub billing: BillingConfig,
    /// Summarizer settings
    pub summarizer: SummarizerConfig,
    /// Conversation settings
    pub chat: ChatConfig,
}

impl AssistantConfig {
    /// Load configuration from the environment, applying defaults for
    /// anything unset. Never fails; call [`Self::validate`] for issues.
    #[must_use]
    pub fn from_env() -> Self {
        let endpoint = env::var(env_vars::BILLING_ENDPOINT)
            .ok()
            .and_then(|raw| Url::parse(&raw).ok());
        let mode = if endpoint.is_some() {
            BillingProviderMode::Http
        } else {
            BillingProviderMode::Synthetic
        };

        Self {
            log_level: env::var(env_vars::LOG_LEVEL)
                .map(|raw| LogLevel::from_str_or_default(&raw))
                .unwrap_or_default(),
            billing: BillingConfig {
                mode,
                endpoint,
                region: env::var(env_vars::BILLING_REGION)
                    .unwrap_or_else(|_| defaults::BILLING_REGION.to_owned()),
                token: env::var(env_vars::BILLING_TOKEN).ok(),
            },
            summarizer: SummarizerConfig {
                api_key: env::var(env_vars::ANTHROPIC_API_KEY).ok(),
                model: env::var(env_vars::SUMMARIZER_MODEL)
                    .unwrap_or_else(|_| defaults::SUMMARIZER_MODEL.to_owned()),
            },
            chat: ChatConfig {
                history_cap: env::var(env_vars::HISTORY_CAP)
                    .ok()
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(defaults::HISTORY_CAP),
            },
        }
    }

    /// Validate the configuration, returning human-readable issues.
    /// An empty result means the assistant can run as configured.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.billing.mode == BillingProviderMode::Http && self.billing.endpoint.is_none() {
            issues.push(format!(
                "HTTP billing mode requires {} to be set",
                env_vars::BILLING_ENDPOINT
            ));
        }
        if self.chat.history_cap == 0 {
            issues.push(format!(
                "{} must be at least 1",
                env_vars::HISTORY_CAP
            ));
        }
        if self.summarizer.model.trim().is_empty() {
            issues.push(format!("{} must not be empty", env_vars::SUMMARIZER_MODEL));
        }
        issues
    }

    /// Whether a summarizer can be constructed from this configuration
    #[must_use]
    pub const fn summarizer_available(&self) -> bool {
        self.summarizer.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            env_vars::BILLING_ENDPOINT,
            env_vars::BILLING_REGION,
            env_vars::BILLING_TOKEN,
            env_vars::ANTHROPIC_API_KEY,
            env_vars::SUMMARIZER_MODEL,
            env_vars::HISTORY_CAP,
            env_vars::LOG_LEVEL,
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_environment() {
        clear_env();
        let config = AssistantConfig::from_env();
        assert_eq!(config.billing.mode, BillingProviderMode::Synthetic);
        assert_eq!(config.billing.region, defaults::BILLING_REGION);
        assert_eq!(config.chat.history_cap, defaults::HISTORY_CAP);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.summarizer_available());
        assert!(config.validate().is_empty());
    }

    #[test]
    #[serial]
    fn test_endpoint_enables_http_mode() {
        clear_env();
        std::env::set_var(env_vars::BILLING_ENDPOINT, "https://billing.example.com/ce");
        std::env::set_var(env_vars::HISTORY_CAP, "24");
        let config = AssistantConfig::from_env();
        assert_eq!(config.billing.mode, BillingProviderMode::Http);
        assert_eq!(config.chat.history_cap, 24);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_log_level_parsing() {
        clear_env();
        std::env::set_var(env_vars::LOG_LEVEL, "debug");
        let config = AssistantConfig::from_env();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_level.to_tracing_level(), tracing::Level::DEBUG);
        clear_env();
    }
}
