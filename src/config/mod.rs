// ABOUTME: Configuration module root for the Costwise assistant
// ABOUTME: Re-exports the environment-based configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration management
//!
//! All configuration is environment-variable driven; there are no config
//! files. See [`environment`] for the variable set and defaults.

pub mod environment;

pub use environment::{AssistantConfig, BillingProviderMode, LogLevel};
