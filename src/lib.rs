// ABOUTME: Main library entry point for the Costwise cloud cost assistant
// ABOUTME: Routes billing questions to retrieval operations and summarizes results with an LLM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Costwise
//!
//! A conversational cloud cost assistant: natural-language billing
//! questions are routed to one of nine fixed retrieval operations,
//! executed against a Cost Explorer compatible billing source, rendered
//! into fixed-format text blocks, and summarized into prose by a language
//! model.
//!
//! ## Architecture
//!
//! The pipeline is a strictly sequential chain per query:
//!
//! - **`routing`**: ordered keyword rules classify the query into an
//!   operation plus structured arguments
//! - **`calendar`**: canonical date windows from a reference date
//! - **`gateway`**: the nine retrieval operations behind one boundary;
//!   defaults and failure-to-text conversion live here
//! - **`providers`**: the billing source SPI (HTTP and synthetic)
//! - **`comparison`**: per-dimension delta ranking between two periods
//! - **`formatters`**: fixed-marker text rendering of retrieval results
//! - **`llm`**: the summarizer SPI and the Anthropic provider
//! - **`chat`**: the conversation orchestrator and its bounded history
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use costwise::chat::CostAssistant;
//! use costwise::gateway::CostDataGateway;
//! use costwise::providers::SyntheticBillingProvider;
//!
//! #[tokio::main]
//! async fn main() {
//!     let today = chrono::Local::now().date_naive();
//!     let provider = Arc::new(SyntheticBillingProvider::demo(today));
//!     let gateway = CostDataGateway::new(provider);
//!     let mut assistant = CostAssistant::new(gateway, None);
//!     let answer = assistant.respond("이번 달 AWS 비용이 얼마나 나왔나요?").await;
//!     println!("{answer}");
//! }
//! ```

/// Canonical date-range resolution for billing retrievals
pub mod calendar;

/// Conversation orchestration and rolling history
pub mod chat;

/// Per-dimension cost delta ranking between two periods
pub mod comparison;

/// Environment-based configuration management
pub mod config;

/// System-wide constants organized by domain
pub mod constants;

/// Unified error handling system
pub mod errors;

/// Fixed-marker text rendering of retrieval results
pub mod formatters;

/// The nine retrieval operations behind one boundary
pub mod gateway;

/// Summarizer provider abstraction and implementations
pub mod llm;

/// Logging initialization
pub mod logging;

/// Core data models and billing wire types
pub mod models;

/// Billing provider SPI and implementations
pub mod providers;

/// Intent routing from free-text queries to operations
pub mod routing;
