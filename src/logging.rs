// ABOUTME: Tracing subscriber initialization for the assistant binary
// ABOUTME: Wires env-filter plus a compact fmt layer from the configured log level
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Logging initialization
//!
//! `RUST_LOG` takes precedence when set; otherwise the configured level
//! applies crate-wide. Initialization is idempotent - a second call (as
//! happens across tests) is a no-op.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogLevel;

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; subsequent calls are ignored.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}
