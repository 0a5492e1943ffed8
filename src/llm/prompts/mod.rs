// ABOUTME: System prompts for summarizer interactions loaded at compile time
// ABOUTME: Provides the cost-analyst persona prompt used for every conversation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy
//! maintenance. The cost-analyst prompt fixes the persona, the formatting
//! rules, and the no-redirect policy (answers come from the retrieved
//! data, never from pointers to external consoles).

/// Cost-analyst assistant system prompt
pub const COST_ANALYST_SYSTEM_PROMPT: &str = include_str!("cost_analyst_system.md");

/// Get the system prompt for the cost-analyst assistant
///
/// This is the default system prompt used when starting a new
/// conversation.
#[must_use]
pub const fn cost_analyst_system_prompt() -> &'static str {
    COST_ANALYST_SYSTEM_PROMPT
}
