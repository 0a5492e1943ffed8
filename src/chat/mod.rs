// ABOUTME: Conversation orchestrator tying routing, retrieval, formatting and summarization
// ABOUTME: Owns the bounded rolling history and the Idle/Processing turn state machine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Conversation Orchestration
//!
//! [`CostAssistant`] drives one conversation: classify the query, execute
//! the retrieval through the gateway, assemble the summarizer prompt, and
//! append the user/assistant turn pair to a bounded FIFO history.
//!
//! The pipeline is strictly sequential - each stage's output is the next
//! stage's only input - and runs one query at a time per assistant
//! instance. There is no cancellation and no retry: a failed stage is
//! reported once as a localized assistant turn, and the state machine
//! returns to `Idle` on every path.

use chrono::{Local, NaiveDateTime};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, warn};

use crate::constants::defaults;
use crate::gateway::CostDataGateway;
use crate::llm::{cost_analyst_system_prompt, ChatMessage, ChatRequest, LlmProvider};
use crate::models::{ConversationTurn, TurnRole};
use crate::routing;

/// Turn-processing state of one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantState {
    /// Waiting for a query
    Idle,
    /// A query's pipeline is in flight
    Processing,
}

/// One conversation: router -> gateway -> formatter -> summarizer, with a
/// bounded rolling history owned by the instance.
pub struct CostAssistant {
    gateway: CostDataGateway,
    summarizer: Option<Arc<dyn LlmProvider>>,
    history: VecDeque<ConversationTurn>,
    history_cap: usize,
    context_turns: usize,
    state: AssistantState,
}

impl CostAssistant {
    /// Create an assistant over the given gateway. Without a summarizer
    /// the formatted retrieval result itself becomes the answer
    /// (retrieval-only mode).
    #[must_use]
    pub fn new(gateway: CostDataGateway, summarizer: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            gateway,
            summarizer,
            history: VecDeque::new(),
            history_cap: defaults::HISTORY_CAP,
            context_turns: defaults::CONTEXT_TURNS,
            state: AssistantState::Idle,
        }
    }

    /// Override the retained-history cap
    #[must_use]
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self.evict_overflow();
        self
    }

    /// Override how many prior turns are forwarded to the summarizer
    #[must_use]
    pub const fn with_context_turns(mut self, turns: usize) -> Self {
        self.context_turns = turns;
        self
    }

    /// Current turn-processing state
    #[must_use]
    pub const fn state(&self) -> AssistantState {
        self.state
    }

    /// The retained conversation turns, oldest first
    #[must_use]
    pub const fn history(&self) -> &VecDeque<ConversationTurn> {
        &self.history
    }

    /// Answer a query against the wall clock
    pub async fn respond(&mut self, query: &str) -> String {
        self.respond_at(query, Local::now().naive_local()).await
    }

    /// Answer a query against an explicit reference time. Identical
    /// `(query, now)` inputs route identically; tests pin `now` to get
    /// reproducible date arguments.
    pub async fn respond_at(&mut self, query: &str, now: NaiveDateTime) -> String {
        self.state = AssistantState::Processing;

        let intent = routing::classify(query, now.date());
        info!(operation = %intent.operation, "processing query");
        let retrieval = self.gateway.dispatch(&intent, now).await;

        self.push_turn(ConversationTurn::user(query));
        let answer = match &self.summarizer {
            Some(provider) => self.summarize(provider.clone(), query, &retrieval).await,
            None => retrieval,
        };
        self.push_turn(ConversationTurn::assistant(answer.clone()));

        self.state = AssistantState::Idle;
        answer
    }

    /// Submit the retrieval result for summarization; failures yield the
    /// localized fallback answer instead of propagating.
    async fn summarize(
        &self,
        provider: Arc<dyn LlmProvider>,
        query: &str,
        retrieval: &str,
    ) -> String {
        let request = ChatRequest::new(self.prompt_messages(query, retrieval))
            .with_max_tokens(defaults::SUMMARIZER_MAX_TOKENS)
            .with_temperature(defaults::SUMMARIZER_TEMPERATURE);
        match provider.complete(&request).await {
            Ok(response) => response.content,
            Err(error) => {
                warn!(%error, "summarization failed");
                format!("죄송합니다. 응답 생성 중 오류가 발생했습니다: {error}")
            }
        }
    }

    /// Assemble the summarizer conversation: system prompt, the trailing
    /// window of prior turns (the just-appended user turn included), and
    /// the current retrieval result framed as the final user message.
    fn prompt_messages(&self, query: &str, retrieval: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(cost_analyst_system_prompt())];
        let skip = self.history.len().saturating_sub(self.context_turns);
        for turn in self.history.iter().skip(skip) {
            let message = match turn.role {
                TurnRole::User => ChatMessage::user(turn.content.clone()),
                TurnRole::Assistant => ChatMessage::assistant(turn.content.clone()),
            };
            messages.push(message);
        }
        messages.push(ChatMessage::user(format!(
            "사용자 질문: {query}\n\n실제 AWS 비용 데이터 (비용 API에서 실시간 조회):\n{retrieval}\n\n위 실제 데이터를 바탕으로 사용자의 질문에 답변해주세요. 다른 페이지나 콘솔을 안내하지 말고, 제공된 데이터로 직접 분석하고 답변해주세요."
        )));
        messages
    }

    /// Append a turn and evict the oldest past the cap (FIFO by age)
    fn push_turn(&mut self, turn: ConversationTurn) {
        self.history.push_back(turn);
        self.evict_overflow();
    }

    fn evict_overflow(&mut self) {
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }
    }
}
