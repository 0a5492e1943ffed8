// ABOUTME: Interactive chat shell for the Costwise cloud cost assistant
// ABOUTME: Wires configuration, logging, provider selection and the stdin conversation loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Interactive assistant binary
//!
//! Reads queries line-by-line from stdin and prints the assistant's
//! answers. Presentation only; every decision lives in the library.

use anyhow::{bail, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use costwise::chat::CostAssistant;
use costwise::config::{AssistantConfig, BillingProviderMode};
use costwise::gateway::CostDataGateway;
use costwise::llm::{AnthropicProvider, LlmProvider};
use costwise::logging;
use costwise::providers::{BillingProvider, HttpBillingProvider, SyntheticBillingProvider};

const WELCOME: &str = "\
💰 Costwise - AWS 비용 분석 어시스턴트

질문 예시:
  - 이번 달 AWS 비용이 얼마나 나왔나요?
  - 지난 3개월간 서비스별 비용을 보여주세요
  - 왜 비용이 늘었는지 원인을 분석해주세요
  - 어떤 AWS 서비스들을 사용하고 있나요?

종료하려면 'exit' 을 입력하세요.
";

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "costwise-assistant", about = "Conversational cloud cost assistant")]
struct Args {
    /// Billing provider override: http or synthetic
    #[arg(long, value_name = "MODE")]
    billing_provider: Option<String>,

    /// Skip summarization and answer with the formatted retrieval result
    #[arg(long)]
    retrieval_only: bool,

    /// Override the retained-history cap
    #[arg(long, value_name = "N")]
    history_cap: Option<usize>,
}

fn select_billing_provider(
    config: &AssistantConfig,
    override_mode: Option<&str>,
) -> Result<Arc<dyn BillingProvider>> {
    let mode = match override_mode {
        Some("http") => BillingProviderMode::Http,
        Some("synthetic") => BillingProviderMode::Synthetic,
        Some(other) => bail!("unknown billing provider {other:?} (expected http or synthetic)"),
        None => config.billing.mode,
    };
    match mode {
        BillingProviderMode::Http => {
            let Some(endpoint) = config.billing.endpoint.clone() else {
                bail!("http billing mode requires COSTWISE_BILLING_ENDPOINT");
            };
            Ok(Arc::new(HttpBillingProvider::new(
                endpoint,
                config.billing.token.clone(),
            )))
        }
        BillingProviderMode::Synthetic => Ok(Arc::new(SyntheticBillingProvider::demo(
            chrono::Local::now().date_naive(),
        ))),
    }
}

fn select_summarizer(
    config: &AssistantConfig,
    retrieval_only: bool,
) -> Result<Option<Arc<dyn LlmProvider>>> {
    if retrieval_only {
        return Ok(None);
    }
    if !config.summarizer_available() {
        info!("ANTHROPIC_API_KEY not set, running in retrieval-only mode");
        return Ok(None);
    }
    let provider = AnthropicProvider::from_env()?;
    info!(model = provider.default_model(), "summarizer ready");
    Ok(Some(Arc::new(provider)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AssistantConfig::from_env();
    logging::init(config.log_level);

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("configuration issue: {issue}");
        }
        bail!("invalid configuration");
    }

    let provider = select_billing_provider(&config, args.billing_provider.as_deref())?;
    info!(provider = provider.name(), "billing provider selected");
    let summarizer = select_summarizer(&config, args.retrieval_only)?;

    let gateway = CostDataGateway::new(provider);
    let mut assistant = CostAssistant::new(gateway, summarizer)
        .with_history_cap(args.history_cap.unwrap_or(config.chat.history_cap));

    let mut stdout = tokio::io::stdout();
    stdout.write_all(WELCOME.as_bytes()).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all("\n💬 > ".as_bytes()).await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit" | "종료") {
            break;
        }
        let answer = assistant.respond(query).await;
        stdout.write_all(answer.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    Ok(())
}
