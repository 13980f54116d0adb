//! chat-orchestrator CLI — 发送单条消息、健康检查与 token 计数的命令行工具
//!
//! Usage:
//!   chat-orchestrator-cli ask <message> [--config <path>] [--persona <text>]
//!   chat-orchestrator-cli health [--config <path>]
//!   chat-orchestrator-cli count <text> [--tokenizer cl100k|o200k|estimate]

use anyhow::{anyhow, bail, Context};
use chat_orchestrator::facade::prelude::*;
use chat_orchestrator::tokens::{select_counter, TokenizerKind};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_PERSONA: &str = "You are a friendly, helpful conversational assistant.";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "ask" => cmd_ask(&args[2..]).await,
        "health" => cmd_health(&args[2..]).await,
        "count" => cmd_count(&args[2..]),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"chat-orchestrator-cli — 对话编排命令行工具

USAGE:
    chat-orchestrator-cli <COMMAND> [OPTIONS]

COMMANDS:
    ask <message> [--config <path>] [--persona <text>]
                                Send one message through the full pipeline
    health [--config <path>]    Probe the endpoint and print a health report
    count <text> [--tokenizer cl100k|o200k|estimate]
                                Count tokens in text
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    ORCH_CONFIG                 Configuration file (YAML or JSON)
    ORCH_ENDPOINT_URL           Endpoint URL when no file is used
    ORCH_API_KEY                Bearer token for the endpoint
    RUST_LOG                    Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!("chat-orchestrator-cli {}", env!("CARGO_PKG_VERSION"));
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if arg.starts_with("--") {
            skip = true;
            continue;
        }
        return Some(arg.as_str());
    }
    None
}

async fn build_orchestrator(args: &[String]) -> anyhow::Result<Orchestrator> {
    let path = flag_value(args, "--config").map(PathBuf::from);
    let config = ConfigLoader::new()
        .load(path.as_deref())
        .await
        .context("loading backend configuration")?;
    Orchestrator::new(config).context("building orchestrator")
}

async fn cmd_ask(args: &[String]) -> anyhow::Result<()> {
    let message = positional(args).ok_or_else(|| anyhow!("missing <message>"))?;
    let persona = flag_value(args, "--persona").unwrap_or(DEFAULT_PERSONA);
    let orchestrator = build_orchestrator(args).await?;

    let request = ConversationRequest::new(persona, message);
    let (result, stats) = orchestrator.generate_with_stats(&request).await;
    match result {
        GenerationResult::Success { text } => {
            println!("{text}");
            eprintln!(
                "[{} attempt(s), {} ms, {} prompt tokens]",
                stats.attempts, stats.duration_ms, stats.prompt_tokens
            );
            Ok(())
        }
        GenerationResult::Failure { kind, message } => {
            bail!("{} ({}): {}", kind.name(), kind.code(), message)
        }
    }
}

async fn cmd_health(args: &[String]) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(args).await?;
    let report = orchestrator.health_check().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_healthy() {
        bail!("endpoint is not responsive");
    }
    Ok(())
}

fn cmd_count(args: &[String]) -> anyhow::Result<()> {
    let text = positional(args).ok_or_else(|| anyhow!("missing <text>"))?;
    let kind = match flag_value(args, "--tokenizer") {
        Some(raw) => TokenizerKind::parse(raw)
            .ok_or_else(|| anyhow!("unknown tokenizer '{raw}' (cl100k, o200k, estimate)"))?,
        None => TokenizerKind::default(),
    };
    let counter = select_counter(kind);
    println!("{} ({})", counter.count(text), counter.name());
    Ok(())
}
