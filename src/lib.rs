//! # chat-orchestrator
//!
//! 对话上下文窗口与请求编排：把不断增长的对话可靠地转换为一次有界的 LLM 推理请求。
//!
//! Context window selection and rate-gated request orchestration for chat
//! backends that call a remotely hosted, stateless LLM inference endpoint.
//!
//! ## Overview
//!
//! A conversation grows without bound; the model's context window does not.
//! This library turns `system preamble + history + new message` into one
//! bounded request, sends it under a process-wide concurrency and rate gate,
//! retries network failures with backoff, and returns either clean reply text
//! or a typed failure.
//!
//! ## Pipeline
//!
//! 1. **Token counting** ([`tokens`]): BPE tokenizer with a character-estimate fallback
//! 2. **Context window** ([`context`]): newest-first history selection within the token budget
//! 3. **Prompt assembly** ([`prompt`]): structured turns or a single marker-delimited string
//! 4. **Dispatch** ([`client`], [`resilience`], [`transport`]): gate, timeout, retry, classification
//! 5. **Normalization** ([`response`]): extraction, marker stripping, placeholder, length cap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chat_orchestrator::{BackendConfig, ConversationRequest, Orchestrator, Turn};
//!
//! #[tokio::main]
//! async fn main() -> chat_orchestrator::Result<()> {
//!     let orchestrator = Orchestrator::new(BackendConfig::new(
//!         "https://my-endpoint.example.com/v1/chat/completions",
//!     ))?;
//!
//!     let request = ConversationRequest::new("You are a friendly assistant.", "How are you?")
//!         .with_history(vec![Turn::user("Hi!"), Turn::assistant("Hello there.")]);
//!
//!     match orchestrator.generate(&request).await.into_result() {
//!         Ok(text) => println!("{}", text),
//!         Err(failure) => eprintln!("{} ({})", failure, failure.kind.code()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Backend configuration, protocol variants and loading |
//! | [`client`] | Orchestrator, builder, call statistics and health check |
//! | [`context`] | Token budget and history selection |
//! | [`prompt`] | Prompt assemblers and chat templates |
//! | [`response`] | Response extraction and sanitization |
//! | [`resilience`] | Admission gate, retry policy and clocks |
//! | [`transport`] | HTTP transport |
//! | [`tokens`] | Token counting strategies |
//! | [`types`] | Turns, requests and results |
//! | [`facade`] | Collaborator ports and a reference conversation service |

pub mod client;
pub mod context;
pub mod error_kind;
pub mod facade;
pub mod prompt;
pub mod protocol;
pub mod resilience;
pub mod response;
pub mod tokens;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{CallStats, HealthReport, Orchestrator, OrchestratorBuilder, SignalsSnapshot};
pub use error_kind::ErrorKind;
pub use protocol::{BackendConfig, ConfigLoader, ProtocolVariant};
pub use types::{ConversationRequest, GenerationFailure, GenerationResult, Role, Turn};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
