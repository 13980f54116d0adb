//! 后端配置层：推理端点、协议变体、采样参数与运行时限制。
//!
//! # Backend Configuration Layer
//!
//! Everything the orchestrator needs to know about the inference endpoint is
//! declared here and loaded once at process start. Nothing in the pipeline
//! hardcodes a provider; the protocol variant, sampling parameters, limits and
//! chat template all come from a [`BackendConfig`].
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | `BackendConfig` and its nested sections with deployment defaults |
//! | [`loader`] | YAML/JSON file loading plus `ORCH_*` environment overrides |
//! | [`error`] | Configuration error types with actionable hints |
//!
//! ## Example
//!
//! ```rust
//! use chat_orchestrator::protocol::{BackendConfig, ProtocolVariant};
//!
//! let config = BackendConfig::new("http://localhost:8080/v1/chat/completions");
//! assert_eq!(config.variant(), ProtocolVariant::ChatCompletions);
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod error;
pub mod loader;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire protocol spoken by the inference endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    /// OpenAI-compatible `messages` array of role/content turns.
    ChatCompletions,
    /// Single prompt string with role markers (`inputs` + `parameters`).
    TextGeneration,
}

impl ProtocolVariant {
    /// Guess the variant from the endpoint URL and model name.
    ///
    /// OpenAI-compatible servers are recognised by their chat path or by a
    /// GGUF model name; anything else is treated as a text-generation endpoint.
    pub fn detect(endpoint_url: &str, model_name: Option<&str>) -> Self {
        let url = endpoint_url.to_ascii_lowercase();
        let model = model_name.unwrap_or_default().to_ascii_lowercase();
        if url.contains("/v1/chat/completions")
            || url.contains("gguf")
            || model.contains(".gguf")
            || model.contains("-gguf")
        {
            ProtocolVariant::ChatCompletions
        } else {
            ProtocolVariant::TextGeneration
        }
    }

    /// Path appended to a bare endpoint URL.
    pub fn default_path(&self) -> &'static str {
        match self {
            ProtocolVariant::ChatCompletions => "/v1/chat/completions",
            ProtocolVariant::TextGeneration => "",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVariant::ChatCompletions => "chat_completions",
            ProtocolVariant::TextGeneration => "text_generation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "chat_completions" | "chat" | "openai" | "structured" => {
                Some(ProtocolVariant::ChatCompletions)
            }
            "text_generation" | "completion" | "tgi" | "raw" => {
                Some(ProtocolVariant::TextGeneration)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_openai_compatible_endpoints() {
        assert_eq!(
            ProtocolVariant::detect("https://x.endpoints.cloud/v1/chat/completions", None),
            ProtocolVariant::ChatCompletions
        );
        assert_eq!(
            ProtocolVariant::detect("https://x.endpoints.cloud", Some("mistral-7b-instruct-GGUF")),
            ProtocolVariant::ChatCompletions
        );
        assert_eq!(
            ProtocolVariant::detect("https://x.endpoints.cloud", Some("qwen2.5")),
            ProtocolVariant::TextGeneration
        );
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(ProtocolVariant::parse("TGI"), Some(ProtocolVariant::TextGeneration));
        assert_eq!(
            ProtocolVariant::parse("chat-completions"),
            Some(ProtocolVariant::ChatCompletions)
        );
        assert_eq!(ProtocolVariant::parse("grpc"), None);
    }
}
