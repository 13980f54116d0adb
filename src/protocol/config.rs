//! Backend configuration structures
//!
//! Loaded once at process start and immutable afterwards. Every field except
//! `endpoint_url` has a default matching the production deployment.

use super::{ConfigError, ProtocolVariant};
use crate::context::TokenBudget;
use crate::prompt::ChatTemplate;
use crate::tokens::TokenizerKind;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Keyring service name used for API key lookup.
pub const KEYRING_SERVICE: &str = "chat-orchestrator";

/// Static configuration of the inference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub endpoint_url: String,
    /// Overrides the variant's default path (e.g. `/generate`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Detected from the endpoint when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_variant: Option<ProtocolVariant>,
    #[serde(default)]
    pub sampling: SamplingParameters,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// `0` disables pacing.
    #[serde(default = "default_max_rps")]
    pub max_requests_per_second: f64,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub response: ResponseConfig,
    #[serde(default)]
    pub template: ChatTemplate,
    #[serde(default)]
    pub tokenizer: TokenizerKind,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_concurrent() -> usize {
    5
}

fn default_max_rps() -> f64 {
    5.0
}

/// Sampling parameters forwarded verbatim to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParameters {
    /// Also the number of tokens reserved for the response.
    pub max_response_tokens: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub repetition_penalty: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub no_repeat_ngram_size: u32,
    pub do_sample: bool,
    pub min_p: f64,
}

impl Default for SamplingParameters {
    fn default() -> Self {
        Self {
            max_response_tokens: 512,
            temperature: 1.2,
            top_p: 0.75,
            top_k: 80,
            repetition_penalty: 1.25,
            frequency_penalty: 0.6,
            presence_penalty: 0.4,
            no_repeat_ngram_size: 4,
            do_sample: true,
            min_p: 0.02,
        }
    }
}

/// Exponential backoff between network retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub multiplier: f64,
    pub max_ms: u64,
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 1_000,
            multiplier: 2.0,
            max_ms: 10_000,
            jitter: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub context_window_capacity: usize,
    pub reserved_safety_margin: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            context_window_capacity: 8_000,
            reserved_safety_margin: 100,
        }
    }
}

/// Output normalization limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub max_output_chars: usize,
    pub truncation_marker: String,
    /// Returned instead of an empty generation.
    pub placeholder: String,
}

pub const DEFAULT_PLACEHOLDER: &str = "Hey there! 😊 What's on your mind?";

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            max_output_chars: 2_000,
            truncation_marker: "...".to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl BackendConfig {
    /// Configuration with every default applied.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            request_path: None,
            model_name: None,
            api_key: None,
            protocol_variant: None,
            sampling: SamplingParameters::default(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            backoff: BackoffConfig::default(),
            max_concurrent_requests: default_max_concurrent(),
            max_requests_per_second: default_max_rps(),
            context: ContextConfig::default(),
            response: ResponseConfig::default(),
            template: ChatTemplate::default(),
            tokenizer: TokenizerKind::default(),
        }
    }

    pub fn with_protocol_variant(mut self, variant: ProtocolVariant) -> Self {
        self.protocol_variant = Some(variant);
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    /// Explicit variant, or the one detected from the endpoint.
    pub fn variant(&self) -> ProtocolVariant {
        self.protocol_variant.unwrap_or_else(|| {
            ProtocolVariant::detect(&self.endpoint_url, self.model_name.as_deref())
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Minimum spacing between dispatches; zero when pacing is disabled.
    pub fn min_dispatch_interval(&self) -> Duration {
        crate::resilience::dispatch_interval(self.max_requests_per_second).unwrap_or_default()
    }

    pub fn token_budget(&self) -> TokenBudget {
        TokenBudget::new(
            self.context.context_window_capacity,
            self.sampling.max_response_tokens,
            self.context.reserved_safety_margin,
        )
    }

    /// Full URL of the generation request.
    pub fn request_url(&self) -> String {
        let base = self.endpoint_url.trim_end_matches('/');
        let path = match self.request_path.as_deref() {
            Some(p) => p,
            None => {
                let default = self.variant().default_path();
                if base.ends_with(default) {
                    ""
                } else {
                    default
                }
            }
        };
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Model name sent in structured requests.
    pub fn request_model(&self) -> &str {
        self.model_name.as_deref().unwrap_or("tgi")
    }

    /// API key from config, then `ORCH_API_KEY`, then the OS keyring.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        if let Some(key) = std::env::var("ORCH_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
        {
            return Some(key);
        }
        let account = url::Url::parse(&self.endpoint_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "default".to_string());
        keyring::Entry::new(KEYRING_SERVICE, &account)
            .ok()
            .and_then(|entry| entry.get_password().ok())
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.endpoint_url).map_err(|e| {
            invalid("endpoint_url", &self.endpoint_url, format!("not a valid URL: {}", e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(
                "endpoint_url",
                &self.endpoint_url,
                "only http and https endpoints are supported",
            ));
        }
        if self.context.context_window_capacity == 0 {
            return Err(invalid(
                "context.context_window_capacity",
                "0",
                "must be positive",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(invalid("timeout_ms", "0", "must be positive"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(invalid(
                "max_concurrent_requests",
                "0",
                "at least one request slot is required",
            ));
        }
        let rps = self.max_requests_per_second;
        if !rps.is_finite() || rps < 0.0 {
            return Err(invalid(
                "max_requests_per_second",
                &rps.to_string(),
                "must be a finite, non-negative number (0 disables pacing)",
            ));
        }
        if rps > 0.0 && crate::resilience::dispatch_interval(rps).is_none() {
            return Err(invalid(
                "max_requests_per_second",
                &rps.to_string(),
                "too small: at least one request per day is required (0 disables pacing)",
            ));
        }
        if !self.backoff.multiplier.is_finite() || self.backoff.multiplier < 1.0 {
            return Err(invalid(
                "backoff.multiplier",
                &self.backoff.multiplier.to_string(),
                "must be at least 1.0",
            ));
        }
        if self.backoff.max_ms < self.backoff.base_ms {
            return Err(invalid(
                "backoff.max_ms",
                &self.backoff.max_ms.to_string(),
                "must not be smaller than backoff.base_ms",
            ));
        }
        let marker = &self.response.truncation_marker;
        if marker.is_empty() || marker.trim() != marker.as_str() {
            return Err(invalid(
                "response.truncation_marker",
                marker,
                "must be non-empty without leading or trailing whitespace",
            ));
        }
        let marker_len = marker.chars().count();
        if self.response.max_output_chars <= marker_len {
            return Err(invalid(
                "response.max_output_chars",
                &self.response.max_output_chars.to_string(),
                "must be longer than the truncation marker",
            ));
        }
        if self.response.placeholder.trim().is_empty() {
            return Err(invalid(
                "response.placeholder",
                "",
                "the placeholder must not be blank",
            ));
        }
        if self.response.placeholder.chars().count() > self.response.max_output_chars {
            return Err(invalid(
                "response.placeholder",
                &self.response.placeholder,
                "must fit within response.max_output_chars",
            ));
        }
        if self.template.open.is_empty() || self.template.close.is_empty() {
            return Err(invalid(
                "template",
                "",
                "open and close markers must not be empty",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str, hint: impl Into<String>) -> crate::Error {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        hint: None,
    }
    .with_hint(hint)
    .into()
}
