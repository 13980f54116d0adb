//! Configuration loader: YAML/JSON files plus `ORCH_*` environment overrides

use super::{BackendConfig, ConfigError, ProtocolVariant};
use crate::Result;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "ORCH_CONFIG";

/// Loads [`BackendConfig`] once at process start.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader {
    skip_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore `ORCH_*` overrides (tests, reproducible runs).
    pub fn without_env_overrides(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load from `path` if given, else from `ORCH_CONFIG`, else purely from env.
    /// The result is validated.
    pub async fn load(&self, path: Option<&Path>) -> Result<BackendConfig> {
        let from_env_path = std::env::var(CONFIG_PATH_ENV).ok();
        let path = path.or_else(|| from_env_path.as_deref().map(Path::new));
        let config = match path {
            Some(p) => self.load_from_file(p).await?,
            None => Self::from_lookup(env_lookup)?,
        };
        config.validate()?;
        info!(
            endpoint = %config.endpoint_url,
            variant = %config.variant(),
            max_concurrent = config.max_concurrent_requests,
            max_rps = config.max_requests_per_second,
            "backend configuration loaded"
        );
        Ok(config)
    }

    /// Read a YAML or JSON file; `ORCH_*` overrides are applied on top.
    pub async fn load_from_file(&self, path: impl AsRef<Path>) -> Result<BackendConfig> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| {
            ConfigError::LoadError {
                path: path.display().to_string(),
                reason: e.to_string(),
                hint: None,
            }
            .with_hint("Check that the file exists and is readable, or set ORCH_CONFIG")
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let config = if is_json {
            Self::parse_json(&content)?
        } else {
            Self::parse_yaml(&content)?
        };
        debug!(path = %path.display(), "configuration file parsed");

        if self.skip_env {
            Ok(config)
        } else {
            apply_overrides(config, env_lookup)
        }
    }

    pub fn parse_yaml(content: &[u8]) -> Result<BackendConfig> {
        serde_yaml::from_slice(content)
            .map_err(|e| ConfigError::YamlError(e.to_string()).into())
    }

    pub fn parse_json(content: &[u8]) -> Result<BackendConfig> {
        serde_json::from_slice(content)
            .map_err(|e| ConfigError::JsonError(e.to_string()).into())
    }

    /// Build from environment variables only; `ORCH_ENDPOINT_URL` is required.
    pub fn from_env() -> Result<BackendConfig> {
        Self::from_lookup(env_lookup)
    }

    pub fn apply_env_overrides(config: BackendConfig) -> Result<BackendConfig> {
        apply_overrides(config, env_lookup)
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<BackendConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("ORCH_ENDPOINT_URL").ok_or_else(|| {
            ConfigError::Missing {
                key: "ORCH_ENDPOINT_URL".to_string(),
                hint: None,
            }
            .with_hint("Set ORCH_ENDPOINT_URL or point ORCH_CONFIG at a configuration file")
        })?;
        apply_overrides(BackendConfig::new(endpoint), lookup)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn apply_overrides<F>(mut config: BackendConfig, lookup: F) -> Result<BackendConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("ORCH_ENDPOINT_URL") {
        config.endpoint_url = v;
    }
    if let Some(v) = lookup("ORCH_API_KEY") {
        config.api_key = Some(v);
    }
    if let Some(v) = lookup("ORCH_MODEL_NAME") {
        config.model_name = Some(v);
    }
    if let Some(v) = lookup("ORCH_PROTOCOL") {
        config.protocol_variant = Some(ProtocolVariant::parse(&v).ok_or_else(|| {
            ConfigError::InvalidValue {
                key: "ORCH_PROTOCOL".to_string(),
                value: v.clone(),
                hint: None,
            }
            .with_hint("Use chat_completions or text_generation")
        })?);
    }
    if let Some(v) = parsed(&lookup, "ORCH_TIMEOUT_MS")? {
        config.timeout_ms = v;
    }
    if let Some(v) = parsed(&lookup, "ORCH_MAX_RETRIES")? {
        config.max_retries = v;
    }
    if let Some(v) = parsed(&lookup, "ORCH_MAX_CONCURRENT")? {
        config.max_concurrent_requests = v;
    }
    if let Some(v) = parsed(&lookup, "ORCH_MAX_RPS")? {
        config.max_requests_per_second = v;
    }
    if let Some(v) = parsed(&lookup, "ORCH_CONTEXT_TOKENS")? {
        config.context.context_window_capacity = v;
    }
    if let Some(v) = parsed(&lookup, "ORCH_MAX_TOKENS")? {
        config.sampling.max_response_tokens = v;
    }
    Ok(config)
}

fn parsed<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
                hint: None,
            }
            .with_hint("Expected a number")
            .into()
        }),
    }
}
