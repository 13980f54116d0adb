//! Loading backend configuration from files on disk.

use chat_orchestrator::protocol::ConfigError;
use chat_orchestrator::{ConfigLoader, Error, ProtocolVariant};
use std::path::PathBuf;
use tokio_test::{assert_err, assert_ok};

struct TempFile(PathBuf);

impl TempFile {
    async fn new(ext: &str, content: &str) -> Self {
        let path = std::env::temp_dir().join(format!("orch-{}.{}", uuid::Uuid::new_v4(), ext));
        tokio::fs::write(&path, content).await.unwrap();
        Self(path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[tokio::test]
async fn yaml_file_with_nested_sections() {
    let file = TempFile::new(
        "yaml",
        r#"
endpoint_url: https://tgi.internal:8443
protocol_variant: text_generation
timeout_ms: 15000
max_retries: 2
max_concurrent_requests: 3
max_requests_per_second: 2.5
sampling:
  max_response_tokens: 256
  temperature: 0.9
backoff:
  base_ms: 500
  jitter: true
context:
  context_window_capacity: 4096
response:
  max_output_chars: 1000
"#,
    )
    .await;

    let config = assert_ok!(
        ConfigLoader::new()
            .without_env_overrides()
            .load(Some(file.0.as_path()))
            .await
    );
    assert_eq!(config.variant(), ProtocolVariant::TextGeneration);
    assert_eq!(config.timeout_ms, 15000);
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.sampling.max_response_tokens, 256);
    assert_eq!(config.sampling.top_k, 80);
    assert_eq!(config.backoff.base_ms, 500);
    assert_eq!(config.backoff.max_ms, 10000);
    assert!(config.backoff.jitter);
    assert_eq!(config.context.context_window_capacity, 4096);
    assert_eq!(config.context.reserved_safety_margin, 100);
    assert_eq!(config.response.max_output_chars, 1000);
    assert_eq!(config.response.truncation_marker, "...");
    assert_eq!(config.token_budget().reserved(), 356);
}

#[tokio::test]
async fn json_file_detects_chat_endpoint() {
    let file = TempFile::new(
        "json",
        r#"{"endpoint_url": "https://llm.example.com/v1/chat/completions", "model_name": "qwen2-7b"}"#,
    )
    .await;

    let config = assert_ok!(
        ConfigLoader::new()
            .without_env_overrides()
            .load_from_file(&file.0)
            .await
    );
    assert_eq!(config.variant(), ProtocolVariant::ChatCompletions);
    assert_eq!(config.request_url(), "https://llm.example.com/v1/chat/completions");
    assert_eq!(config.request_model(), "qwen2-7b");
}

#[tokio::test]
async fn invalid_values_fail_validation() {
    let file = TempFile::new(
        "yaml",
        "endpoint_url: https://host\nmax_concurrent_requests: 0\n",
    )
    .await;

    let err = assert_err!(
        ConfigLoader::new()
            .without_env_overrides()
            .load(Some(file.0.as_path()))
            .await
    );
    assert!(err.to_string().contains("max_concurrent_requests"), "{}", err);
    assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
}

#[tokio::test]
async fn malformed_yaml_is_a_parse_error() {
    let file = TempFile::new("yml", "endpoint_url: [unterminated\n").await;
    let err = assert_err!(
        ConfigLoader::new()
            .without_env_overrides()
            .load(Some(file.0.as_path()))
            .await
    );
    assert!(err.to_string().to_lowercase().contains("yaml"), "{}", err);
}

#[tokio::test]
async fn vanishing_request_rate_is_rejected_before_build() {
    let file = TempFile::new(
        "yaml",
        "endpoint_url: https://host\nmax_requests_per_second: 1.0e-30\n",
    )
    .await;
    let err = assert_err!(
        ConfigLoader::new()
            .without_env_overrides()
            .load(Some(file.0.as_path()))
            .await
    );
    assert!(err.to_string().contains("max_requests_per_second"), "{}", err);

    let mut config = chat_orchestrator::BackendConfig::new("https://host");
    config.max_requests_per_second = 1e-30;
    assert!(chat_orchestrator::Orchestrator::new(config).is_err());
}
