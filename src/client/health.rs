use crate::client::core::Orchestrator;
use crate::resilience::GateSnapshot;
use crate::types::{ConversationRequest, GenerationResult};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

const PROBE_PREAMBLE: &str = "You are a helpful assistant. Answer in one short sentence.";
const PROBE_MESSAGE: &str = "Hello";

/// Outcome of a live probe through the full pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Token counter in use (`cl100k_base`, `estimate`, ...).
    pub tokenizer: String,
    pub gate: GateSnapshot,
    pub api_responsive: bool,
    pub probe_text: Option<String>,
    pub error: Option<String>,
    pub checked_at_unix_ms: u64,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.api_responsive
    }
}

impl Orchestrator {
    /// Send a minimal conversation through gate, retry and classification.
    /// Never fails; problems are reported in the result.
    pub async fn health_check(&self) -> HealthReport {
        let probe = ConversationRequest::new(PROBE_PREAMBLE, PROBE_MESSAGE);
        let result = self.generate(&probe).await;
        let (api_responsive, probe_text, error) = match result {
            GenerationResult::Success { text } => (true, Some(text), None),
            GenerationResult::Failure { kind, message } => {
                (false, None, Some(format!("{} ({}): {}", kind.name(), kind.code(), message)))
            }
        };
        HealthReport {
            tokenizer: self.counter.name().to_string(),
            gate: self.gate.snapshot().await,
            api_responsive,
            probe_text,
            error,
            checked_at_unix_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default(),
        }
    }
}
