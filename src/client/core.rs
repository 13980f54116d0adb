use crate::client::error_classification::classify_response;
use crate::client::signals::SignalsSnapshot;
use crate::client::types::CallStats;
use crate::context::ContextWindowManager;
use crate::error_kind::ErrorKind;
use crate::prompt::PromptAssembler;
use crate::protocol::{BackendConfig, ProtocolVariant};
use crate::resilience::{AdmissionGate, Clock, RetryPolicy};
use crate::response::{ResponseExtractor, Sanitizer};
use crate::tokens::TokenCounter;
use crate::transport::Transport;
use crate::types::{ConversationRequest, GenerationResult};
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Turns a conversation into one bounded, rate-gated request to the
/// inference endpoint.
///
/// Cheap to share behind an `Arc`; every call is independent apart from the
/// admission gate.
pub struct Orchestrator {
    pub(crate) config: Arc<BackendConfig>,
    pub(crate) variant: ProtocolVariant,
    pub(crate) counter: Arc<dyn TokenCounter>,
    pub(crate) window: ContextWindowManager,
    pub(crate) assembler: Arc<dyn PromptAssembler>,
    pub(crate) extractor: Arc<dyn ResponseExtractor>,
    pub(crate) sanitizer: Sanitizer,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) gate: Arc<AdmissionGate>,
    pub(crate) retry: RetryPolicy,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Orchestrator {
    /// Orchestrator with the HTTP transport and a fresh gate.
    pub fn new(config: BackendConfig) -> Result<Self> {
        crate::client::builder::OrchestratorBuilder::new(config).build()
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    pub fn token_counter(&self) -> &Arc<dyn TokenCounter> {
        &self.counter
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    /// Snapshot of the admission gate.
    pub async fn signals(&self) -> SignalsSnapshot {
        self.gate.snapshot().await.into()
    }

    /// Generate a reply. Never panics and never returns an error outside
    /// [`GenerationResult::Failure`].
    pub async fn generate(&self, request: &ConversationRequest) -> GenerationResult {
        self.generate_with_stats(request).await.0
    }

    pub async fn generate_with_stats(
        &self,
        request: &ConversationRequest,
    ) -> (GenerationResult, CallStats) {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let mut stats = CallStats::new(request_id.clone(), self.variant);

        let result = self.run(request, &request_id, &mut stats).await;

        stats.duration_ms = started.elapsed().as_millis();
        stats.error_kind = result.error_kind();
        match &result {
            GenerationResult::Success { text } => info!(
                request_id = request_id.as_str(),
                variant = %self.variant,
                attempts = stats.attempts,
                retry_count = stats.retry_count,
                http_status = stats.http_status.unwrap_or_default(),
                history_included = stats.history_included,
                history_total = stats.history_total,
                prompt_tokens = stats.prompt_tokens,
                reply_chars = text.chars().count(),
                duration_ms = stats.duration_ms as u64,
                "generation succeeded"
            ),
            GenerationResult::Failure { kind, message } => warn!(
                request_id = request_id.as_str(),
                variant = %self.variant,
                error_kind = kind.name(),
                error_code = kind.code(),
                attempts = stats.attempts,
                http_status = stats.http_status.unwrap_or_default(),
                duration_ms = stats.duration_ms as u64,
                message = message.as_str(),
                "generation failed"
            ),
        }
        (result, stats)
    }

    async fn run(
        &self,
        request: &ConversationRequest,
        request_id: &str,
        stats: &mut CallStats,
    ) -> GenerationResult {
        let preamble = request.effective_preamble();
        let selection = self
            .window
            .select(&preamble, request.history(), request.new_user_turn());
        stats.history_total = request.history().len();
        stats.history_included = selection.turns.len();

        let budget = self.window.budget();
        if budget.fixed_part_overflows(selection.system_tokens, selection.new_turn_tokens) {
            return GenerationResult::failure(
                ErrorKind::TokenBudgetExceeded,
                format!(
                    "preamble ({}) and new message ({}) exceed the context window of {} tokens",
                    selection.system_tokens,
                    selection.new_turn_tokens,
                    budget.context_window_capacity
                ),
            );
        }
        if selection.is_truncated() {
            debug!(
                request_id,
                dropped = selection.dropped,
                "oldest history dropped to fit the context window"
            );
        }

        let prompt = self
            .assembler
            .assemble(&preamble, &selection.turns, request.new_user_turn());
        stats.prompt_tokens = prompt.token_count;
        debug!(
            request_id,
            prompt_tokens = prompt.token_count,
            capacity = budget.context_window_capacity,
            "prompt assembled"
        );
        let body = prompt.to_request_body(&self.config.sampling, self.config.request_model());

        match self.execute_with_retry(&body, request_id, stats).await {
            Ok(resp) => {
                stats.http_status = Some(resp.status);
                stats.upstream_request_id = resp.upstream_request_id.clone();
                classify_response(&resp, self.extractor.as_ref(), &self.sanitizer)
            }
            Err(failure) => failure.into(),
        }
    }
}
