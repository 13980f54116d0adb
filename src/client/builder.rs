use crate::client::core::Orchestrator;
use crate::context::ContextWindowManager;
use crate::prompt::assembler_for;
use crate::protocol::BackendConfig;
use crate::resilience::{AdmissionGate, Clock, RetryPolicy, TokioClock};
use crate::response::{extractor_for, Sanitizer};
use crate::tokens::{select_counter, CachingCounter, TokenCounter};
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Entries kept by the default token-count cache.
const TOKEN_CACHE_SIZE: usize = 4096;

/// Builder for [`Orchestrator`].
///
/// Every collaborator defaults to its production implementation; tests swap
/// in a scripted transport, a manual clock or a shared gate.
pub struct OrchestratorBuilder {
    config: BackendConfig,
    transport: Option<Arc<dyn Transport>>,
    gate: Option<Arc<AdmissionGate>>,
    clock: Option<Arc<dyn Clock>>,
    counter: Option<Arc<dyn TokenCounter>>,
    retry: Option<RetryPolicy>,
}

impl OrchestratorBuilder {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            transport: None,
            gate: None,
            clock: None,
            counter: None,
            retry: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Share one gate across orchestrators; there should be one per process.
    pub fn with_gate(mut self, gate: Arc<AdmissionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Clock for backoff sleeps and, unless a gate is supplied, pacing.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Overrides the policy derived from `max_retries` and `backoff`.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let config = self.config;
        config.validate()?;

        let variant = config.variant();
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(TokioClock));
        let counter: Arc<dyn TokenCounter> = match self.counter {
            Some(c) => c,
            None => Arc::new(CachingCounter::new(
                select_counter(config.tokenizer),
                TOKEN_CACHE_SIZE,
            )),
        };
        let gate = self
            .gate
            .unwrap_or_else(|| Arc::new(AdmissionGate::from_config(&config, clock.clone())));
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        let retry = self
            .retry
            .unwrap_or_else(|| RetryPolicy::from_config(config.max_retries, &config.backoff));

        info!(
            variant = %variant,
            url = %config.request_url(),
            tokenizer = counter.name(),
            max_concurrent = config.max_concurrent_requests,
            max_rps = config.max_requests_per_second,
            max_retries = retry.max_retries,
            "orchestrator ready"
        );

        Ok(Orchestrator {
            variant,
            window: ContextWindowManager::new(config.token_budget(), counter.clone()),
            assembler: assembler_for(variant, config.template.clone(), counter.clone()),
            extractor: extractor_for(variant),
            sanitizer: Sanitizer::new(&config.template, &config.response),
            counter,
            transport,
            gate,
            retry,
            clock,
            config: Arc::new(config),
        })
    }
}
