//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chat_orchestrator::resilience::ManualClock;
use chat_orchestrator::tokens::CharacterEstimator;
use chat_orchestrator::transport::{Transport, TransportError, TransportResponse};
use chat_orchestrator::{BackendConfig, Orchestrator, OrchestratorBuilder, ProtocolVariant};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CHAT_URL: &str = "http://inference.test/v1/chat/completions";
pub const TGI_URL: &str = "http://inference.test/generate";

type Outcome = Result<TransportResponse, TransportError>;

/// Transport that replays a fixed script of outcomes and records every body.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    bodies: Mutex<Vec<Value>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Outcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    /// Every call sleeps `delay` (real time) before answering.
    pub fn slow(script: Vec<Outcome>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Value {
        self.bodies().pop().expect("no request was sent")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, body: &Value, _request_id: &str) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().unwrap().push(body.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(TransportError::Connect("script exhausted".into())))
    }
}

pub fn ok(body: Value) -> Outcome {
    Ok(TransportResponse::new(200, body.to_string()))
}

pub fn status(code: u16, body: &str) -> Outcome {
    Ok(TransportResponse::new(code, body))
}

pub fn connect_error() -> Outcome {
    Err(TransportError::Connect("connection refused".into()))
}

pub fn chat_reply(text: &str) -> Value {
    json!({ "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }] })
}

pub fn tgi_reply(text: &str) -> Value {
    json!([{ "generated_text": text }])
}

/// Config with pacing disabled so the manual clock only records backoff.
pub fn config(url: &str) -> BackendConfig {
    let mut config = BackendConfig::new(url);
    config.max_requests_per_second = 0.0;
    config
}

pub fn chat_config() -> BackendConfig {
    config(CHAT_URL)
}

pub fn tgi_config() -> BackendConfig {
    config(TGI_URL).with_protocol_variant(ProtocolVariant::TextGeneration)
}

pub fn orchestrator(
    config: BackendConfig,
    transport: Arc<ScriptedTransport>,
    clock: Arc<ManualClock>,
) -> Orchestrator {
    OrchestratorBuilder::new(config)
        .with_transport(transport)
        .with_clock(clock)
        .with_token_counter(Arc::new(CharacterEstimator::new()))
        .build()
        .expect("valid test configuration")
}
