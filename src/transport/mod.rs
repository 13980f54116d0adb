//! 传输层：向推理端点发送单次 HTTP POST。
//!
//! # Transport Layer
//!
//! One [`Transport::send`] call is exactly one network attempt. Retry, pacing
//! and classification live in the orchestrator; the transport only tells
//! network failures (no response at all) apart from received responses.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// A response that was actually received, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
    /// Parsed `Retry-After` (seconds form only).
    pub retry_after: Option<Duration>,
    /// Upstream correlation id, if the server sent one.
    pub upstream_request_id: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
            upstream_request_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection interrupted: {0}")]
    Interrupted(String),

    #[error("request could not be built: {0}")]
    Build(String),
}

impl TransportError {
    /// Whether no response was received, making the attempt safe to retry.
    pub fn is_network(&self) -> bool {
        !matches!(self, TransportError::Build(_))
    }

    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_builder() {
            TransportError::Build(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Interrupted(e.to_string())
        } else {
            TransportError::Connect(e.to_string())
        }
    }
}

/// Sends one generation request body to the configured endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        body: &Value,
        request_id: &str,
    ) -> std::result::Result<TransportResponse, TransportError>;
}
