use crate::error_kind::ErrorKind;
use crate::protocol::ProtocolVariant;
use serde::Serialize;
use std::fmt;

/// Per-call lifecycle, logged at debug level on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Pending,
    Gated,
    InFlight,
    Retrying,
    Succeeded,
    Failed,
}

impl CallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Pending => "pending",
            CallState::Gated => "gated",
            CallState::InFlight => "in_flight",
            CallState::Retrying => "retrying",
            CallState::Succeeded => "succeeded",
            CallState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Succeeded | CallState::Failed)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call facts for logging and application-level dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallStats {
    pub request_id: String,
    pub variant: ProtocolVariant,
    /// Network attempts made; 0 when the call failed before dispatch.
    pub attempts: u32,
    pub retry_count: u32,
    /// Status of the last received response, if any.
    pub http_status: Option<u16>,
    pub upstream_request_id: Option<String>,
    pub duration_ms: u128,
    pub history_total: usize,
    pub history_included: usize,
    pub prompt_tokens: usize,
    pub error_kind: Option<ErrorKind>,
}

impl CallStats {
    pub(crate) fn new(request_id: String, variant: ProtocolVariant) -> Self {
        Self {
            request_id,
            variant,
            attempts: 0,
            retry_count: 0,
            http_status: None,
            upstream_request_id: None,
            duration_ms: 0,
            history_total: 0,
            history_included: 0,
            prompt_tokens: 0,
            error_kind: None,
        }
    }
}
