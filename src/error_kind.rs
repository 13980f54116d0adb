//! 生成失败分类：固定的六类错误及其重试语义。
//!
//! Generation failure taxonomy.
//!
//! Every failed call to [`Orchestrator::generate`](crate::Orchestrator::generate)
//! is reported as exactly one [`ErrorKind`]. Callers map kinds to user-facing
//! messages; the mapping itself is a presentation concern.
//!
//! | Code  | Kind                  | Caller may retry later |
//! |-------|-----------------------|------------------------|
//! | E1001 | `InvalidRequest`      | no                     |
//! | E1005 | `TokenBudgetExceeded` | no                     |
//! | E2001 | `RateLimited`         | yes                    |
//! | E3001 | `UpstreamError`       | no                     |
//! | E3002 | `ModelUnavailable`    | yes                    |
//! | E3004 | `EmptyGeneration`     | yes                    |
//!
//! ```rust
//! use chat_orchestrator::ErrorKind;
//!
//! let kind = ErrorKind::from_http_status(429);
//! assert_eq!(kind, Some(ErrorKind::RateLimited));
//! assert_eq!(ErrorKind::RateLimited.code(), "E2001");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Preamble plus new turn alone exceed the context window.
    TokenBudgetExceeded,
    /// Backend reported throttling.
    RateLimited,
    /// Backend transiently unavailable, or network retries exhausted.
    ModelUnavailable,
    /// Backend rejected the payload (schema, auth or config mismatch).
    InvalidRequest,
    /// Any other non-2xx response or unexpected response shape.
    UpstreamError,
    /// 2xx response whose body could not be read as a generation.
    EmptyGeneration,
}

impl ErrorKind {
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "E1001",
            Self::TokenBudgetExceeded => "E1005",
            Self::RateLimited => "E2001",
            Self::UpstreamError => "E3001",
            Self::ModelUnavailable => "E3002",
            Self::EmptyGeneration => "E3004",
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TokenBudgetExceeded => "token_budget_exceeded",
            Self::RateLimited => "rate_limited",
            Self::ModelUnavailable => "model_unavailable",
            Self::InvalidRequest => "invalid_request",
            Self::UpstreamError => "upstream_error",
            Self::EmptyGeneration => "empty_generation",
        }
    }

    /// Whether re-issuing the whole call later can reasonably succeed.
    ///
    /// This is advice for the caller; the orchestrator itself only retries
    /// network-level failures.
    #[inline]
    pub fn caller_may_retry(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ModelUnavailable | Self::EmptyGeneration
        )
    }

    /// Classify a received non-2xx HTTP status. Returns `None` for 2xx.
    pub fn from_http_status(status: u16) -> Option<Self> {
        let kind = match status {
            200..=299 => return None,
            429 => Self::RateLimited,
            502..=504 => Self::ModelUnavailable,
            400 | 401 | 403 | 404 | 405 | 413 | 422 => Self::InvalidRequest,
            _ => Self::UpstreamError,
        };
        Some(kind)
    }

    pub fn all() -> &'static [ErrorKind] {
        &[
            Self::TokenBudgetExceeded,
            Self::RateLimited,
            Self::ModelUnavailable,
            Self::InvalidRequest,
            Self::UpstreamError,
            Self::EmptyGeneration,
        ]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_and_names_are_unique() {
        let codes: HashSet<_> = ErrorKind::all().iter().map(|k| k.code()).collect();
        let names: HashSet<_> = ErrorKind::all().iter().map(|k| k.name()).collect();
        assert_eq!(codes.len(), ErrorKind::all().len());
        assert_eq!(names.len(), ErrorKind::all().len());
    }

    #[test]
    fn status_classification() {
        assert_eq!(ErrorKind::from_http_status(200), None);
        assert_eq!(ErrorKind::from_http_status(204), None);
        assert_eq!(ErrorKind::from_http_status(429), Some(ErrorKind::RateLimited));
        assert_eq!(
            ErrorKind::from_http_status(503),
            Some(ErrorKind::ModelUnavailable)
        );
        assert_eq!(
            ErrorKind::from_http_status(502),
            Some(ErrorKind::ModelUnavailable)
        );
        for status in [400u16, 401, 403, 404, 422] {
            assert_eq!(
                ErrorKind::from_http_status(status),
                Some(ErrorKind::InvalidRequest),
                "status {}",
                status
            );
        }
        assert_eq!(
            ErrorKind::from_http_status(500),
            Some(ErrorKind::UpstreamError)
        );
        assert_eq!(
            ErrorKind::from_http_status(418),
            Some(ErrorKind::UpstreamError)
        );
        assert_eq!(
            ErrorKind::from_http_status(302),
            Some(ErrorKind::UpstreamError)
        );
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&ErrorKind::TokenBudgetExceeded).unwrap();
        assert_eq!(json, "\"token_budget_exceeded\"");
    }

    #[test]
    fn retry_advice() {
        assert!(ErrorKind::ModelUnavailable.caller_may_retry());
        assert!(ErrorKind::RateLimited.caller_may_retry());
        assert!(!ErrorKind::InvalidRequest.caller_may_retry());
        assert!(!ErrorKind::TokenBudgetExceeded.caller_may_retry());
    }
}
